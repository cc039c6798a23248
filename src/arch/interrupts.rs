/*
 * Interrupt Management Module
 *
 * Critical-section primitives used by the application-context half of
 * every buffered device. The ISR half runs with interrupts already masked
 * and does not use these.
 *
 * On bare-metal x86_64 the x86_64 crate provides the actual cli/sti
 * instructions. Hosted builds (unit tests on a development machine) have
 * no interrupt source, so masking degenerates to a pass-through.
 */

#[cfg(all(target_arch = "x86_64", target_os = "none"))]
mod imp {
    use x86_64::instructions::interrupts;

    pub fn enable() {
        interrupts::enable();
    }

    pub fn disable() {
        interrupts::disable();
    }

    pub fn are_enabled() -> bool {
        interrupts::are_enabled()
    }
}

#[cfg(not(all(target_arch = "x86_64", target_os = "none")))]
mod imp {
    pub fn enable() {}

    pub fn disable() {}

    pub fn are_enabled() -> bool {
        false
    }
}

/// Enable interrupts globally
pub fn enable() {
    imp::enable();
}

/// Disable interrupts globally
pub fn disable() {
    imp::disable();
}

/// Check if interrupts are enabled
pub fn are_enabled() -> bool {
    imp::are_enabled()
}

/// Execute a closure with interrupts disabled
///
/// Every application-context access to ISR-shared state goes through
/// here, so the multi-step buffer and flag updates are observed atomically
/// by the interrupt handlers.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = DisableInterrupts::new();
    f()
}

/// RAII guard that disables interrupts for its lifetime
///
/// Interrupts are restored on drop only if they were enabled when the
/// guard was created, so guards nest correctly.
pub struct DisableInterrupts {
    were_enabled: bool,
}

impl DisableInterrupts {
    /// Create a new interrupt guard, disabling interrupts
    pub fn new() -> Self {
        let were_enabled = are_enabled();
        if were_enabled {
            disable();
        }
        Self { were_enabled }
    }
}

impl Default for DisableInterrupts {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DisableInterrupts {
    fn drop(&mut self) {
        if self.were_enabled {
            enable();
        }
    }
}
