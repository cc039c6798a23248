/*
 * Device Control Flags
 *
 * Every descriptor carries one flag word made of two groups:
 *
 * - Configuration bits (`ConfigFlags`): direction, blocking, XON/XOFF,
 *   echo and CR/LF policy. Set by the application through `configure`,
 *   read (never written) by interrupt handlers.
 * - Runtime bits (`StateFlags`): EOL/EOF latches, in-line latch, transmit
 *   mutex and the flow-control latches. Written by the buffer feed/drain
 *   code in both contexts, always with single atomic read-modify-writes.
 *
 * Callers outside this module query flags through the predicates on
 * `DeviceFlags`, never by mask.
 *
 * The control word handed to `configure` (`Control`) is a third, separate
 * layout: enable/disable request pairs plus a baud-rate field.
 */

use core::marker::PhantomData;
use core::sync::atomic::{AtomicU32, Ordering};

use bitflags::{Flags, bitflags};

bitflags! {
    /// Control word accepted by `configure`.
    ///
    /// Unknown bits are ignored. For each enable/disable pair the disable
    /// request is evaluated last, so a word carrying both disables.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Control: u32 {
        /// Baud-rate enum, forwarded to the serial hardware when non-zero
        const BAUD = 0x0000_000F;
        const RD = 1 << 4;
        const WR = 1 << 5;
        const RDWR = Self::RD.bits() | Self::WR.bits();
        const BLOCK = 1 << 6;
        const NOBLOCK = 1 << 7;
        const XOFF = 1 << 8;
        const NOXOFF = 1 << 9;
        const ECHO = 1 << 10;
        const NOECHO = 1 << 11;
        const CRLF = 1 << 12;
        const NOCRLF = 1 << 13;
        const IGNORECR = 1 << 14;
        const NOIGNORECR = 1 << 15;
        const IGNORELF = 1 << 16;
        const NOIGNORELF = 1 << 17;
        const LINEMODE = 1 << 18;
        const NOLINEMODE = 1 << 19;
    }
}

impl Control {
    /// Decode a raw control word, dropping bits with no meaning.
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_truncate(raw)
    }

    /// The baud-rate field (0 means "leave unchanged").
    pub const fn baud(self) -> u8 {
        (self.bits() & Self::BAUD.bits()) as u8
    }
}

bitflags! {
    /// Static configuration of a device (bits 0..=8 of the flag word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConfigFlags: u32 {
        const RD = 1 << 0;
        const WR = 1 << 1;
        const BLOCK = 1 << 2;
        const XOFF = 1 << 3;
        const ECHO = 1 << 4;
        const CRLF = 1 << 5;
        const IGNORECR = 1 << 6;
        const IGNORELF = 1 << 7;
        const LINEMODE = 1 << 8;
    }
}

bitflags! {
    /// Transient runtime state of a device (bits 9..=15 of the flag word).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct StateFlags: u32 {
        /// A transmit-buffer drain is dispatched to the hardware
        const TX_MUTEX = 1 << 9;
        const EOL = 1 << 10;
        const EOF = 1 << 11;
        /// A partial line sits in the line buffer
        const IN_LINE = 1 << 12;
        /// XOFF is owed to the remote sender
        const DO_XOFF = 1 << 13;
        /// XON is owed to the remote sender
        const DO_XON = 1 << 14;
        /// XOFF was sent and not yet revoked
        const IN_XOFF = 1 << 15;
    }
}

/// Enable/disable request pairs, in evaluation order.
const REQUEST_PAIRS: [(Control, Control, ConfigFlags); 7] = [
    (Control::BLOCK, Control::NOBLOCK, ConfigFlags::BLOCK),
    (Control::XOFF, Control::NOXOFF, ConfigFlags::XOFF),
    (Control::ECHO, Control::NOECHO, ConfigFlags::ECHO),
    (Control::CRLF, Control::NOCRLF, ConfigFlags::CRLF),
    (Control::IGNORECR, Control::NOIGNORECR, ConfigFlags::IGNORECR),
    (Control::IGNORELF, Control::NOIGNORELF, ConfigFlags::IGNORELF),
    (Control::LINEMODE, Control::NOLINEMODE, ConfigFlags::LINEMODE),
];

impl ConfigFlags {
    /// Apply the requests in `control` on top of `self`.
    ///
    /// Direction bits only ever enable. A pair with neither request set
    /// keeps its previous value.
    pub fn apply(self, control: Control) -> Self {
        let mut flags = self;
        if control.contains(Control::RD) {
            flags.insert(ConfigFlags::RD);
        }
        if control.contains(Control::WR) {
            flags.insert(ConfigFlags::WR);
        }
        for (enable, disable, flag) in REQUEST_PAIRS {
            if control.contains(enable) {
                flags.insert(flag);
            }
            if control.contains(disable) {
                flags.remove(flag);
            }
        }
        flags
    }
}

/// A flag set stored in an `AtomicU32`.
///
/// Every mutation is one atomic read-modify-write, so an ISR and the
/// application can both update different bits without losing either.
pub(crate) struct AtomicFlags<F> {
    bits: AtomicU32,
    _flags: PhantomData<F>,
}

impl<F: Flags<Bits = u32>> AtomicFlags<F> {
    pub(crate) const fn empty() -> Self {
        Self {
            bits: AtomicU32::new(0),
            _flags: PhantomData,
        }
    }

    pub(crate) fn load(&self) -> F {
        F::from_bits_retain(self.bits.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, flags: F) {
        self.bits.store(flags.bits(), Ordering::Release);
    }

    pub(crate) fn insert(&self, flags: F) {
        self.bits.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub(crate) fn remove(&self, flags: F) {
        self.bits.fetch_and(!flags.bits(), Ordering::AcqRel);
    }

    /// Set `flags` and report whether all of them were already set.
    pub(crate) fn test_and_insert(&self, flags: F) -> bool {
        let previous = self.bits.fetch_or(flags.bits(), Ordering::AcqRel);
        previous & flags.bits() == flags.bits()
    }

    pub(crate) fn contains(&self, flags: F) -> bool {
        self.bits.load(Ordering::Acquire) & flags.bits() == flags.bits()
    }
}

/// The flag word of one device.
pub struct DeviceFlags {
    config: AtomicFlags<ConfigFlags>,
    state: AtomicFlags<StateFlags>,
}

impl DeviceFlags {
    pub const fn new() -> Self {
        Self {
            config: AtomicFlags::empty(),
            state: AtomicFlags::empty(),
        }
    }

    /// Current configuration bits.
    pub fn config(&self) -> ConfigFlags {
        self.config.load()
    }

    /// Current runtime bits.
    pub fn state(&self) -> StateFlags {
        self.state.load()
    }

    /// The combined 32-bit flag word, for diagnostics.
    pub fn word(&self) -> u32 {
        self.config().bits() | self.state().bits()
    }

    /// Apply `control` and reset every runtime bit.
    pub(crate) fn configure(&self, control: Control) -> ConfigFlags {
        let config = self.reconfigure(control);
        self.state.store(StateFlags::empty());
        config
    }

    /// Apply `control`, keeping the runtime bits.
    pub(crate) fn reconfigure(&self, control: Control) -> ConfigFlags {
        let config = self.config().apply(control);
        self.config.store(config);
        config
    }

    pub(crate) fn set_state(&self, flags: StateFlags) {
        self.state.insert(flags);
    }

    pub(crate) fn clear_state(&self, flags: StateFlags) {
        self.state.remove(flags);
    }

    /// Set `flags`, returning true if they were all set already.
    pub(crate) fn test_and_set_state(&self, flags: StateFlags) -> bool {
        self.state.test_and_insert(flags)
    }

    pub fn is_readable(&self) -> bool {
        self.config.contains(ConfigFlags::RD)
    }

    pub fn is_writable(&self) -> bool {
        self.config.contains(ConfigFlags::WR)
    }

    pub fn is_blocking(&self) -> bool {
        self.config.contains(ConfigFlags::BLOCK)
    }

    pub fn flow_control_enabled(&self) -> bool {
        self.config.contains(ConfigFlags::XOFF)
    }

    pub fn echo(&self) -> bool {
        self.config.contains(ConfigFlags::ECHO)
    }

    pub fn crlf(&self) -> bool {
        self.config.contains(ConfigFlags::CRLF)
    }

    pub fn ignore_cr(&self) -> bool {
        self.config.contains(ConfigFlags::IGNORECR)
    }

    pub fn ignore_lf(&self) -> bool {
        self.config.contains(ConfigFlags::IGNORELF)
    }

    pub fn line_mode(&self) -> bool {
        self.config.contains(ConfigFlags::LINEMODE)
    }

    pub fn tx_busy(&self) -> bool {
        self.state.contains(StateFlags::TX_MUTEX)
    }

    pub fn at_eol(&self) -> bool {
        self.state.contains(StateFlags::EOL)
    }

    pub fn at_eof(&self) -> bool {
        self.state.contains(StateFlags::EOF)
    }

    pub fn in_line(&self) -> bool {
        self.state.contains(StateFlags::IN_LINE)
    }

    pub fn xoff_pending(&self) -> bool {
        self.state.contains(StateFlags::DO_XOFF)
    }

    pub fn xon_pending(&self) -> bool {
        self.state.contains(StateFlags::DO_XON)
    }

    pub fn in_xoff(&self) -> bool {
        self.state.contains(StateFlags::IN_XOFF)
    }
}

impl Default for DeviceFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side view of a device's flags.
///
/// Reads configuration and updates runtime bits; it has no way to
/// reconfigure, so ISR bodies only ever receive this view.
#[derive(Clone, Copy)]
pub struct RuntimeFlags<'a> {
    flags: &'a DeviceFlags,
}

impl DeviceFlags {
    pub fn runtime(&self) -> RuntimeFlags<'_> {
        RuntimeFlags { flags: self }
    }
}

impl RuntimeFlags<'_> {
    pub fn config(&self) -> ConfigFlags {
        self.flags.config()
    }

    pub fn state(&self) -> StateFlags {
        self.flags.state()
    }

    pub(crate) fn set_state(&self, flags: StateFlags) {
        self.flags.set_state(flags);
    }

    pub(crate) fn clear_state(&self, flags: StateFlags) {
        self.flags.clear_state(flags);
    }

    pub(crate) fn test_and_set_state(&self, flags: StateFlags) -> bool {
        self.flags.test_and_set_state(flags)
    }

    pub fn flow_control_enabled(&self) -> bool {
        self.flags.flow_control_enabled()
    }

    pub fn xoff_pending(&self) -> bool {
        self.flags.xoff_pending()
    }

    pub fn xon_pending(&self) -> bool {
        self.flags.xon_pending()
    }

    pub fn in_xoff(&self) -> bool {
        self.flags.in_xoff()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflicting_requests_resolve_the_same_regardless_of_construction_order() {
        let a = Control::BLOCK | Control::NOBLOCK;
        let b = Control::NOBLOCK | Control::BLOCK;
        let c = Control::from_raw((1 << 7) | (1 << 6));

        for control in [a, b, c] {
            let flags = DeviceFlags::new();
            flags.configure(Control::BLOCK);
            assert!(flags.is_blocking());
            flags.configure(control);
            assert!(!flags.is_blocking());
        }
    }

    #[test]
    fn requesting_neither_side_of_a_pair_keeps_previous_value() {
        let flags = DeviceFlags::new();
        flags.configure(Control::RD | Control::ECHO | Control::XOFF);
        flags.configure(Control::NOXOFF);
        assert!(flags.echo());
        assert!(!flags.flow_control_enabled());
        assert!(flags.is_readable());
    }

    #[test]
    fn configure_clears_runtime_bits_reconfigure_keeps_them() {
        let flags = DeviceFlags::new();
        flags.configure(Control::RDWR);
        flags.set_state(StateFlags::IN_LINE | StateFlags::IN_XOFF);

        flags.reconfigure(Control::ECHO);
        assert!(flags.in_line());
        assert!(flags.in_xoff());
        assert!(flags.echo());

        flags.configure(Control::NOECHO);
        assert_eq!(flags.state(), StateFlags::empty());
        assert!(flags.is_writable());
    }

    #[test]
    fn unknown_control_bits_are_ignored() {
        let control = Control::from_raw(0xFFF0_0000 | Control::CRLF.bits());
        assert_eq!(control, Control::CRLF);

        let flags = DeviceFlags::new();
        flags.configure(control);
        assert_eq!(flags.config(), ConfigFlags::CRLF);
    }

    #[test]
    fn baud_field_is_low_nibble() {
        let control = Control::from_raw(0x5) | Control::RD;
        assert_eq!(control.baud(), 5);
        assert_eq!(Control::RDWR.baud(), 0);
    }

    #[test]
    fn word_packs_config_below_state() {
        let flags = DeviceFlags::new();
        flags.configure(Control::RD);
        flags.set_state(StateFlags::EOF);
        assert_eq!(flags.word(), (1 << 0) | (1 << 11));
    }

    #[test]
    fn test_and_set_reports_previous_value() {
        let flags = DeviceFlags::new();
        assert!(!flags.test_and_set_state(StateFlags::TX_MUTEX));
        assert!(flags.test_and_set_state(StateFlags::TX_MUTEX));
        flags.clear_state(StateFlags::TX_MUTEX);
        assert!(!flags.tx_busy());
    }

    #[test]
    fn runtime_view_touches_state_only() {
        let flags = DeviceFlags::new();
        flags.configure(Control::RDWR | Control::XOFF);
        let runtime = flags.runtime();

        runtime.set_state(StateFlags::DO_XOFF | StateFlags::TX_MUTEX);
        assert!(runtime.xoff_pending());
        assert!(runtime.test_and_set_state(StateFlags::TX_MUTEX));
        runtime.clear_state(StateFlags::TX_MUTEX);

        assert_eq!(flags.state(), StateFlags::DO_XOFF);
        assert_eq!(runtime.config(), ConfigFlags::RD | ConfigFlags::WR | ConfigFlags::XOFF);
        assert!(runtime.flow_control_enabled());
    }
}
