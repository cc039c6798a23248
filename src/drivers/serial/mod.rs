/*
 * Serial Communication Drivers
 *
 * Interrupt-fed USART ports. Register programming lives outside XIO; the
 * hardware is reached only through the `SerialHardware` trait.
 */

pub mod usart;

pub use usart::{NULL_SERIAL, NullSerial, SerialHardware, UsartPort};

#[cfg(test)]
pub(crate) mod testing {
    use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

    use super::SerialHardware;

    /// Records how the port drives its hardware.
    pub(crate) struct MockSerial {
        kicks: AtomicUsize,
        baud: AtomicU8,
    }

    impl MockSerial {
        pub(crate) const fn new() -> Self {
            Self {
                kicks: AtomicUsize::new(0),
                baud: AtomicU8::new(0),
            }
        }

        /// Times the transmit interrupt was armed.
        pub(crate) fn kicks(&self) -> usize {
            self.kicks.load(Ordering::SeqCst)
        }

        pub(crate) fn baud(&self) -> u8 {
            self.baud.load(Ordering::SeqCst)
        }
    }

    impl SerialHardware for MockSerial {
        fn start_tx(&self) {
            self.kicks.fetch_add(1, Ordering::SeqCst);
        }

        fn set_baud(&self, code: u8) {
            self.baud.store(code, Ordering::SeqCst);
        }
    }
}
