/*
 * USART Device
 *
 * Interrupt-driven serial port built from two circular buffers.
 *
 * Receive: the RX ISR hands each byte to `rx_isr`, which first checks the
 * signal map (trapped bytes only set the signal latch), then stores the
 * byte and lets flow control decide whether an XOFF is owed.
 *
 * Transmit: `putc` queues bytes and arms the transmit interrupt unless a
 * drain is already dispatched (TX_MUTEX). The TX ISR calls `tx_isr` for
 * each byte it can send; pending XOFF/XON go out ahead of queued data, and
 * `None` tells the ISR to disarm and releases TX_MUTEX.
 *
 * Fields touched by both contexts:
 * - `rx` indices/storage: written by the RX ISR, drained by the application
 * - `tx` indices/storage: filled by the application, drained by the TX ISR
 * - runtime flags and the signal latch (atomics in the descriptor)
 * Application-side accesses to `rx`/`tx` run with interrupts disabled.
 */

use log::{debug, warn};
use spin::Mutex;

use crate::arch::interrupts::without_interrupts;
use crate::config::{RX_BUFFER_SIZE, TX_BUFFER_SIZE, XOFF_HIGH_WATER};
use crate::io::ascii::{CR, LF};
use crate::io::buffer::CircularBuffer;
use crate::io::device::{DeviceOps, OpenTarget, XioError};
use crate::io::flags::{Control, DeviceFlags, RuntimeFlags, StateFlags};
use crate::io::flow;
use crate::io::signals::{self, SignalLatch};

/// Hooks into the serial peripheral.
pub trait SerialHardware: Sync {
    /// Arm the transmit-ready interrupt so the TX ISR starts calling `tx_isr`.
    fn start_tx(&self);

    /// Program the baud rate from the control word's baud field.
    fn set_baud(&self, _code: u8) {}
}

/// Hardware binding for ports with nothing attached.
pub struct NullSerial;

impl SerialHardware for NullSerial {
    fn start_tx(&self) {}
}

pub static NULL_SERIAL: NullSerial = NullSerial;

/// One USART device.
pub struct UsartPort {
    hw: &'static dyn SerialHardware,
    rx: Mutex<CircularBuffer<RX_BUFFER_SIZE>>,
    tx: Mutex<CircularBuffer<TX_BUFFER_SIZE>>,
}

impl UsartPort {
    pub const fn new(hw: &'static dyn SerialHardware) -> Self {
        Self {
            hw,
            rx: Mutex::new(CircularBuffer::new()),
            tx: Mutex::new(CircularBuffer::new()),
        }
    }

    /// Bytes waiting in the receive buffer.
    pub fn rx_pending(&self) -> usize {
        without_interrupts(|| self.rx.lock().len())
    }

    /// Bytes waiting in the transmit buffer.
    pub fn tx_pending(&self) -> usize {
        without_interrupts(|| self.tx.lock().len())
    }

    /// RX ISR body: trap signals, store data, evaluate flow control.
    pub fn rx_isr(&self, flags: RuntimeFlags<'_>, signal: &SignalLatch, byte: u8) {
        if let Some(sig) = signals::intercept(byte) {
            signal.raise(sig);
            debug!("xio: signal {} latched", sig);
            return;
        }

        let (overrun, occupancy) = {
            let mut rx = self.rx.lock();
            let overrun = rx.push_front(byte).is_err();
            (overrun, rx.len())
        };

        if overrun {
            warn!("xio: receive overrun, dropped {:#04x}", byte);
        }
        if flow::on_receive(flags, occupancy, XOFF_HIGH_WATER, overrun) {
            self.kick(flags);
        }
    }

    /// TX ISR body: the next byte for the data register, or `None` when idle.
    pub fn tx_isr(&self, flags: RuntimeFlags<'_>) -> Option<u8> {
        if let Some(control) = flow::next_control_byte(flags) {
            return Some(control);
        }
        match self.tx.lock().pop_back() {
            Ok(byte) => Some(byte),
            Err(_) => {
                flags.clear_state(StateFlags::TX_MUTEX);
                None
            }
        }
    }

    /// Arm the transmitter unless a drain is already dispatched.
    fn kick(&self, flags: RuntimeFlags<'_>) {
        if !flags.test_and_set_state(StateFlags::TX_MUTEX) {
            self.hw.start_tx();
        }
    }

    /// Queue one byte; a full buffer blocks only if `blocking`.
    fn enqueue(&self, flags: &DeviceFlags, byte: u8, blocking: bool) -> Result<(), XioError> {
        loop {
            let queued = without_interrupts(|| {
                let queued = self.tx.lock().push_front(byte);
                if queued.is_ok() {
                    self.kick(flags.runtime());
                }
                queued
            });
            match queued {
                Ok(()) => return Ok(()),
                Err(err) if !blocking => return Err(err),
                Err(_) => {
                    without_interrupts(|| self.kick(flags.runtime()));
                    core::hint::spin_loop();
                }
            }
        }
    }

    fn write(&self, flags: &DeviceFlags, byte: u8, blocking: bool) -> Result<(), XioError> {
        if !flags.is_writable() {
            return Err(XioError::Err);
        }
        if byte == LF && flags.crlf() {
            self.enqueue(flags, CR, blocking)?;
        }
        self.enqueue(flags, byte, blocking)
    }
}

impl DeviceOps for UsartPort {
    fn open(&self, _flags: &DeviceFlags, _target: OpenTarget) -> Result<(), XioError> {
        Ok(())
    }

    fn control(&self, _flags: &DeviceFlags, control: Control) -> Result<(), XioError> {
        let baud = control.baud();
        if baud != 0 {
            self.hw.set_baud(baud);
        }
        Ok(())
    }

    fn putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError> {
        self.write(flags, byte, flags.is_blocking())
    }

    fn try_putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError> {
        self.write(flags, byte, false)
    }

    fn getc(&self, flags: &DeviceFlags, signal: &SignalLatch) -> Result<u8, XioError> {
        if !flags.is_readable() {
            return Err(XioError::Err);
        }
        loop {
            match without_interrupts(|| self.rx.lock().pop_back()) {
                Ok(byte) => {
                    if flow::on_read(flags.runtime()) {
                        without_interrupts(|| self.kick(flags.runtime()));
                    }
                    if (byte == CR && flags.ignore_cr()) || (byte == LF && flags.ignore_lf()) {
                        continue;
                    }
                    if flags.echo() {
                        // echo is best effort; a full transmit buffer drops it
                        let _ = self.try_putc(flags, byte);
                    }
                    return Ok(byte);
                }
                Err(_) if !flags.is_blocking() => return Err(XioError::Again),
                Err(_) => {
                    // cooperative cancellation: leave the latch for the application
                    if signal.cancel_pending() {
                        return Err(XioError::Again);
                    }
                    core::hint::spin_loop();
                }
            }
        }
    }
}
