/*
 * Signal Interception
 *
 * Serial receive ISRs trap a handful of control characters before they
 * reach the receive buffer and turn them into an asynchronous signal
 * instead. The byte itself is discarded.
 *
 * Each device has a single-slot latch. A new signal overwrites whatever
 * is there, consumed or not: delivery is "most recent wins", not queued.
 * The application polls the latch and clears it when it has acted.
 *
 * Because trapping happens in the ISR, a device keeps delivering signals
 * whether or not anyone is reading it. A console can therefore kill or
 * pause a job whose lines are being read from a memory file.
 */

use core::fmt;
use core::sync::atomic::{AtomicU8, Ordering};

use super::ascii::{BEL, BS, CAN, DEL, ESC, ETX, XOFF, XON};

/// Asynchronous signal values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Signal {
    /// No signal pending
    Ok = 0,
    Again = 1,
    Eol = 2,
    Eof = 3,
    /// Cancel the operation immediately
    Kill = 4,
    /// Cancel the operation nicely
    Term = 5,
    Pause = 6,
    Resume = 7,
    Escape = 8,
    Delete = 9,
    Bell = 10,
}

impl Signal {
    /// Decode a latch value; anything unknown reads as `Ok`.
    pub const fn from_u8(value: u8) -> Self {
        match value {
            1 => Signal::Again,
            2 => Signal::Eol,
            3 => Signal::Eof,
            4 => Signal::Kill,
            5 => Signal::Term,
            6 => Signal::Pause,
            7 => Signal::Resume,
            8 => Signal::Escape,
            9 => Signal::Delete,
            10 => Signal::Bell,
            _ => Signal::Ok,
        }
    }

    /// Signals a blocked reader must give up for.
    pub const fn is_cancel(self) -> bool {
        matches!(self, Signal::Kill | Signal::Term)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Signal::Ok => "ok",
            Signal::Again => "again",
            Signal::Eol => "end-of-line",
            Signal::Eof => "end-of-file",
            Signal::Kill => "kill",
            Signal::Term => "terminate",
            Signal::Pause => "pause",
            Signal::Resume => "resume",
            Signal::Escape => "escape",
            Signal::Delete => "delete",
            Signal::Bell => "bell",
        };
        f.write_str(name)
    }
}

/// Control bytes trapped by the receive ISR.
pub const SIGNAL_MAP: [(u8, Signal); 8] = [
    (ETX, Signal::Kill),
    (CAN, Signal::Term),
    (XOFF, Signal::Pause),
    (XON, Signal::Resume),
    (ESC, Signal::Escape),
    (BS, Signal::Delete),
    (DEL, Signal::Delete),
    (BEL, Signal::Bell),
];

/// The signal `byte` stands for, if it is a trapped control byte.
#[inline]
pub fn intercept(byte: u8) -> Option<Signal> {
    SIGNAL_MAP
        .iter()
        .find(|(ch, _)| *ch == byte)
        .map(|(_, signal)| *signal)
}

/// Per-device signal slot, written from interrupt context.
#[derive(Debug)]
pub struct SignalLatch(AtomicU8);

impl SignalLatch {
    pub const fn new() -> Self {
        Self(AtomicU8::new(Signal::Ok as u8))
    }

    /// Latch `signal`, overwriting any unconsumed one.
    pub fn raise(&self, signal: Signal) {
        self.0.store(signal as u8, Ordering::Release);
    }

    /// Look at the latch without consuming it.
    pub fn peek(&self) -> Signal {
        Signal::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Read and clear in one step.
    pub fn take(&self) -> Signal {
        Signal::from_u8(self.0.swap(Signal::Ok as u8, Ordering::AcqRel))
    }

    /// A kill or terminate is waiting to be acted on.
    pub fn cancel_pending(&self) -> bool {
        self.peek().is_cancel()
    }
}

impl Default for SignalLatch {
    fn default() -> Self {
        Self::new()
    }
}
