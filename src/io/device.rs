/*
 * Device Abstraction Layer
 *
 * The operation set every XIO device implements, the device identifiers,
 * and the status codes all public operations report.
 *
 * Two families implement `DeviceOps`: interrupt-buffered serial ports
 * (receive/transmit rings, flow control, signal interception) and
 * synchronous memory files (direct reads, no buffering, control bytes
 * are plain data). Line assembly is shared: `gets` defaults to building
 * lines out of repeated `getc` calls.
 */

use core::fmt;

use crate::config::{EEP_DEFAULT_CONTROL, PGM_DEFAULT_CONTROL, USART_DEFAULT_CONTROL};

use super::flags::{Control, DeviceFlags};
use super::line::{self, Line, LineBuffer};
use super::signals::SignalLatch;

/// Configured devices. Serial ports come first so their id doubles as USART index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DeviceId {
    /// RS-485 network port
    Rs485 = 0,
    /// USB serial, the primary console
    Usb = 1,
    /// Auxiliary TTL serial
    Ttl = 2,
    /// Program memory file (read only)
    Pgm = 3,
    /// EEPROM file (read/write)
    Eep = 4,
}

/// Number of serial (USART) devices.
pub const USART_COUNT: usize = 3;
/// Number of memory file devices.
pub const FILE_COUNT: usize = 2;
/// Total number of devices.
pub const DEVICE_COUNT: usize = USART_COUNT + FILE_COUNT;

impl DeviceId {
    pub const ALL: [DeviceId; DEVICE_COUNT] = [
        DeviceId::Rs485,
        DeviceId::Usb,
        DeviceId::Ttl,
        DeviceId::Pgm,
        DeviceId::Eep,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_usart(self) -> bool {
        self.index() < USART_COUNT
    }

    /// Control word applied when the table is created.
    pub const fn default_control(self) -> Control {
        match self {
            DeviceId::Rs485 | DeviceId::Usb | DeviceId::Ttl => USART_DEFAULT_CONTROL,
            DeviceId::Pgm => PGM_DEFAULT_CONTROL,
            DeviceId::Eep => EEP_DEFAULT_CONTROL,
        }
    }
}

impl TryFrom<u8> for DeviceId {
    type Error = XioError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        DeviceId::ALL
            .get(value as usize)
            .copied()
            .ok_or(XioError::NoSuchDevice)
    }
}

/// XIO status codes, as recorded in a descriptor's status field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum XioCode {
    Ok = 0,
    Err = 1,
    Again = 2,
    Noop = 3,
    Complete = 4,
    Eol = 5,
    Eof = 6,
    FileNotOpen = 7,
    FileSizeExceeded = 8,
    NoSuchDevice = 9,
    BufferEmpty = 10,
    BufferFullFatal = 11,
    BufferFullNonFatal = 12,
}

impl XioCode {
    pub const fn from_u8(value: u8) -> Self {
        match value {
            0 => XioCode::Ok,
            2 => XioCode::Again,
            3 => XioCode::Noop,
            4 => XioCode::Complete,
            5 => XioCode::Eol,
            6 => XioCode::Eof,
            7 => XioCode::FileNotOpen,
            8 => XioCode::FileSizeExceeded,
            9 => XioCode::NoSuchDevice,
            10 => XioCode::BufferEmpty,
            11 => XioCode::BufferFullFatal,
            12 => XioCode::BufferFullNonFatal,
            _ => XioCode::Err,
        }
    }
}

/// Every non-OK outcome of an XIO operation.
///
/// Capacity errors (`BufferFull*`, `FileSizeExceeded`) are recoverable by
/// the caller; `NoSuchDevice`/`FileNotOpen` are configuration errors;
/// `Again`/`BufferEmpty` are the steady state of a non-blocking reader;
/// `Eol`/`Eof` are stream boundaries rather than failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum XioError {
    Err = 1,
    /// Operation would block; call again
    Again = 2,
    Noop = 3,
    Complete = 4,
    Eol = 5,
    Eof = 6,
    FileNotOpen = 7,
    FileSizeExceeded = 8,
    NoSuchDevice = 9,
    BufferEmpty = 10,
    /// Line overflowed; the partial line is discarded
    BufferFullFatal = 11,
    BufferFullNonFatal = 12,
}

impl XioError {
    pub const fn code(self) -> XioCode {
        XioCode::from_u8(self as u8)
    }
}

impl From<XioError> for XioCode {
    fn from(err: XioError) -> Self {
        err.code()
    }
}

impl fmt::Display for XioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            XioError::Err => "generic error",
            XioError::Again => "operation would block",
            XioError::Noop => "no operation",
            XioError::Complete => "operation complete",
            XioError::Eol => "end of line",
            XioError::Eof => "end of file",
            XioError::FileNotOpen => "file is not open",
            XioError::FileSizeExceeded => "maximum file size exceeded",
            XioError::NoSuchDevice => "illegal or unavailable device",
            XioError::BufferEmpty => "buffer empty",
            XioError::BufferFullFatal => "buffer full, line discarded",
            XioError::BufferFullNonFatal => "buffer full",
        };
        f.write_str(msg)
    }
}

/// What `open` binds a device to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenTarget {
    /// Bind a program-memory device to a read-only image
    Image(&'static [u8]),
    /// Move a memory device's read and write position
    Offset(usize),
    /// Reopen in place: memory devices rewind, serial ports ignore it
    Rewind,
}

/// The five operations bound to every device.
///
/// `flags` and `signal` belong to the descriptor that owns the device;
/// implementations read configuration through the flag predicates and
/// update only runtime bits.
pub trait DeviceOps {
    fn open(&self, flags: &DeviceFlags, target: OpenTarget) -> Result<(), XioError>;

    /// Device-specific side effects of a new control word.
    fn control(&self, _flags: &DeviceFlags, _control: Control) -> Result<(), XioError> {
        Ok(())
    }

    /// Write one byte, honoring the device's blocking mode.
    fn putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError>;

    /// Write one byte without ever waiting, on buffer space or on a lock.
    ///
    /// Reached from interrupt context through the logger, so a device busy
    /// with the interrupted code must fail with `Again` instead of spinning.
    fn try_putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError>;

    fn getc(&self, flags: &DeviceFlags, signal: &SignalLatch) -> Result<u8, XioError>;

    /// Read one line (without its terminator) into a fresh `Line`.
    fn gets(
        &self,
        flags: &DeviceFlags,
        signal: &SignalLatch,
        line: &mut LineBuffer,
        max_len: usize,
    ) -> Result<Line, XioError> {
        line::assemble(self, flags, signal, line, max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_device_numbers_map_to_ids() {
        assert_eq!(DeviceId::try_from(1), Ok(DeviceId::Usb));
        assert_eq!(DeviceId::try_from(4), Ok(DeviceId::Eep));
        assert_eq!(DeviceId::try_from(5), Err(XioError::NoSuchDevice));
    }

    #[test]
    fn only_first_three_devices_are_usarts() {
        let usarts = DeviceId::ALL.iter().filter(|d| d.is_usart()).count();
        assert_eq!(usarts, USART_COUNT);
        assert!(!DeviceId::Pgm.is_usart());
    }

    #[test]
    fn error_codes_match_status_codes() {
        assert_eq!(XioError::Again.code(), XioCode::Again);
        assert_eq!(XioCode::from(XioError::BufferFullFatal), XioCode::BufferFullFatal);
        assert_eq!(XioError::BufferFullNonFatal as u8, 12);
        assert_eq!(XioCode::from_u8(0), XioCode::Ok);
    }
}
