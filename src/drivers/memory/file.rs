/*
 * Memory File Device
 *
 * A byte-addressed store with independent read and write cursors:
 *
 * - Program memory: a read-only image bound at open time (stored G-code
 *   programs, canned startup blocks).
 * - EEPROM: a fixed, writable array erased to NUL at init.
 *
 * A NUL byte or the end of storage reads as end-of-file. There is no
 * buffering, flow control or signal interception; control bytes are
 * ordinary data. The only interrupt-context entry is `try_putc`, reached
 * when the logger's stderr is bound to a file, and it never waits.
 */

use log::debug;
use spin::Mutex;

use crate::config::EEPROM_SIZE;
use crate::io::ascii::{CR, LF, NUL};
use crate::io::device::{DeviceOps, OpenTarget, XioError};
use crate::io::flags::{DeviceFlags, StateFlags};
use crate::io::signals::SignalLatch;

#[derive(Debug)]
enum Storage {
    /// No image bound yet
    Unbound,
    ReadOnly(&'static [u8]),
    ReadWrite([u8; EEPROM_SIZE]),
}

impl Storage {
    fn bytes(&self) -> Option<&[u8]> {
        match self {
            Storage::Unbound => None,
            Storage::ReadOnly(image) => Some(*image),
            Storage::ReadWrite(cells) => Some(&cells[..]),
        }
    }
}

#[derive(Debug)]
struct FileState {
    storage: Storage,
    rd: usize,
    wr: usize,
}

impl FileState {
    fn store(&mut self, byte: u8) -> Result<(), XioError> {
        match &mut self.storage {
            Storage::Unbound => Err(XioError::FileNotOpen),
            Storage::ReadOnly(_) => Err(XioError::Err),
            Storage::ReadWrite(cells) => {
                let cell = cells.get_mut(self.wr).ok_or(XioError::FileSizeExceeded)?;
                *cell = byte;
                self.wr += 1;
                Ok(())
            }
        }
    }
}

/// A program-memory or EEPROM device.
#[derive(Debug)]
pub struct FileDevice {
    state: Mutex<FileState>,
}

impl FileDevice {
    const fn with_storage(storage: Storage) -> Self {
        Self {
            state: Mutex::new(FileState { storage, rd: 0, wr: 0 }),
        }
    }

    /// Read-only device; unusable until an image is bound with `open`.
    pub const fn program_memory() -> Self {
        Self::with_storage(Storage::Unbound)
    }

    /// Writable device backed by `EEPROM_SIZE` erased bytes.
    pub const fn eeprom() -> Self {
        Self::with_storage(Storage::ReadWrite([NUL; EEPROM_SIZE]))
    }

    /// Current read position.
    pub fn read_offset(&self) -> usize {
        self.state.lock().rd
    }

    /// Current write position.
    pub fn write_offset(&self) -> usize {
        self.state.lock().wr
    }
}

impl DeviceOps for FileDevice {
    fn open(&self, flags: &DeviceFlags, target: OpenTarget) -> Result<(), XioError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        match target {
            OpenTarget::Image(image) => match &mut state.storage {
                Storage::ReadWrite(cells) => {
                    if image.len() > cells.len() {
                        return Err(XioError::FileSizeExceeded);
                    }
                    cells.fill(NUL);
                    cells[..image.len()].copy_from_slice(image);
                }
                storage => *storage = Storage::ReadOnly(image),
            },
            OpenTarget::Offset(offset) => {
                let len = state.storage.bytes().ok_or(XioError::FileNotOpen)?.len();
                if offset > len {
                    return Err(XioError::FileSizeExceeded);
                }
                state.rd = offset;
                state.wr = offset;
                flags.clear_state(StateFlags::EOF);
                return Ok(());
            }
            OpenTarget::Rewind => {
                state.storage.bytes().ok_or(XioError::FileNotOpen)?;
            }
        }
        state.rd = 0;
        state.wr = 0;
        drop(guard);
        flags.clear_state(StateFlags::EOF);
        debug!("xio: memory file rewound");
        Ok(())
    }

    fn putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError> {
        if !flags.is_writable() {
            return Err(XioError::Err);
        }
        self.state.lock().store(byte)
    }

    /// The logger may reach this from an ISR that preempted a file call;
    /// a held lock means the write is dropped, never waited for.
    fn try_putc(&self, flags: &DeviceFlags, byte: u8) -> Result<(), XioError> {
        if !flags.is_writable() {
            return Err(XioError::Err);
        }
        self.state.try_lock().ok_or(XioError::Again)?.store(byte)
    }

    fn getc(&self, flags: &DeviceFlags, _signal: &SignalLatch) -> Result<u8, XioError> {
        if !flags.is_readable() {
            return Err(XioError::Err);
        }
        let mut guard = self.state.lock();
        let state = &mut *guard;
        loop {
            let rd = state.rd;
            let bytes = state.storage.bytes().ok_or(XioError::FileNotOpen)?;
            let byte = match bytes.get(rd) {
                Some(&byte) if byte != NUL => byte,
                _ => {
                    flags.set_state(StateFlags::EOF);
                    return Err(XioError::Eof);
                }
            };
            state.rd = rd + 1;
            if (byte == CR && flags.ignore_cr()) || (byte == LF && flags.ignore_lf()) {
                continue;
            }
            return Ok(byte);
        }
    }
}
