/*
 * Device Descriptor
 *
 * One descriptor per device, created when the table is built and never
 * destroyed. It owns the device's flag word, signal latch, line buffer and
 * backend, and records the outcome of the last application-level call.
 *
 * Status and the scratch character are atomics so that `putc`/`getc` never
 * contend on the line lock; only `gets` takes it.
 */

use core::sync::atomic::{AtomicU8, Ordering};

use log::{debug, warn};
use spin::Mutex;

use crate::config::{EEP_LINE_SIZE, PGM_LINE_SIZE, USART_LINE_SIZE};
use crate::drivers::memory::FileDevice;
use crate::drivers::serial::{SerialHardware, UsartPort};

use super::device::{DeviceId, DeviceOps, OpenTarget, XioCode, XioError};
use super::flags::{Control, DeviceFlags};
use super::line::{Line, LineBuffer};
use super::signals::{Signal, SignalLatch};

/// Device-family specific state behind a descriptor.
pub enum Backend {
    Usart(UsartPort),
    File(FileDevice),
}

impl Backend {
    fn ops(&self) -> &dyn DeviceOps {
        match self {
            Backend::Usart(port) => port,
            Backend::File(file) => file,
        }
    }
}

pub struct Descriptor {
    id: DeviceId,
    flags: DeviceFlags,
    signal: SignalLatch,
    status: AtomicU8,
    /// Last character returned by `getc`
    scratch: AtomicU8,
    backend: Backend,
    line: Mutex<LineBuffer>,
}

impl Descriptor {
    /// Build an unconfigured descriptor; `serial` is only used by USART ids.
    pub fn new(id: DeviceId, serial: &'static dyn SerialHardware) -> Self {
        let (backend, line_size) = match id {
            DeviceId::Rs485 | DeviceId::Usb | DeviceId::Ttl => {
                (Backend::Usart(UsartPort::new(serial)), USART_LINE_SIZE)
            }
            DeviceId::Pgm => (Backend::File(FileDevice::program_memory()), PGM_LINE_SIZE),
            DeviceId::Eep => (Backend::File(FileDevice::eeprom()), EEP_LINE_SIZE),
        };
        Self {
            id,
            flags: DeviceFlags::new(),
            signal: SignalLatch::new(),
            status: AtomicU8::new(XioCode::Ok as u8),
            scratch: AtomicU8::new(0),
            backend,
            line: Mutex::new(LineBuffer::new(line_size)),
        }
    }

    fn record<T>(&self, result: Result<T, XioError>) -> Result<T, XioError> {
        let code = match &result {
            Ok(_) => XioCode::Ok,
            Err(err) => err.code(),
        };
        self.status.store(code as u8, Ordering::Relaxed);
        result
    }

    pub fn id(&self) -> DeviceId {
        self.id
    }

    pub fn flags(&self) -> &DeviceFlags {
        &self.flags
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Code of the last completed application-level operation.
    pub fn status(&self) -> XioCode {
        XioCode::from_u8(self.status.load(Ordering::Relaxed))
    }

    pub fn last_char(&self) -> u8 {
        self.scratch.load(Ordering::Relaxed)
    }

    /// Characters collected so far into the current line.
    pub fn line_len(&self) -> usize {
        self.line.lock().len()
    }

    pub fn line_size(&self) -> usize {
        self.line.lock().size()
    }

    /// The latched signal, left in place.
    pub fn signal(&self) -> Signal {
        self.signal.peek()
    }

    /// The latched signal, reset to `Signal::Ok`.
    pub fn take_signal(&self) -> Signal {
        self.signal.take()
    }

    pub fn open(&self, target: OpenTarget) -> Result<(), XioError> {
        self.record(self.backend.ops().open(&self.flags, target))
    }

    /// Apply `control` with all runtime state reset.
    pub fn configure(&self, control: Control) -> Result<(), XioError> {
        let config = self.flags.configure(control);
        self.line.lock().reset();
        debug!("xio: {:?} configured {:?}", self.id, config);
        self.record(self.backend.ops().control(&self.flags, control))
    }

    /// Apply `control`, keeping runtime state (partial line, flow control).
    pub fn reconfigure(&self, control: Control) -> Result<(), XioError> {
        let config = self.flags.reconfigure(control);
        debug!("xio: {:?} reconfigured {:?}", self.id, config);
        self.record(self.backend.ops().control(&self.flags, control))
    }

    pub fn putc(&self, byte: u8) -> Result<(), XioError> {
        self.record(self.backend.ops().putc(&self.flags, byte))
    }

    /// Never blocks and leaves the status untouched; used for diagnostics.
    pub fn try_putc(&self, byte: u8) -> Result<(), XioError> {
        self.backend.ops().try_putc(&self.flags, byte)
    }

    pub fn getc(&self) -> Result<u8, XioError> {
        let result = self.backend.ops().getc(&self.flags, &self.signal);
        if let Ok(byte) = result {
            self.scratch.store(byte, Ordering::Relaxed);
        }
        self.record(result)
    }

    /// Read one line of at most `max_len` characters, terminator excluded.
    ///
    /// A successful read records `Eol` (or `Eof` for a final unterminated line).
    pub fn gets(&self, max_len: usize) -> Result<Line, XioError> {
        let result = {
            let mut line = self.line.lock();
            self.backend.ops().gets(&self.flags, &self.signal, &mut line, max_len)
        };
        match &result {
            Ok(_) => {
                let code = if self.flags.at_eol() { XioCode::Eol } else { XioCode::Eof };
                self.status.store(code as u8, Ordering::Relaxed);
                result
            }
            Err(XioError::BufferFullFatal) => {
                warn!("xio: {:?} line exceeded {} characters, discarded", self.id, max_len);
                self.record(result)
            }
            Err(_) => self.record(result),
        }
    }

    /// RX interrupt entry; memory devices have no receive path.
    pub fn rx_isr(&self, byte: u8) -> Result<(), XioError> {
        match &self.backend {
            Backend::Usart(port) => {
                port.rx_isr(self.flags.runtime(), &self.signal, byte);
                Ok(())
            }
            Backend::File(_) => Err(XioError::NoSuchDevice),
        }
    }

    /// TX interrupt entry: the next byte to send, `None` once drained.
    pub fn tx_isr(&self) -> Option<u8> {
        match &self.backend {
            Backend::Usart(port) => port.tx_isr(self.flags.runtime()),
            Backend::File(_) => None,
        }
    }
}
