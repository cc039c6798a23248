/*
 * Descriptor Table
 *
 * The process-wide registry of XIO devices, indexed by `DeviceId`. It is
 * built once by `init`, with every device configured to its default
 * control word, and lives for the rest of the program.
 *
 * Besides per-device calls the table keeps the stdin/stdout/stderr
 * bindings used by the print macros and the logger.
 */

use core::sync::atomic::{AtomicU8, Ordering};

use log::{info, warn};
use spin::Once;

use crate::drivers::serial::{NULL_SERIAL, SerialHardware};

use super::descriptor::Descriptor;
use super::device::{DEVICE_COUNT, DeviceId, OpenTarget, USART_COUNT, XioError};
use super::flags::Control;
use super::line::Line;
use super::signals::Signal;
use super::stream::Stream;

pub struct DescriptorTable {
    devices: [Descriptor; DEVICE_COUNT],
    stdin: AtomicU8,
    stdout: AtomicU8,
    stderr: AtomicU8,
}

impl DescriptorTable {
    /// Build and configure every device. `serial[i]` drives USART `i`.
    pub fn new(serial: [&'static dyn SerialHardware; USART_COUNT]) -> Self {
        let devices = core::array::from_fn(|index| {
            let id = DeviceId::ALL[index];
            let hw = serial.get(index).copied().unwrap_or(&NULL_SERIAL);
            Descriptor::new(id, hw)
        });
        let table = Self {
            devices,
            stdin: AtomicU8::new(DeviceId::Usb as u8),
            stdout: AtomicU8::new(DeviceId::Usb as u8),
            stderr: AtomicU8::new(DeviceId::Usb as u8),
        };
        for desc in &table.devices {
            let configured = desc.configure(desc.id().default_control());
            debug_assert!(configured.is_ok(), "{:?} rejected its default control word", desc.id());
            if let Err(err) = configured {
                warn!("xio: {:?} default configuration failed: {}", desc.id(), err);
            }
        }
        table
    }

    pub fn device(&self, dev: DeviceId) -> &Descriptor {
        &self.devices[dev.index()]
    }

    pub fn devices(&self) -> impl Iterator<Item = &Descriptor> {
        self.devices.iter()
    }

    pub fn configure(&self, dev: DeviceId, control: Control) -> Result<(), XioError> {
        self.device(dev).configure(control)
    }

    pub fn reconfigure(&self, dev: DeviceId, control: Control) -> Result<(), XioError> {
        self.device(dev).reconfigure(control)
    }

    /// `configure` with an unchecked device number and raw control word.
    pub fn configure_raw(&self, dev: u8, control: u32) -> Result<(), XioError> {
        let dev = DeviceId::try_from(dev)?;
        self.configure(dev, Control::from_raw(control))
    }

    pub fn open(&self, dev: DeviceId, target: OpenTarget) -> Result<(), XioError> {
        self.device(dev).open(target)
    }

    pub fn putc(&self, dev: DeviceId, byte: u8) -> Result<(), XioError> {
        self.device(dev).putc(byte)
    }

    pub fn getc(&self, dev: DeviceId) -> Result<u8, XioError> {
        self.device(dev).getc()
    }

    pub fn gets(&self, dev: DeviceId, max_len: usize) -> Result<Line, XioError> {
        self.device(dev).gets(max_len)
    }

    /// Receive interrupt entry for USART `dev`.
    pub fn rx_isr(&self, dev: DeviceId, byte: u8) -> Result<(), XioError> {
        self.device(dev).rx_isr(byte)
    }

    /// Transmit interrupt entry for USART `dev`.
    pub fn tx_isr(&self, dev: DeviceId) -> Option<u8> {
        self.device(dev).tx_isr()
    }

    pub fn signal(&self, dev: DeviceId) -> Signal {
        self.device(dev).signal()
    }

    pub fn take_signal(&self, dev: DeviceId) -> Signal {
        self.device(dev).take_signal()
    }

    fn binding(slot: &AtomicU8) -> DeviceId {
        DeviceId::try_from(slot.load(Ordering::Relaxed)).unwrap_or(DeviceId::Usb)
    }

    pub fn set_stdin(&self, dev: DeviceId) {
        self.stdin.store(dev as u8, Ordering::Relaxed);
    }

    pub fn set_stdout(&self, dev: DeviceId) {
        self.stdout.store(dev as u8, Ordering::Relaxed);
    }

    pub fn set_stderr(&self, dev: DeviceId) {
        self.stderr.store(dev as u8, Ordering::Relaxed);
    }

    pub fn stdin_device(&self) -> DeviceId {
        Self::binding(&self.stdin)
    }

    pub fn stdout_device(&self) -> DeviceId {
        Self::binding(&self.stdout)
    }

    pub fn stderr_device(&self) -> DeviceId {
        Self::binding(&self.stderr)
    }

    pub fn getc_stdin(&self) -> Result<u8, XioError> {
        self.getc(self.stdin_device())
    }

    pub fn gets_stdin(&self, max_len: usize) -> Result<Line, XioError> {
        self.gets(self.stdin_device(), max_len)
    }

    pub fn stream(&self, dev: DeviceId) -> Stream<'_> {
        Stream::new(self.device(dev))
    }

    pub fn stdout(&self) -> Stream<'_> {
        self.stream(self.stdout_device())
    }

    /// Non-blocking stream on the stderr device.
    pub fn stderr(&self) -> Stream<'_> {
        Stream::nonblocking(self.device(self.stderr_device()))
    }
}

static XIO: Once<DescriptorTable> = Once::new();

/// Build the global table. Later calls return the existing table unchanged.
pub fn init(serial: [&'static dyn SerialHardware; USART_COUNT]) -> &'static DescriptorTable {
    XIO.call_once(|| {
        let table = DescriptorTable::new(serial);
        info!("xio: {} devices initialized", DEVICE_COUNT);
        table
    })
}

/// The global table, if `init` has run.
pub fn try_table() -> Option<&'static DescriptorTable> {
    XIO.get()
}
