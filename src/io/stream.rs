/*
 * Device Stream
 *
 * Character-stream handle over one descriptor. Formatted output goes
 * through `core::fmt::Write`, one `putc` per byte, so any device can serve
 * as a `write!` target.
 */

use core::fmt;

use super::descriptor::Descriptor;
use super::device::{DeviceId, XioError};

pub struct Stream<'a> {
    desc: &'a Descriptor,
    nonblocking: bool,
}

impl<'a> Stream<'a> {
    /// Stream honoring the device's configured blocking mode.
    pub fn new(desc: &'a Descriptor) -> Self {
        Self { desc, nonblocking: false }
    }

    /// Stream whose writes never wait for buffer space; excess output is dropped.
    pub fn nonblocking(desc: &'a Descriptor) -> Self {
        Self { desc, nonblocking: true }
    }

    pub fn device(&self) -> DeviceId {
        self.desc.id()
    }

    pub fn putc(&mut self, byte: u8) -> Result<(), XioError> {
        if self.nonblocking {
            self.desc.try_putc(byte)
        } else {
            self.desc.putc(byte)
        }
    }

    pub fn getc(&mut self) -> Result<u8, XioError> {
        self.desc.getc()
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), XioError> {
        bytes.iter().try_for_each(|&byte| self.putc(byte))
    }
}

impl fmt::Write for Stream<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
