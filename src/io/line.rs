/*
 * Line Assembly
 *
 * Builds lines out of single-character reads. A line ends at CR or LF
 * (the terminator is not stored). A line that reaches the length limit
 * without a terminator is void: it is discarded and reported as
 * `BufferFullFatal`, and the next call starts a fresh line.
 *
 * A non-blocking read that runs dry returns `Again` and keeps the partial
 * line, so the caller simply calls again later.
 */

use heapless::Vec;

use crate::config::LINE_BUFFER_SIZE;

use super::ascii;
use super::device::{DeviceOps, XioError};
use super::flags::{DeviceFlags, StateFlags};
use super::signals::SignalLatch;

/// A completed line.
pub type Line = Vec<u8, LINE_BUFFER_SIZE>;

/// A descriptor's line-assembly buffer; its size limit is fixed at init.
#[derive(Debug)]
pub struct LineBuffer {
    buf: Line,
    size: usize,
}

impl LineBuffer {
    pub const fn new(size: usize) -> Self {
        Self {
            buf: Vec::new(),
            size: if size < LINE_BUFFER_SIZE { size } else { LINE_BUFFER_SIZE },
        }
    }

    /// Characters read into the current line so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured maximum line length.
    pub fn size(&self) -> usize {
        self.size
    }

    pub(crate) fn reset(&mut self) {
        self.buf.clear();
    }

    fn take(&mut self) -> Line {
        core::mem::take(&mut self.buf)
    }
}

/// Read from `dev` until a line is complete, the limit is hit, or input runs out.
pub(crate) fn assemble<D: DeviceOps + ?Sized>(
    dev: &D,
    flags: &DeviceFlags,
    signal: &SignalLatch,
    line: &mut LineBuffer,
    max_len: usize,
) -> Result<Line, XioError> {
    let limit = max_len.min(line.size);

    if !flags.in_line() {
        line.reset();
        flags.set_state(StateFlags::IN_LINE);
        flags.clear_state(StateFlags::EOL);
    }

    loop {
        let byte = match dev.getc(flags, signal) {
            Ok(byte) => byte,
            Err(XioError::Eof) => {
                flags.clear_state(StateFlags::IN_LINE);
                if line.is_empty() {
                    return Err(XioError::Eof);
                }
                return Ok(line.take());
            }
            Err(err) => return Err(err),
        };

        if ascii::is_eol(byte) {
            // line mode swallows the second half of CR LF and blank lines
            if line.is_empty() && flags.line_mode() {
                continue;
            }
            flags.clear_state(StateFlags::IN_LINE);
            flags.set_state(StateFlags::EOL);
            return Ok(line.take());
        }

        // limit <= size <= capacity, so a failed push implies the limit was hit
        if line.buf.push(byte).is_err() || line.len() >= limit {
            flags.clear_state(StateFlags::IN_LINE);
            line.reset();
            return Err(XioError::BufferFullFatal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::device::OpenTarget;
    use crate::io::flags::Control;
    use core::cell::RefCell;

    /// Serves a fixed script of getc results.
    struct Script {
        items: RefCell<&'static [Result<u8, XioError>]>,
    }

    impl Script {
        fn new(items: &'static [Result<u8, XioError>]) -> Self {
            Self {
                items: RefCell::new(items),
            }
        }
    }

    impl DeviceOps for Script {
        fn open(&self, _flags: &DeviceFlags, _target: OpenTarget) -> Result<(), XioError> {
            Ok(())
        }

        fn putc(&self, _flags: &DeviceFlags, _byte: u8) -> Result<(), XioError> {
            Ok(())
        }

        fn try_putc(&self, _flags: &DeviceFlags, _byte: u8) -> Result<(), XioError> {
            Ok(())
        }

        fn getc(&self, _flags: &DeviceFlags, _signal: &SignalLatch) -> Result<u8, XioError> {
            let mut items = self.items.borrow_mut();
            match items.split_first() {
                Some((first, rest)) => {
                    *items = rest;
                    *first
                }
                None => Err(XioError::Again),
            }
        }
    }

    /// Serves bytes, then `Again` forever.
    struct ScriptBytes {
        data: RefCell<&'static [u8]>,
    }

    impl ScriptBytes {
        fn new(data: &'static [u8]) -> Self {
            Self {
                data: RefCell::new(data),
            }
        }
    }

    impl DeviceOps for ScriptBytes {
        fn open(&self, _flags: &DeviceFlags, _target: OpenTarget) -> Result<(), XioError> {
            Ok(())
        }

        fn putc(&self, _flags: &DeviceFlags, _byte: u8) -> Result<(), XioError> {
            Ok(())
        }

        fn try_putc(&self, _flags: &DeviceFlags, _byte: u8) -> Result<(), XioError> {
            Ok(())
        }

        fn getc(&self, _flags: &DeviceFlags, _signal: &SignalLatch) -> Result<u8, XioError> {
            let mut data = self.data.borrow_mut();
            match data.split_first() {
                Some((first, rest)) => {
                    *data = rest;
                    Ok(*first)
                }
                None => Err(XioError::Again),
            }
        }
    }

    fn setup(control: Control) -> (DeviceFlags, SignalLatch, LineBuffer) {
        let flags = DeviceFlags::new();
        flags.configure(Control::RD | control);
        (flags, SignalLatch::new(), LineBuffer::new(LINE_BUFFER_SIZE))
    }

    #[test]
    fn terminated_line_is_returned_without_marker() {
        let dev = ScriptBytes::new(b"abc\n");
        let (flags, signal, mut line) = setup(Control::empty());

        let got = dev.gets(&flags, &signal, &mut line, 80).unwrap();
        assert_eq!(&got[..], b"abc");
        assert_eq!(got.len(), 3);
        assert!(flags.at_eol());
        assert!(!flags.in_line());
    }

    #[test]
    fn unterminated_line_at_limit_is_discarded() {
        static DATA: [u8; 80] = [b'x'; 80];
        let dev = ScriptBytes::new(&DATA);
        let (flags, signal, mut line) = setup(Control::empty());

        assert_eq!(dev.gets(&flags, &signal, &mut line, 80), Err(XioError::BufferFullFatal));
        assert!(!flags.in_line());
        assert_eq!(line.len(), 0);
    }

    #[test]
    fn next_line_after_overflow_starts_fresh() {
        let dev = ScriptBytes::new(b"0123456789ok\n");
        let (flags, signal, mut line) = setup(Control::empty());

        assert_eq!(dev.gets(&flags, &signal, &mut line, 5), Err(XioError::BufferFullFatal));
        assert_eq!(dev.gets(&flags, &signal, &mut line, 5), Err(XioError::BufferFullFatal));
        let got = dev.gets(&flags, &signal, &mut line, 5).unwrap();
        assert_eq!(&got[..], b"ok");
    }

    #[test]
    fn would_block_keeps_partial_line() {
        static ITEMS: [Result<u8, XioError>; 5] =
            [Ok(b'G'), Ok(b'1'), Err(XioError::Again), Ok(b'X'), Ok(b'\r')];
        let dev = Script::new(&ITEMS);
        let (flags, signal, mut line) = setup(Control::empty());

        assert_eq!(dev.gets(&flags, &signal, &mut line, 80), Err(XioError::Again));
        assert!(flags.in_line());
        assert_eq!(line.len(), 2);

        let got = dev.gets(&flags, &signal, &mut line, 80).unwrap();
        assert_eq!(&got[..], b"G1X");
    }

    #[test]
    fn eof_returns_pending_data_then_eof() {
        static ITEMS: [Result<u8, XioError>; 3] = [Ok(b'M'), Ok(b'2'), Err(XioError::Eof)];
        let dev = Script::new(&ITEMS);
        let (flags, signal, mut line) = setup(Control::empty());

        let got = dev.gets(&flags, &signal, &mut line, 80).unwrap();
        assert_eq!(&got[..], b"M2");

        static DONE: [Result<u8, XioError>; 1] = [Err(XioError::Eof)];
        let dev = Script::new(&DONE);
        assert_eq!(dev.gets(&flags, &signal, &mut line, 80), Err(XioError::Eof));
    }

    #[test]
    fn line_mode_skips_empty_lines() {
        let dev = ScriptBytes::new(b"a\r\n\nb\n");
        let (flags, signal, mut line) = setup(Control::LINEMODE);

        assert_eq!(&dev.gets(&flags, &signal, &mut line, 80).unwrap()[..], b"a");
        assert_eq!(&dev.gets(&flags, &signal, &mut line, 80).unwrap()[..], b"b");
    }

    #[test]
    fn without_line_mode_cr_lf_yields_empty_line() {
        let dev = ScriptBytes::new(b"a\r\n");
        let (flags, signal, mut line) = setup(Control::NOLINEMODE);

        assert_eq!(&dev.gets(&flags, &signal, &mut line, 80).unwrap()[..], b"a");
        assert!(dev.gets(&flags, &signal, &mut line, 80).unwrap().is_empty());
    }

    #[test]
    fn limit_is_capped_by_buffer_size() {
        static DATA: [u8; 9] = *b"abcdefgh\n";
        let dev = ScriptBytes::new(&DATA);
        let (flags, signal, _) = setup(Control::empty());
        let mut small = LineBuffer::new(4);

        assert_eq!(small.size(), 4);
        assert_eq!(dev.gets(&flags, &signal, &mut small, 80), Err(XioError::BufferFullFatal));
    }
}
