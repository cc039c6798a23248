/*
 * ASCII control characters XIO gives meaning to.
 */

/// End of file on memory devices.
pub const NUL: u8 = 0x00;
/// ^C, kill
pub const ETX: u8 = 0x03;
/// ^G
pub const BEL: u8 = 0x07;
/// ^H
pub const BS: u8 = 0x08;
pub const LF: u8 = b'\n';
pub const CR: u8 = b'\r';
/// ^Q, DC1, resume
pub const XON: u8 = 0x11;
/// ^S, DC3, pause
pub const XOFF: u8 = 0x13;
/// ^X, cancel / terminate
pub const CAN: u8 = 0x18;
pub const ESC: u8 = 0x1B;
pub const DEL: u8 = 0x7F;

/// Bytes that terminate a line.
#[inline]
pub const fn is_eol(byte: u8) -> bool {
    byte == LF || byte == CR
}
