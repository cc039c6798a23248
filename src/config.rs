/*
 * XIO Compile-Time Configuration
 *
 * Buffer geometry, flow-control thresholds and the control words each
 * device is configured with at init. Runtime configuration goes through
 * the control word passed to `configure`.
 */

use crate::io::flags::Control;

/// Receive buffer slots per USART (one slot is lost to full/empty detection).
pub const RX_BUFFER_SIZE: usize = 128;

/// Transmit buffer slots per USART.
pub const TX_BUFFER_SIZE: usize = 64;

/// Receive occupancy at which a flow-controlled USART asks its sender to pause.
pub const XOFF_HIGH_WATER: usize = RX_BUFFER_SIZE - 1 - 16;

/// Capacity of every descriptor's line-assembly buffer.
pub const LINE_BUFFER_SIZE: usize = 128;

/// Maximum line length per device family.
pub const USART_LINE_SIZE: usize = 128;
pub const PGM_LINE_SIZE: usize = 128;
pub const EEP_LINE_SIZE: usize = 64;

/// Size of the simulated non-volatile memory behind the EEPROM device.
pub const EEPROM_SIZE: usize = 512;

const _: () = assert!(XOFF_HIGH_WATER < RX_BUFFER_SIZE);
const _: () = assert!(USART_LINE_SIZE <= LINE_BUFFER_SIZE);
const _: () = assert!(PGM_LINE_SIZE <= LINE_BUFFER_SIZE);
const _: () = assert!(EEP_LINE_SIZE <= LINE_BUFFER_SIZE);

/// Serial ports: read/write, non-blocking, XON/XOFF, CR/LF on output.
pub const USART_DEFAULT_CONTROL: Control = Control::RDWR
    .union(Control::NOBLOCK)
    .union(Control::XOFF)
    .union(Control::NOECHO)
    .union(Control::CRLF)
    .union(Control::LINEMODE);

/// Program memory is read-only.
pub const PGM_DEFAULT_CONTROL: Control = Control::RD
    .union(Control::BLOCK)
    .union(Control::LINEMODE);

/// EEPROM is read/write.
pub const EEP_DEFAULT_CONTROL: Control = Control::RDWR
    .union(Control::BLOCK)
    .union(Control::LINEMODE);
