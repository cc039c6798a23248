/*
 * XIO Character-I/O Core
 *
 * Device-independent stdio for motion-controller firmware. Serial ports
 * (interrupt-fed ring buffers with XON/XOFF flow control and signal
 * interception) and memory-backed files share one operation set:
 * open, configure, putc, getc and gets.
 *
 * Bring-up:
 *
 *   let table = xio::init([&RS485_HW, &USB_HW, &TTL_HW]);
 *   xio::utils::logger::init(LevelFilter::Info)?;
 *
 * The serial interrupt handlers then call `table.rx_isr(dev, byte)` for
 * every received byte and `table.tx_isr(dev)` whenever the transmitter
 * can take one.
 */

#![cfg_attr(not(test), no_std)]

pub mod arch;
pub mod config;
pub mod drivers;
pub mod io;
#[macro_use]
pub mod utils;

pub use io::{
    Control, DescriptorTable, DeviceId, OpenTarget, Signal, XioCode, XioError, init, try_table,
};
