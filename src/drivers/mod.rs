/*
 * Device Backends
 *
 * Concrete implementations of `DeviceOps`:
 * - Serial: interrupt-driven USART ports with receive/transmit rings
 * - Memory: program-memory and EEPROM "files" read synchronously
 */

pub mod memory;
pub mod serial;
