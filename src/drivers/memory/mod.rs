/*
 * Memory File Drivers
 *
 * Program memory and EEPROM exposed as character devices. Reads and writes
 * complete synchronously against the backing store.
 */

pub mod file;

pub use file::FileDevice;
