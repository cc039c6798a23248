/*
 * XIO Print Macros
 *
 * print!/println! counterparts that format onto the device bound as
 * stdout. Output is silently dropped before `xio::init` has run, and
 * formatting errors (a full transmit buffer on a non-blocking port) are
 * ignored, as with the console macros of a hosted program.
 */

/// Print formatted text to the stdout device.
#[macro_export]
macro_rules! xio_print {
    ($($arg:tt)*) => ({
        use core::fmt::Write;
        if let Some(table) = $crate::io::try_table() {
            let _ = table.stdout().write_fmt(format_args!($($arg)*));
        }
    });
}

/// Print formatted text and a newline to the stdout device.
#[macro_export]
macro_rules! xio_println {
    () => ($crate::xio_print!("\n"));
    ($($arg:tt)*) => ($crate::xio_print!("{}\n", format_args!($($arg)*)));
}
