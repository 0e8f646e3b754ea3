//! Console Interface
//!
//! Backs the two reserved descriptors: fd 0 reads from the console input
//! queue one byte at a time, fd 1 writes straight to the console output.
//!
//! The same console receives the per-process exit line and, once
//! [`crate::logger::init`] has run, kernel log records.

use core::fmt::{self, Write};

/// Console collaborator.
///
/// Implementations serialize their own output; callers may write from any
/// thread.
pub trait Console: Send + Sync {
    /// Write raw bytes to the console output.
    fn put_bytes(&self, bytes: &[u8]);

    /// Block until one byte of input is available and return it.
    fn get_byte(&self) -> u8;
}

/// `fmt::Write` adaptor over a [`Console`].
pub struct ConsoleWriter<'a> {
    console: &'a dyn Console,
}

impl<'a> ConsoleWriter<'a> {
    /// Wrap a console for formatted output.
    pub fn new(console: &'a dyn Console) -> Self {
        Self { console }
    }
}

impl Write for ConsoleWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.console.put_bytes(s.as_bytes());
        Ok(())
    }
}

/// Print to a console with `format!` syntax.
#[macro_export]
macro_rules! cprint {
    ($console:expr, $($arg:tt)*) => {{
        use core::fmt::Write;
        let mut writer = $crate::drivers::console::ConsoleWriter::new($console);
        let _ = write!(writer, $($arg)*);
    }};
}

/// Print a line to a console with `format!` syntax.
#[macro_export]
macro_rules! cprintln {
    ($console:expr) => {
        $crate::cprint!($console, "\n")
    };
    ($console:expr, $($arg:tt)*) => {{
        $crate::cprint!($console, $($arg)*);
        $crate::cprint!($console, "\n");
    }};
}
