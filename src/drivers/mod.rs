//! Device interfaces used by the syscall boundary
//!
//! All drivers follow these principles:
//! - The boundary only sees traits, never device registers
//! - No panics on invalid input (return errors)

pub mod console;

pub use console::{Console, ConsoleWriter};
