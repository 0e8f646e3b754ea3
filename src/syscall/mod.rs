//! System Call Interface
//!
//! Decodes system calls from user trap frames and runs them against the
//! calling process and the shared kernel services.
//!
//! # Security Model
//! - Whitelist approach: only the calls in [`numbers`] exist; anything else
//!   terminates the caller
//! - Every pointer argument is validated before use
//! - Caller mistakes terminate the caller, never the kernel
//!
//! # Current Syscalls
//! - 0: halt() - power off
//! - 1: exit(status) - terminate the current process
//! - 2: fork(name) - duplicate the current process
//! - 3: exec(cmd_line) - replace the current image
//! - 4: wait(pid) - collect a child's exit status
//! - 5: create(path, size) / 6: remove(path) / 7: open(path)
//! - 8: filesize(fd) / 9: read(fd, buf, len) / 10: write(fd, buf, len)
//! - 11: seek(fd, pos) / 12: tell(fd) / 13: close(fd)

mod error;
mod file;
mod handler;
mod process;
pub mod validate;


pub use error::SyscallError;
pub use handler::{dispatch, numbers, Action};
pub use validate::{Access, UserAccess, UserMemory};
