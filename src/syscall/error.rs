//! Syscall error taxonomy
//!
//! Every handler failure is one of two kinds:
//! - caller-fatal: the calling process is terminated with status -1
//! - operation-local: the caller gets the -1 sentinel and keeps running

use core::fmt;

use crate::fs::fdtable::FdError;
use crate::proc::lifecycle::WaitError;
use crate::proc::{ExecError, ForkError};

/// Sentinel written to the return slot for operation-local failures.
pub const FAILURE: i64 = -1;

/// System call errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    /// A pointer argument does not reference valid user memory.
    BadAddress,
    /// A descriptor argument is negative or past the table end.
    BadDescriptor,
    /// Nothing usable is open at the descriptor.
    NotOpen,
    /// `close` on a descriptor that is not open.
    BadClose,
    /// The descriptor table has no free slot.
    TableFull,
    /// The path does not name a file.
    NoSuchFile,
    /// The id is not a direct child awaiting collection.
    NotChild,
    /// The child process could not be started.
    ForkFailed(ForkError),
    /// The new image could not be loaded.
    ExecFailed(ExecError),
    /// The call number is not one of the supported calls.
    UnknownSyscall(u64),
}

impl SyscallError {
    /// Check whether this error terminates the calling process.
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::BadAddress
                | Self::BadDescriptor
                | Self::BadClose
                | Self::ExecFailed(_)
                | Self::UnknownSyscall(_)
        )
    }
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAddress => write!(f, "bad user address"),
            Self::BadDescriptor => write!(f, "malformed descriptor"),
            Self::NotOpen => write!(f, "descriptor not open"),
            Self::BadClose => write!(f, "close of unopened descriptor"),
            Self::TableFull => write!(f, "descriptor table full"),
            Self::NoSuchFile => write!(f, "no such file"),
            Self::NotChild => write!(f, "not a waitable child"),
            Self::ForkFailed(err) => write!(f, "fork failed: {}", err),
            Self::ExecFailed(err) => write!(f, "exec failed: {}", err),
            Self::UnknownSyscall(nr) => write!(f, "unknown syscall {}", nr),
        }
    }
}

impl From<FdError> for SyscallError {
    fn from(err: FdError) -> Self {
        match err {
            FdError::Reserved | FdError::NotOpen => Self::NotOpen,
            FdError::TableFull => Self::TableFull,
            FdError::DuplicateFailed => Self::ForkFailed(ForkError::Descriptors),
        }
    }
}

impl From<ForkError> for SyscallError {
    fn from(err: ForkError) -> Self {
        Self::ForkFailed(err)
    }
}

impl From<ExecError> for SyscallError {
    fn from(err: ExecError) -> Self {
        Self::ExecFailed(err)
    }
}

impl From<WaitError> for SyscallError {
    fn from(err: WaitError) -> Self {
        match err {
            WaitError::NotChild => Self::NotChild,
        }
    }
}
