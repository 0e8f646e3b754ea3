//! Process host interface
//!
//! Address spaces, kernel threads and the executable loader belong to the
//! process/thread subsystem. The boundary reaches them only through
//! [`ProcessHost`].

use alloc::sync::Arc;
use core::fmt;

use super::Process;
use crate::sync::oneshot::Sender;
use crate::trap::TrapFrame;

/// Why a fork did not produce a running child.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkError {
    /// No memory for the child's descriptor, thread or page tables.
    OutOfMemory,
    /// The parent's address space could not be duplicated.
    AddressSpace,
    /// An open file could not be duplicated.
    Descriptors,
    /// The child went away before reporting its setup outcome.
    SetupAborted,
}

impl fmt::Display for ForkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of memory"),
            Self::AddressSpace => write!(f, "address space duplication failed"),
            Self::Descriptors => write!(f, "descriptor duplication failed"),
            Self::SetupAborted => write!(f, "child setup aborted"),
        }
    }
}

/// Why an exec did not load a new image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecError {
    /// No executable at the given path.
    NotFound,
    /// The file is not a loadable executable.
    BadImage,
    /// No memory for the new image.
    OutOfMemory,
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "executable not found"),
            Self::BadImage => write!(f, "bad executable image"),
            Self::OutOfMemory => write!(f, "out of memory"),
        }
    }
}

/// Process/thread collaborator.
pub trait ProcessHost: Send + Sync {
    /// Start `child` as a copy of `parent`.
    ///
    /// `frame` is the register state the child resumes with (its return
    /// slot already holds 0). The host duplicates the address space on the
    /// child's side and reports the outcome through `setup` before the
    /// child runs any user code. An `Err` return means the child was never
    /// started and `setup` has been dropped.
    fn fork(
        &self,
        parent: &Process,
        child: Arc<Process>,
        frame: TrapFrame,
        setup: Sender<Result<(), ForkError>>,
    ) -> Result<(), ForkError>;

    /// Replace the image of `process` with the program named by
    /// `command_line`, leaving the new entry state in `frame`.
    ///
    /// On failure the old image may already be gone.
    fn exec(
        &self,
        process: &Process,
        command_line: &str,
        frame: &mut TrapFrame,
    ) -> Result<(), ExecError>;

    /// Power the machine off.
    fn power_off(&self);
}
