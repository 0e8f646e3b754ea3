//! System Call Handler
//!
//! Decodes the trap frame, dispatches to the handler for the call number and
//! turns the handler's result into a return value or a termination.
//!
//! # Security Considerations
//! - All syscall numbers are validated against the whitelist
//! - Unknown syscalls terminate the caller
//! - Handlers validate their own arguments; this layer only decodes words

use log::{debug, trace, warn};

use super::error::FAILURE;
use super::validate::{UserAccess, UserMemory};
use super::{file, process, SyscallError};
use crate::kernel::Kernel;
use crate::proc::{lifecycle, Process};
use crate::trap::{Disposition, TrapFrame};

/// System call numbers
pub mod numbers {
    pub const SYS_HALT: u64 = 0;
    pub const SYS_EXIT: u64 = 1;
    pub const SYS_FORK: u64 = 2;
    pub const SYS_EXEC: u64 = 3;
    pub const SYS_WAIT: u64 = 4;
    pub const SYS_CREATE: u64 = 5;
    pub const SYS_REMOVE: u64 = 6;
    pub const SYS_OPEN: u64 = 7;
    pub const SYS_FILESIZE: u64 = 8;
    pub const SYS_READ: u64 = 9;
    pub const SYS_WRITE: u64 = 10;
    pub const SYS_SEEK: u64 = 11;
    pub const SYS_TELL: u64 = 12;
    pub const SYS_CLOSE: u64 = 13;
}

/// What a handler asks the dispatcher to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Store the value in the return slot and resume.
    Return(i64),
    /// Resume without touching the return slot.
    Done,
    /// The frame now holds a new program image; resume into it.
    Replaced,
    /// Terminate the caller with this status.
    Exit(i32),
    /// Power the machine off.
    Halt,
}

/// Result type for syscall handlers.
pub(super) type SysResult = Result<Action, SyscallError>;

/// Interpret an argument word as a C `int`.
#[inline]
pub(super) fn arg_int(word: u64) -> i32 {
    word as u32 as i32
}

/// Interpret an argument word as a C `unsigned`.
#[inline]
pub(super) fn arg_uint(word: u64) -> u32 {
    word as u32
}

/// Interpret an argument word as a user pointer.
#[inline]
pub(super) fn arg_ptr(word: u64) -> usize {
    word as usize
}

/// Dispatch a system call
///
/// # Arguments
/// * `kernel` - Shared kernel services
/// * `current` - The calling process
/// * `memory` - The calling process's address space
/// * `frame` - Trap frame with the call number and arguments
///
/// # Returns
/// Whether the caller resumes, has terminated, or the machine is off.
///
/// # Security
/// - Unknown syscall numbers terminate the caller
/// - Caller-fatal errors terminate the caller with status -1
pub fn dispatch(
    kernel: &Kernel,
    current: &Process,
    memory: &dyn UserMemory,
    frame: &mut TrapFrame,
) -> Disposition {
    let number = frame.syscall_number();
    let [a1, a2, a3, ..] = frame.syscall_args();
    let user = UserAccess::new(memory, kernel.config());

    trace!(
        "[SYSCALL] pid {} nr={} args=({:#x}, {:#x}, {:#x})",
        current.pid(),
        number,
        a1,
        a2,
        a3
    );

    let result = match number {
        numbers::SYS_HALT => Ok(Action::Halt),
        numbers::SYS_EXIT => Ok(Action::Exit(arg_int(a1))),
        numbers::SYS_FORK => process::sys_fork(kernel, current, &user, arg_ptr(a1), frame),
        numbers::SYS_EXEC => process::sys_exec(kernel, current, &user, arg_ptr(a1), frame),
        numbers::SYS_WAIT => process::sys_wait(kernel, current, arg_int(a1)),
        numbers::SYS_CREATE => file::sys_create(kernel, &user, arg_ptr(a1), arg_uint(a2)),
        numbers::SYS_REMOVE => file::sys_remove(kernel, &user, arg_ptr(a1)),
        numbers::SYS_OPEN => file::sys_open(kernel, current, &user, arg_ptr(a1)),
        numbers::SYS_FILESIZE => file::sys_filesize(kernel, current, arg_int(a1)),
        numbers::SYS_READ => file::sys_read(
            kernel,
            current,
            &user,
            arg_int(a1),  // fd
            arg_ptr(a2),  // buf
            arg_uint(a3), // len
        ),
        numbers::SYS_WRITE => file::sys_write(
            kernel,
            current,
            &user,
            arg_int(a1),  // fd
            arg_ptr(a2),  // buf
            arg_uint(a3), // len
        ),
        numbers::SYS_SEEK => file::sys_seek(kernel, current, arg_int(a1), arg_uint(a2)),
        numbers::SYS_TELL => file::sys_tell(kernel, current, arg_int(a1)),
        numbers::SYS_CLOSE => file::sys_close(kernel, current, arg_int(a1)),
        _ => Err(SyscallError::UnknownSyscall(number)),
    };

    match result {
        Ok(Action::Return(value)) => {
            frame.set_return(value);
            Disposition::Resume
        }
        Ok(Action::Done) | Ok(Action::Replaced) => Disposition::Resume,
        Ok(Action::Exit(status)) => {
            lifecycle::terminate(kernel, current, status);
            Disposition::Exited
        }
        Ok(Action::Halt) => {
            debug!("[SYSCALL] halt requested by pid {}", current.pid());
            kernel.host().power_off();
            Disposition::Halted
        }
        Err(err) if err.is_fatal() => {
            warn!("[SYSCALL] pid {} nr={}: {}, terminating", current.pid(), number, err);
            lifecycle::terminate(kernel, current, -1);
            Disposition::Exited
        }
        Err(err) => {
            debug!("[SYSCALL] pid {} nr={}: {}", current.pid(), number, err);
            frame.set_return(FAILURE);
            Disposition::Resume
        }
    }
}
