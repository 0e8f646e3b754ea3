//! Trap Entry
//!
//! The register snapshot captured when a user program enters the kernel, and
//! the two entry points the architecture glue calls with it.
//!
//! # Calling convention (x86-64 `syscall`)
//! - `rax`: call number on entry, return value on exit
//! - `rdi`, `rsi`, `rdx`, `r10`, `r8`, `r9`: arguments 1-6
//!
//! # Security Considerations
//! - Register contents are untrusted; the dispatcher only decodes them and
//!   every pointer goes through [`crate::syscall::validate`]
//! - A fault raised by user code terminates that process, never the kernel

use log::warn;

use crate::kernel::Kernel;
use crate::proc::{lifecycle, Process};
use crate::syscall::{self, validate::UserMemory};

/// Saved user register state.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    pub r15: u64,
    pub r14: u64,
    pub r13: u64,
    pub r12: u64,
    pub r11: u64,
    pub r10: u64,
    pub r9: u64,
    pub r8: u64,
    pub rsi: u64,
    pub rdi: u64,
    pub rbp: u64,
    pub rdx: u64,
    pub rcx: u64,
    pub rbx: u64,
    pub rax: u64,
    /// Instruction pointer to resume at.
    pub rip: u64,
    pub cs: u64,
    pub rflags: u64,
    /// User stack pointer.
    pub rsp: u64,
    pub ss: u64,
}

impl TrapFrame {
    /// Call number requested by the user program.
    #[inline]
    pub fn syscall_number(&self) -> u64 {
        self.rax
    }

    /// Raw argument words in canonical order.
    #[inline]
    pub fn syscall_args(&self) -> [u64; 6] {
        [self.rdi, self.rsi, self.rdx, self.r10, self.r8, self.r9]
    }

    /// Store a result in the return slot.
    #[inline]
    pub fn set_return(&mut self, value: i64) {
        self.rax = value as u64;
    }

    /// Current contents of the return slot, read as signed.
    #[inline]
    pub fn return_value(&self) -> i64 {
        self.rax as i64
    }
}

/// What the architecture glue does after a trap has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Return to user mode with the (possibly updated) frame.
    Resume,
    /// The process has terminated; schedule something else.
    Exited,
    /// The machine has been powered off.
    Halted,
}

/// Handle a `syscall` trap from `current`.
pub fn handle_syscall(
    kernel: &Kernel,
    current: &Process,
    memory: &dyn UserMemory,
    frame: &mut TrapFrame,
) -> Disposition {
    syscall::dispatch(kernel, current, memory, frame)
}

/// Handle a fault raised by user code (page fault, protection fault, ...).
///
/// The kernel terminates the process on its behalf; its parent sees
/// [`crate::proc::KILLED_STATUS`].
pub fn handle_user_fault(kernel: &Kernel, current: &Process, fault_addr: u64) -> Disposition {
    warn!(
        "[EXCEPTION] pid {} faulted at 0x{:016x}, terminating",
        current.pid(),
        fault_addr
    );
    lifecycle::terminate(kernel, current, crate::proc::KILLED_STATUS);
    Disposition::Exited
}
