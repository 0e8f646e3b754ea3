//! PantherOS user-process boundary
//!
//! The layer that sits between user programs and kernel services: it decodes
//! trap frames into system calls, routes them to their handlers and keeps the
//! per-process bookkeeping those handlers rely on.
//!
//! # Components
//! - File descriptor table: per-process slot table of open file handles
//! - Filesystem access guard: one lock serializing every filesystem entry point
//! - Lifecycle synchronizer: exit status handoff from child to parent
//! - Syscall dispatcher: trap frame in, return value (or termination) out
//!
//! # Collaborators
//! Address spaces, the scheduler, the executable loader and the filesystem
//! itself live elsewhere in the kernel. They are reached through the traits in
//! [`fs`], [`proc`], [`syscall::validate`] and [`drivers::console`], bundled
//! into a [`Kernel`] context that is passed explicitly to every entry point.
//!
//! # Security Features
//! - Every user pointer is validated before it is dereferenced
//! - Unknown syscalls terminate the caller
//! - Filesystem calls are serialized behind a single guard

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod drivers;
pub mod fs;
pub mod kernel;
pub mod logger;
pub mod proc;
pub mod sync;
pub mod syscall;
pub mod trap;

#[cfg(test)]
pub(crate) mod testing;

pub use config::Config;
pub use kernel::Kernel;
pub use proc::{Pid, Process};
pub use trap::{Disposition, TrapFrame};
