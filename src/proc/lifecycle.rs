//! Process Lifecycle Synchronizer
//!
//! Termination, fork, exec and wait: the operations that move a process
//! through its states and hand results between parent and child.
//!
//! # Ordering
//! A terminating process fixes its status, prints the exit line, closes its
//! files and only then fires its exit signal, so a parent woken by `wait`
//! always sees the final status.

use alloc::sync::Arc;
use core::fmt;

use log::{debug, warn};

use super::{program_name, ExecError, ForkError, Pid, Process, KILLED_STATUS};
use crate::kernel::Kernel;
use crate::sync::oneshot;
use crate::trap::TrapFrame;

/// Why a wait returned without a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    /// The id is not a direct child, or was already waited on.
    NotChild,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotChild => write!(f, "not a child awaiting collection"),
        }
    }
}

/// Terminate `process` with `status`.
///
/// Only the first call has any effect; later calls (a fault during exit, a
/// second exit path) return without printing or signaling again. Returns
/// the status that was recorded.
pub fn terminate(kernel: &Kernel, process: &Process, status: i32) -> i32 {
    let Some((signal, status)) = process.begin_termination(status) else {
        return process.exit_status().unwrap_or(status);
    };

    crate::cprintln!(kernel.console(), "{}: exit({})", process.name(), status);

    let closed = {
        let fs = kernel.fs().lock();
        process.release_files(&fs)
    };
    let orphaned = process.orphan_children();
    debug!(
        "[PROCESS] pid {} terminating: status={} closed={} orphaned={}",
        process.pid(),
        status,
        closed,
        orphaned
    );

    signal.send(status);
    status
}

/// Fork `parent` into a new child named `name`.
///
/// Parks until the host reports whether the child's setup succeeded. The
/// child only becomes waitable once it has.
pub fn fork(
    kernel: &Kernel,
    parent: &Process,
    name: &str,
    frame: &TrapFrame,
) -> Result<Pid, ForkError> {
    let pid = kernel.pids().allocate().ok_or(ForkError::OutOfMemory)?;
    let files = {
        let fs = kernel.fs().lock();
        let files = parent.files().lock().duplicate(&fs);
        files.map_err(|_| ForkError::Descriptors)?
    };

    let child = Arc::new(Process::new(pid, name, Some(parent.pid()), files));

    let mut child_frame = *frame;
    child_frame.set_return(0);

    let (setup, outcome) = oneshot::channel();
    let started = kernel
        .host()
        .fork(parent, Arc::clone(&child), child_frame, setup)
        .and_then(|()| {
            outcome
                .recv(kernel.scheduler())
                .unwrap_or(Err(ForkError::SetupAborted))
        });

    if let Err(err) = started {
        let fs = kernel.fs().lock();
        child.release_files(&fs);
        return Err(err);
    }

    parent.adopt(&child);
    debug!("[PROCESS] pid {} forked '{}' as pid {}", parent.pid(), name, pid);
    Ok(pid)
}

/// Replace the image of `process` with `command_line`.
///
/// Descriptors survive. On success `frame` holds the new program's entry
/// state and the process takes the program's name; on failure the caller
/// must terminate the process.
pub fn exec(
    kernel: &Kernel,
    process: &Process,
    command_line: &str,
    frame: &mut TrapFrame,
) -> Result<(), ExecError> {
    match kernel.host().exec(process, command_line, frame) {
        Ok(()) => {
            process.rename(program_name(command_line));
            debug!("[PROCESS] pid {} exec '{}'", process.pid(), command_line);
            Ok(())
        }
        Err(err) => {
            warn!(
                "[PROCESS] pid {} exec '{}' failed: {}",
                process.pid(),
                command_line,
                err
            );
            Err(err)
        }
    }
}

/// Wait for the direct child `pid` of `parent` to terminate.
///
/// The caller is parked through the kernel's scheduler until the child's
/// exit signal fires. Fails at once, without blocking, if `pid` is not a
/// direct child or has already been waited on. A child that disappeared
/// without recording a status reports [`KILLED_STATUS`].
pub fn wait(kernel: &Kernel, parent: &Process, pid: Pid) -> Result<i32, WaitError> {
    let exit = parent.take_child(pid).ok_or(WaitError::NotChild)?;
    let status = exit.recv(kernel.scheduler()).unwrap_or(KILLED_STATUS);
    debug!("[PROCESS] pid {} reaped pid {}: {}", parent.pid(), pid, status);
    Ok(status)
}
