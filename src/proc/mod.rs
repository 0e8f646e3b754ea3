//! Processes
//!
//! The parts of a process descriptor the syscall boundary owns: identity,
//! the descriptor table, and the exit-status handoff to the parent.
//!
//! # Termination protocol
//! ```text
//!   RUNNING ──terminate(status)──▶ TERMINATING ──parent wait()──▶ REAPED
//!              status fixed            signal fired
//!              exit line printed       files closed
//! ```
//! - The exit signal is a one-shot sender held by the process itself;
//!   taking it out of its slot is what makes termination happen once
//! - The matching receiver moves into the parent's child list at fork time;
//!   `wait` removes it, so a second `wait` on the same child fails

pub mod host;
pub mod lifecycle;

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use spin::{Mutex, Once};

use crate::fs::{FileTable, FsAccess};
use crate::sync::oneshot::{self, Receiver, Sender};

pub use host::{ExecError, ForkError, ProcessHost};

/// Status reported to a parent whose child went away without recording one.
pub const KILLED_STATUS: i32 = -1;

/// A process identifier. Always positive.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(u32);

impl Pid {
    /// Interpret a syscall argument as a process id.
    ///
    /// Returns None for zero and negative values.
    #[inline]
    pub const fn from_raw(raw: i32) -> Option<Self> {
        if raw > 0 {
            Some(Self(raw as u32))
        } else {
            None
        }
    }

    /// Value handed back to user space.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0 as i32
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name a process runs under: the first word of its command line.
pub fn program_name(command_line: &str) -> &str {
    command_line.split_whitespace().next().unwrap_or("")
}

/// Hands out process ids. Ids are never reused.
#[derive(Debug)]
pub struct PidAllocator {
    next: AtomicU32,
}

impl PidAllocator {
    /// Create an allocator whose first id is 1.
    pub const fn new() -> Self {
        Self {
            next: AtomicU32::new(1),
        }
    }

    /// Take the next id.
    ///
    /// Returns None once every positive `i32` has been handed out.
    pub fn allocate(&self) -> Option<Pid> {
        self.next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= i32::MAX as u32).then(|| next + 1)
            })
            .ok()
            .map(Pid)
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A child as seen from its parent: its id and the end of its exit signal.
struct Child {
    pid: Pid,
    exit: Receiver<i32>,
}

/// Process descriptor.
pub struct Process {
    pid: Pid,
    /// Changed by a successful exec.
    name: Mutex<String>,
    parent: Option<Pid>,
    files: Mutex<FileTable>,
    /// Written once, by the process itself, while terminating.
    exit_status: Once<i32>,
    /// Present until the process terminates.
    exit_signal: Mutex<Option<Sender<i32>>>,
    /// Present until a parent adopts the process.
    exit_receiver: Mutex<Option<Receiver<i32>>>,
    children: Mutex<Vec<Child>>,
}

impl Process {
    /// Create a running process.
    pub fn new(pid: Pid, name: &str, parent: Option<Pid>, files: FileTable) -> Self {
        let (signal, receiver) = oneshot::channel();
        Self {
            pid,
            name: Mutex::new(String::from(name)),
            parent,
            files: Mutex::new(files),
            exit_status: Once::new(),
            exit_signal: Mutex::new(Some(signal)),
            exit_receiver: Mutex::new(Some(receiver)),
            children: Mutex::new(Vec::new()),
        }
    }

    /// Process id.
    #[inline]
    pub fn pid(&self) -> Pid {
        self.pid
    }

    /// Name printed in the exit line.
    pub fn name(&self) -> String {
        self.name.lock().clone()
    }

    /// Id of the process that forked this one, if any.
    #[inline]
    pub fn parent(&self) -> Option<Pid> {
        self.parent
    }

    /// Descriptor table. Lock the filesystem guard first.
    #[inline]
    pub fn files(&self) -> &Mutex<FileTable> {
        &self.files
    }

    /// Recorded exit status, once the process has started terminating.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status.get().copied()
    }

    /// Number of children not yet waited on.
    #[cfg(test)]
    pub(crate) fn child_count(&self) -> usize {
        self.children.lock().len()
    }

    /// Record `child` as a direct child of this process.
    ///
    /// Returns false if `child` already belongs to a parent.
    pub fn adopt(&self, child: &Process) -> bool {
        let Some(exit) = child.exit_receiver.lock().take() else {
            return false;
        };
        self.children.lock().push(Child {
            pid: child.pid,
            exit,
        });
        true
    }

    /// Take on the name of a newly loaded program.
    fn rename(&self, name: &str) {
        *self.name.lock() = String::from(name);
    }

    /// Remove `pid` from the child list, handing over its exit signal.
    fn take_child(&self, pid: Pid) -> Option<Receiver<i32>> {
        let mut children = self.children.lock();
        let index = children.iter().position(|child| child.pid == pid)?;
        Some(children.swap_remove(index).exit)
    }

    /// Forget every child; their statuses will never be collected.
    fn orphan_children(&self) -> usize {
        let mut children = self.children.lock();
        let count = children.len();
        children.clear();
        count
    }

    /// Take the exit signal, fixing the exit status on first call.
    ///
    /// Returns None if the process is already terminating.
    fn begin_termination(&self, status: i32) -> Option<(Sender<i32>, i32)> {
        let signal = self.exit_signal.lock().take()?;
        let status = *self.exit_status.call_once(|| status);
        Some((signal, status))
    }

    /// Close every open file. Returns how many were closed.
    fn release_files(&self, fs: &FsAccess<'_>) -> usize {
        self.files.lock().close_all(fs)
    }
}

impl fmt::Debug for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process")
            .field("pid", &self.pid)
            .field("name", &*self.name.lock())
            .field("parent", &self.parent)
            .field("exit_status", &self.exit_status())
            .finish()
    }
}
