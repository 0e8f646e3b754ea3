//! Filesystem Access
//!
//! The filesystem itself is a collaborator; this module only defines its
//! call contract and the guard that serializes every call into it.
//!
//! # Design
//! - One [`FsGuard`] per kernel, shared by every process
//! - Holding the guard yields an [`FsAccess`] token; descriptor operations
//!   that touch file handles take the token as a parameter, so they cannot
//!   run outside the guard
//! - Lock order: guard first, then any per-process descriptor table

pub mod fdtable;

use alloc::boxed::Box;

use spin::{Mutex, MutexGuard};

pub use fdtable::{Fd, FileTable, FDT_CAPACITY};

/// An open file with a private cursor.
///
/// Dropping the handle closes it.
pub trait File: Send {
    /// Read from the cursor into `buf`, advancing the cursor.
    ///
    /// Returns the number of bytes read (0 at end of file).
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Write `buf` at the cursor, advancing the cursor.
    ///
    /// Returns the number of bytes written.
    fn write(&mut self, buf: &[u8]) -> usize;

    /// Move the cursor to `position` bytes from the start.
    fn seek(&mut self, position: u64);

    /// Current cursor position.
    fn tell(&self) -> u64;

    /// File length in bytes.
    fn length(&self) -> u64;

    /// Open an independent handle onto the same file with the same cursor.
    fn reopen(&self) -> Option<Box<dyn File>>;
}

/// Filesystem collaborator.
///
/// Not assumed to be internally thread-safe; only ever called through
/// [`FsGuard`].
pub trait FileSystem: Send {
    /// Create a file of `initial_size` zero bytes.
    fn create(&mut self, path: &str, initial_size: u64) -> bool;

    /// Remove a file. Open handles stay usable.
    fn remove(&mut self, path: &str) -> bool;

    /// Open a file, yielding a fresh handle with its cursor at 0.
    fn open(&mut self, path: &str) -> Option<Box<dyn File>>;
}

/// The filesystem access guard.
pub struct FsGuard {
    fs: Mutex<Box<dyn FileSystem>>,
}

/// Proof that the filesystem access guard is held.
pub type FsAccess<'a> = MutexGuard<'a, Box<dyn FileSystem>>;

impl FsGuard {
    /// Put a filesystem behind the guard.
    pub fn new(fs: Box<dyn FileSystem>) -> Self {
        Self { fs: Mutex::new(fs) }
    }

    /// Acquire the guard, blocking until no other filesystem operation runs.
    pub fn lock(&self) -> FsAccess<'_> {
        self.fs.lock()
    }
}

impl core::fmt::Debug for FsGuard {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FsGuard(locked={})", self.fs.is_locked())
    }
}
