//! File Descriptor Table (FDT)
//!
//! A per-process table mapping small integers to open file handles.
//!
//! # Design
//! - Fixed-size array of [`FDT_CAPACITY`] optional handles
//! - Slots 0 and 1 are reserved for standard input/output and never hold a
//!   handle
//! - An occupancy bitmap gives first-fit allocation in O(1): the lowest free
//!   index always wins, so a closed descriptor is reused before any higher
//!   never-used one
//! - Every operation that touches a handle takes the [`FsAccess`] token
//!
//! Each slot exclusively owns its handle. Opening the same path twice gives
//! two slots with independent cursors.

use alloc::boxed::Box;

use super::{File, FsAccess};

/// Number of slots in a descriptor table.
pub const FDT_CAPACITY: usize = 64;

/// Bitmap bits permanently set for the reserved slots.
const RESERVED_MASK: u64 = 0b11;

/// A descriptor number known to be inside the table bounds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(transparent)]
pub struct Fd(u32);

impl Fd {
    /// Standard input.
    pub const STDIN: Self = Self(0);

    /// Standard output.
    pub const STDOUT: Self = Self(1);

    /// First descriptor that can name a file.
    pub const FIRST_FILE: Self = Self(2);

    /// Create a descriptor from a raw syscall argument.
    ///
    /// Returns None if the value is negative or past the table end.
    #[inline]
    pub const fn new(raw: i32) -> Option<Self> {
        if raw >= 0 && (raw as usize) < FDT_CAPACITY {
            Some(Self(raw as u32))
        } else {
            None
        }
    }

    /// Slot index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Value handed back to user space.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0 as i32
    }

    /// Check whether this is one of the reserved console descriptors.
    #[inline]
    pub const fn is_reserved(self) -> bool {
        self.0 < Self::FIRST_FILE.0
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdError {
    /// The descriptor is a reserved console slot.
    Reserved,
    /// Nothing is open at the descriptor.
    NotOpen,
    /// Every slot is occupied.
    TableFull,
    /// A handle could not be duplicated.
    DuplicateFailed,
}

impl core::fmt::Display for FdError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Reserved => write!(f, "reserved descriptor"),
            Self::NotOpen => write!(f, "descriptor not open"),
            Self::TableFull => write!(f, "descriptor table full"),
            Self::DuplicateFailed => write!(f, "handle duplication failed"),
        }
    }
}

/// Per-process descriptor table.
pub struct FileTable {
    /// Handle slots; 0 and 1 stay empty forever.
    slots: [Option<Box<dyn File>>; FDT_CAPACITY],
    /// Bit `i` set when slot `i` is taken (reserved slots always set).
    used: u64,
}

impl FileTable {
    /// Create a table with only the reserved slots taken.
    pub const fn new() -> Self {
        const EMPTY: Option<Box<dyn File>> = None;
        Self {
            slots: [EMPTY; FDT_CAPACITY],
            used: RESERVED_MASK,
        }
    }

    /// Number of open file handles.
    pub fn len(&self) -> usize {
        (self.used & !RESERVED_MASK).count_ones() as usize
    }

    /// Check whether no file is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Store a handle in the lowest free slot.
    ///
    /// On a full table the handle is closed here, under the guard the
    /// caller holds, and `TableFull` is returned.
    pub fn allocate(&mut self, file: Box<dyn File>, _fs: &FsAccess<'_>) -> Result<Fd, FdError> {
        let free = !self.used;
        if free == 0 {
            drop(file);
            return Err(FdError::TableFull);
        }
        let index = free.trailing_zeros() as usize;
        self.slots[index] = Some(file);
        self.used |= 1 << index;
        Ok(Fd(index as u32))
    }

    /// Look up the handle at `fd` for a file operation.
    pub fn get_mut(
        &mut self,
        fd: Fd,
        _fs: &FsAccess<'_>,
    ) -> Result<&mut (dyn File + 'static), FdError> {
        if fd.is_reserved() {
            return Err(FdError::Reserved);
        }
        self.slots[fd.index()]
            .as_deref_mut()
            .ok_or(FdError::NotOpen)
    }

    /// Close the handle at `fd` and free its slot.
    pub fn release(&mut self, fd: Fd, _fs: &FsAccess<'_>) -> Result<(), FdError> {
        if fd.is_reserved() {
            return Err(FdError::Reserved);
        }
        let file = self.slots[fd.index()].take().ok_or(FdError::NotOpen)?;
        self.used &= !(1 << fd.index());
        drop(file);
        Ok(())
    }

    /// Close every open handle. Returns how many were closed.
    pub fn close_all(&mut self, _fs: &FsAccess<'_>) -> usize {
        let closed = self.len();
        for slot in self.slots.iter_mut() {
            slot.take();
        }
        self.used = RESERVED_MASK;
        closed
    }

    /// Build a copy of this table for a forked child.
    ///
    /// Every open slot gets an independent handle onto the same file at the
    /// same index. If any handle fails to duplicate, the partial copy is
    /// closed and `DuplicateFailed` is returned.
    pub fn duplicate(&self, fs: &FsAccess<'_>) -> Result<FileTable, FdError> {
        let mut copy = FileTable::new();
        for (index, slot) in self.slots.iter().enumerate() {
            let Some(file) = slot else { continue };
            match file.reopen() {
                Some(dup) => {
                    copy.slots[index] = Some(dup);
                    copy.used |= 1 << index;
                }
                None => {
                    copy.close_all(fs);
                    return Err(FdError::DuplicateFailed);
                }
            }
        }
        Ok(copy)
    }
}

impl Default for FileTable {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for FileTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "FileTable(open={}, used={:#018x})", self.len(), self.used)
    }
}
