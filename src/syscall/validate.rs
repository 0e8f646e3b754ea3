//! System Call Input Validation
//!
//! Every pointer a user program hands the kernel passes through here before
//! any byte behind it is touched.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: deny by default
//! - Prevent common vulnerabilities:
//!   - Buffer overflows (bounds checking)
//!   - TOCTOU races (copy to kernel memory, then use the copy)
//!   - Null pointer dereference (explicit checks)
//!   - Kernel memory disclosure (region check before the mapping check)
//!
//! Whether a page is actually mapped, and with which permissions, is known
//! only to the address-space owner. That is the [`UserMemory`] collaborator;
//! this module layers the static region checks on top of it.

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use bitflags::bitflags;

use super::SyscallError;
use crate::config::{Config, UserRegion};

bitflags! {
    /// Access the kernel needs to a user range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Access: u8 {
        /// The kernel reads the range (write buffers, paths).
        const READ = 1 << 0;
        /// The kernel fills the range (read buffers).
        const WRITE = 1 << 1;
    }
}

/// Memory-access-checking collaborator for one address space.
pub trait UserMemory {
    /// Check that `[addr, addr + len)` is mapped with `access`.
    fn check(&self, addr: usize, len: usize, access: Access) -> bool;

    /// Copy `dst.len()` bytes from user address `addr`.
    fn copy_in(&self, addr: usize, dst: &mut [u8]) -> bool;

    /// Copy `src` to user address `addr`.
    fn copy_out(&self, addr: usize, src: &[u8]) -> bool;
}

/// Bytes moved per step of a bulk transfer.
pub const CHUNK_SIZE: usize = 4096;

/// Validated access to the calling process's memory.
pub struct UserAccess<'a> {
    memory: &'a dyn UserMemory,
    region: UserRegion,
}

impl<'a> UserAccess<'a> {
    /// Bind a process's memory to the configured user region.
    pub fn new(memory: &'a dyn UserMemory, config: &Config) -> Self {
        Self {
            memory,
            region: config.user_region,
        }
    }

    /// Validate a user range for `access`.
    ///
    /// # Security Checks
    /// 1. Zero-length ranges are always valid and never touched
    /// 2. Pointer is not null
    /// 3. Range lies within user space without overflowing
    /// 4. The address-space owner confirms the mapping and permissions
    pub fn validate(&self, addr: usize, len: usize, access: Access) -> Result<(), SyscallError> {
        if len == 0 {
            return Ok(());
        }
        if addr == 0 {
            return Err(SyscallError::BadAddress);
        }
        if !self.region.contains(addr, len) {
            return Err(SyscallError::BadAddress);
        }
        if !self.memory.check(addr, len, access) {
            return Err(SyscallError::BadAddress);
        }
        Ok(())
    }

    /// Copy `dst.len()` bytes in from `addr`.
    pub fn read_into(&self, addr: usize, dst: &mut [u8]) -> Result<(), SyscallError> {
        self.validate(addr, dst.len(), Access::READ)?;
        if dst.is_empty() || self.memory.copy_in(addr, dst) {
            Ok(())
        } else {
            Err(SyscallError::BadAddress)
        }
    }

    /// Copy `src` out to `addr`.
    pub fn write_from(&self, addr: usize, src: &[u8]) -> Result<(), SyscallError> {
        self.validate(addr, src.len(), Access::WRITE)?;
        if src.is_empty() || self.memory.copy_out(addr, src) {
            Ok(())
        } else {
            Err(SyscallError::BadAddress)
        }
    }

    /// Copy a NUL-terminated string in from `addr`.
    ///
    /// The string may hold at most `max_len` bytes before its terminator
    /// and must be UTF-8; anything else is a bad address.
    pub fn read_str(&self, addr: usize, max_len: usize) -> Result<String, SyscallError> {
        let mut bytes = Vec::new();
        let mut byte = [0u8; 1];
        for offset in 0..=max_len {
            let at = addr.checked_add(offset).ok_or(SyscallError::BadAddress)?;
            self.read_into(at, &mut byte)?;
            if byte[0] == 0 {
                return String::from_utf8(bytes).map_err(|_| SyscallError::BadAddress);
            }
            bytes.push(byte[0]);
        }
        Err(SyscallError::BadAddress)
    }

    /// Stream `len` bytes from user memory into `sink`, one chunk at a time.
    ///
    /// The whole range is validated up front. `sink` returns how many bytes
    /// it consumed; a short count ends the transfer. Returns the total.
    pub fn stream_in(
        &self,
        addr: usize,
        len: usize,
        mut sink: impl FnMut(&[u8]) -> usize,
    ) -> Result<usize, SyscallError> {
        self.validate(addr, len, Access::READ)?;
        let mut chunk = vec![0u8; len.min(CHUNK_SIZE)];
        let mut done = 0;
        while done < len {
            let step = (len - done).min(CHUNK_SIZE);
            self.read_into(addr + done, &mut chunk[..step])?;
            let taken = sink(&chunk[..step]);
            done += taken;
            if taken < step {
                break;
            }
        }
        Ok(done)
    }

    /// Stream up to `len` bytes from `source` into user memory.
    ///
    /// The whole range is validated up front. `source` fills the chunk it
    /// is given and returns how many bytes it produced; a short count ends
    /// the transfer. Returns the total.
    pub fn stream_out(
        &self,
        addr: usize,
        len: usize,
        mut source: impl FnMut(&mut [u8]) -> usize,
    ) -> Result<usize, SyscallError> {
        self.validate(addr, len, Access::WRITE)?;
        let mut chunk = vec![0u8; len.min(CHUNK_SIZE)];
        let mut done = 0;
        while done < len {
            let step = (len - done).min(CHUNK_SIZE);
            let produced = source(&mut chunk[..step]);
            self.write_from(addr + done, &chunk[..produced])?;
            done += produced;
            if produced < step {
                break;
            }
        }
        Ok(done)
    }
}
