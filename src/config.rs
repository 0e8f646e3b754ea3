//! Boundary Configuration
//!
//! Tunables for the syscall layer. Defaults describe the standard x86-64
//! user address space layout used by the loader.

/// Start of user-accessible memory (first mappable user page).
pub const USER_START: usize = 0x0040_0000;

/// End of user-accessible memory (exclusive, start of the kernel window).
pub const USER_END: usize = 0x0000_8004_0000_0000;

/// Longest path accepted by `create`, `remove` and `open`, excluding the NUL.
pub const MAX_PATH_LEN: usize = 511;

/// Longest command line accepted by `exec`, and longest `fork` name.
pub const MAX_COMMAND_LINE: usize = 4095;

/// A half-open range of virtual addresses user pointers must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRegion {
    /// First valid address.
    pub start: usize,
    /// One past the last valid address.
    pub end: usize,
}

impl UserRegion {
    /// Create a region covering `[start, end)`.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Check whether `[addr, addr + len)` lies entirely inside the region.
    ///
    /// Returns false when the range wraps around the address space.
    pub fn contains(&self, addr: usize, len: usize) -> bool {
        if addr < self.start || addr >= self.end {
            return false;
        }
        match addr.checked_add(len) {
            Some(end) => end <= self.end,
            None => false,
        }
    }
}

impl Default for UserRegion {
    fn default() -> Self {
        Self::new(USER_START, USER_END)
    }
}

/// Configuration held by the [`Kernel`](crate::Kernel) context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Where user pointers may point.
    pub user_region: UserRegion,
    /// Maximum path length in bytes.
    pub max_path_len: usize,
    /// Maximum command line / process name length in bytes.
    pub max_command_line: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_region: UserRegion::default(),
            max_path_len: MAX_PATH_LEN,
            max_command_line: MAX_COMMAND_LINE,
        }
    }
}
