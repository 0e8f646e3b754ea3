//! Kernel context
//!
//! Everything a syscall handler needs besides the calling process, bundled so
//! it can be passed explicitly instead of living in globals.

use alloc::boxed::Box;
use alloc::sync::Arc;

use crate::config::Config;
use crate::drivers::console::Console;
use crate::fs::{FileSystem, FileTable, FsGuard};
use crate::proc::{self, PidAllocator, Process, ProcessHost};
use crate::sync::Scheduler;

/// Shared kernel services for the syscall boundary.
pub struct Kernel {
    fs: FsGuard,
    host: Arc<dyn ProcessHost>,
    scheduler: Arc<dyn Scheduler>,
    console: Arc<dyn Console>,
    pids: PidAllocator,
    config: Config,
}

impl Kernel {
    /// Assemble a kernel context from its collaborators.
    pub fn new(
        fs: Box<dyn FileSystem>,
        host: Arc<dyn ProcessHost>,
        scheduler: Arc<dyn Scheduler>,
        console: Arc<dyn Console>,
        config: Config,
    ) -> Self {
        Self {
            fs: FsGuard::new(fs),
            host,
            scheduler,
            console,
            pids: PidAllocator::new(),
            config,
        }
    }

    /// The filesystem access guard.
    #[inline]
    pub fn fs(&self) -> &FsGuard {
        &self.fs
    }

    /// The process/thread collaborator.
    #[inline]
    pub fn host(&self) -> &dyn ProcessHost {
        &*self.host
    }

    /// Scheduler hooks used by blocking waits.
    #[inline]
    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    /// The console behind descriptors 0 and 1.
    #[inline]
    pub fn console(&self) -> &dyn Console {
        &*self.console
    }

    /// Process id allocator.
    #[inline]
    pub fn pids(&self) -> &PidAllocator {
        &self.pids
    }

    /// Boundary configuration.
    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Create the first user process, named after the first word of its
    /// command line. It has no parent and no open files.
    ///
    /// Returns None once process ids are exhausted.
    pub fn spawn_initial(&self, command_line: &str) -> Option<Arc<Process>> {
        let name = proc::program_name(command_line);
        let process = Process::new(self.pids.allocate()?, name, None, FileTable::new());
        log::debug!("[PROCESS] pid {} created as '{}'", process.pid(), name);
        Some(Arc::new(process))
    }
}

impl core::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Kernel")
            .field("fs", &self.fs)
            .field("config", &self.config)
            .finish()
    }
}
