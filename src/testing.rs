//! Test doubles for the boundary's collaborators.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, Thread};
use std::time::Duration;

use spin::Mutex;

use crate::config::Config;
use crate::drivers::console::Console;
use crate::fs::{File, FileSystem};
use crate::kernel::Kernel;
use crate::proc::{ExecError, ForkError, Pid, Process, ProcessHost};
use crate::sync::oneshot::Sender;
use crate::sync::Scheduler;
use crate::syscall::validate::{Access, UserMemory};
use crate::trap::TrapFrame;

/// Entry point the fake loader puts in the frame.
pub const ENTRY_POINT: u64 = 0x40_0000;

/// Stack top the fake loader puts in the frame.
pub const STACK_TOP: u64 = 0x4747_4000;

/// Detects two file operations running at the same time.
#[derive(Default)]
pub struct OverlapDetector {
    busy: AtomicBool,
    overlaps: AtomicUsize,
}

impl OverlapDetector {
    fn enter(&self) {
        if self.busy.swap(true, Ordering::AcqRel) {
            self.overlaps.fetch_add(1, Ordering::Relaxed);
        }
        thread::yield_now();
    }

    fn exit(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::Relaxed)
    }
}

type Contents = Arc<Mutex<Vec<u8>>>;

/// In-memory filesystem. Files grow on write past their end.
#[derive(Default)]
pub struct MemFs {
    files: BTreeMap<String, Contents>,
    detector: Option<Arc<OverlapDetector>>,
    reopen_fails: bool,
}

impl MemFs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_detector(detector: Arc<OverlapDetector>) -> Self {
        Self {
            detector: Some(detector),
            ..Self::default()
        }
    }

    /// Handles from this filesystem refuse to be duplicated.
    pub fn without_reopen(mut self) -> Self {
        self.reopen_fails = true;
        self
    }

    pub fn insert(&mut self, path: &str, data: &[u8]) {
        self.files
            .insert(path.to_string(), Arc::new(Mutex::new(data.to_vec())));
    }
}

impl FileSystem for MemFs {
    fn create(&mut self, path: &str, initial_size: u64) -> bool {
        if path.is_empty() || self.files.contains_key(path) {
            return false;
        }
        self.files.insert(
            path.to_string(),
            Arc::new(Mutex::new(vec![0; initial_size as usize])),
        );
        true
    }

    fn remove(&mut self, path: &str) -> bool {
        self.files.remove(path).is_some()
    }

    fn open(&mut self, path: &str) -> Option<Box<dyn File>> {
        let data = self.files.get(path)?;
        Some(Box::new(MemFile {
            data: Arc::clone(data),
            pos: 0,
            detector: self.detector.clone(),
            reopen_fails: self.reopen_fails,
        }))
    }
}

struct MemFile {
    data: Contents,
    pos: u64,
    detector: Option<Arc<OverlapDetector>>,
    reopen_fails: bool,
}

impl MemFile {
    fn guarded<R>(&mut self, op: impl FnOnce(&mut Self) -> R) -> R {
        let detector = self.detector.clone();
        if let Some(detector) = &detector {
            detector.enter();
        }
        let result = op(self);
        if let Some(detector) = &detector {
            detector.exit();
        }
        result
    }
}

impl File for MemFile {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        self.guarded(|file| {
            let data = file.data.lock();
            let start = (file.pos as usize).min(data.len());
            let n = buf.len().min(data.len() - start);
            buf[..n].copy_from_slice(&data[start..start + n]);
            drop(data);
            file.pos += n as u64;
            n
        })
    }

    fn write(&mut self, buf: &[u8]) -> usize {
        self.guarded(|file| {
            let mut data = file.data.lock();
            let start = file.pos as usize;
            if data.len() < start + buf.len() {
                data.resize(start + buf.len(), 0);
            }
            data[start..start + buf.len()].copy_from_slice(buf);
            drop(data);
            file.pos += buf.len() as u64;
            buf.len()
        })
    }

    fn seek(&mut self, position: u64) {
        self.pos = position;
    }

    fn tell(&self) -> u64 {
        self.pos
    }

    fn length(&self) -> u64 {
        self.data.lock().len() as u64
    }

    fn reopen(&self) -> Option<Box<dyn File>> {
        if self.reopen_fails {
            return None;
        }
        Some(Box::new(MemFile {
            data: Arc::clone(&self.data),
            pos: self.pos,
            detector: self.detector.clone(),
            reopen_fails: false,
        }))
    }
}

/// Flat user memory starting at [`FakeMemory::BASE`], with a bump allocator.
pub struct FakeMemory {
    bytes: Mutex<Vec<u8>>,
    top: AtomicUsize,
    read_only: Mutex<Vec<(usize, usize)>>,
}

impl FakeMemory {
    pub const BASE: usize = 0x1000_0000;
    pub const SIZE: usize = 64 * 1024;

    pub fn new() -> Self {
        Self {
            bytes: Mutex::new(vec![0; Self::SIZE]),
            top: AtomicUsize::new(Self::BASE),
            read_only: Mutex::new(Vec::new()),
        }
    }

    /// One past the last mapped address.
    pub fn end(&self) -> usize {
        Self::BASE + Self::SIZE
    }

    pub fn alloc_zeroed(&self, len: usize) -> usize {
        let addr = self.top.fetch_add(len.max(1), Ordering::Relaxed);
        assert!(addr + len <= self.end(), "fake memory exhausted");
        addr
    }

    pub fn alloc_bytes(&self, data: &[u8]) -> usize {
        let addr = self.alloc_zeroed(data.len());
        self.write(addr, data);
        addr
    }

    pub fn alloc_str(&self, s: &str) -> usize {
        let mut data = s.as_bytes().to_vec();
        data.push(0);
        self.alloc_bytes(&data)
    }

    pub fn alloc_read_only(&self, data: &[u8]) -> usize {
        let addr = self.alloc_bytes(data);
        self.read_only.lock().push((addr, addr + data.len()));
        addr
    }

    pub fn write(&self, addr: usize, data: &[u8]) {
        let offset = addr - Self::BASE;
        self.bytes.lock()[offset..offset + data.len()].copy_from_slice(data);
    }

    pub fn read(&self, addr: usize, len: usize) -> Vec<u8> {
        let offset = addr - Self::BASE;
        self.bytes.lock()[offset..offset + len].to_vec()
    }

    fn mapped(&self, addr: usize, len: usize) -> bool {
        addr >= Self::BASE && addr.checked_add(len).is_some_and(|end| end <= self.end())
    }

    fn writable(&self, addr: usize, len: usize) -> bool {
        let end = addr + len;
        !self
            .read_only
            .lock()
            .iter()
            .any(|&(lo, hi)| addr < hi && lo < end)
    }
}

impl UserMemory for FakeMemory {
    fn check(&self, addr: usize, len: usize, access: Access) -> bool {
        if !self.mapped(addr, len) {
            return false;
        }
        !access.contains(Access::WRITE) || self.writable(addr, len)
    }

    fn copy_in(&self, addr: usize, dst: &mut [u8]) -> bool {
        if !self.mapped(addr, dst.len()) {
            return false;
        }
        dst.copy_from_slice(&self.read(addr, dst.len()));
        true
    }

    fn copy_out(&self, addr: usize, src: &[u8]) -> bool {
        if !self.mapped(addr, src.len()) {
            return false;
        }
        self.write(addr, src);
        true
    }
}

/// Console capturing output and replaying queued input.
#[derive(Default)]
pub struct FakeConsole {
    out: Mutex<Vec<u8>>,
    input: Mutex<VecDeque<u8>>,
}

impl FakeConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_input(&self, bytes: &[u8]) {
        self.input.lock().extend(bytes.iter().copied());
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.lock()).into_owned()
    }
}

impl Console for FakeConsole {
    fn put_bytes(&self, bytes: &[u8]) {
        self.out.lock().extend_from_slice(bytes);
    }

    fn get_byte(&self) -> u8 {
        self.input.lock().pop_front().unwrap_or(0)
    }
}

static NEXT_THREAD_ID: AtomicUsize = AtomicUsize::new(1);

thread_local! {
    static THREAD_ID: usize = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Scheduler over std threads: `block` parks, `wake` unparks.
#[derive(Default)]
pub struct ThreadScheduler {
    threads: Mutex<BTreeMap<usize, Thread>>,
    blocks: AtomicUsize,
}

impl ThreadScheduler {
    /// How many times any thread has parked.
    pub fn blocks(&self) -> usize {
        self.blocks.load(Ordering::Relaxed)
    }
}

impl Scheduler for ThreadScheduler {
    fn current(&self) -> usize {
        let id = THREAD_ID.with(|id| *id);
        self.threads.lock().insert(id, thread::current());
        id
    }

    fn block(&self) {
        self.blocks.fetch_add(1, Ordering::Relaxed);
        thread::park();
    }

    fn wake(&self, id: usize) {
        if let Some(thread) = self.threads.lock().get(&id) {
            thread.unpark();
        }
    }
}

/// Process host that reports child setup from a separate thread.
#[derive(Default)]
pub struct ThreadHost {
    children: Mutex<Vec<(Arc<Process>, TrapFrame)>>,
    programs: Mutex<Vec<String>>,
    fail_setup: AtomicBool,
    powered_off: AtomicBool,
}

impl ThreadHost {
    pub fn fail_setup(&self, fail: bool) {
        self.fail_setup.store(fail, Ordering::Relaxed);
    }

    /// Make `name` loadable by exec.
    pub fn install(&self, name: &str) {
        self.programs.lock().push(name.to_string());
    }

    pub fn child(&self, pid: Pid) -> Option<Arc<Process>> {
        self.children
            .lock()
            .iter()
            .find(|(child, _)| child.pid() == pid)
            .map(|(child, _)| Arc::clone(child))
    }

    pub fn child_frame(&self, pid: Pid) -> Option<TrapFrame> {
        self.children
            .lock()
            .iter()
            .find(|(child, _)| child.pid() == pid)
            .map(|(_, frame)| *frame)
    }

    pub fn powered_off(&self) -> bool {
        self.powered_off.load(Ordering::Relaxed)
    }
}

impl ProcessHost for ThreadHost {
    fn fork(
        &self,
        _parent: &Process,
        child: Arc<Process>,
        frame: TrapFrame,
        setup: Sender<Result<(), ForkError>>,
    ) -> Result<(), ForkError> {
        let fail = self.fail_setup.load(Ordering::Relaxed);
        if !fail {
            self.children.lock().push((child, frame));
        }
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            setup.send(if fail { Err(ForkError::AddressSpace) } else { Ok(()) });
        });
        Ok(())
    }

    fn exec(
        &self,
        _process: &Process,
        command_line: &str,
        frame: &mut TrapFrame,
    ) -> Result<(), ExecError> {
        let program = command_line.split_whitespace().next().unwrap_or("");
        if !self.programs.lock().iter().any(|p| p == program) {
            return Err(ExecError::NotFound);
        }
        *frame = TrapFrame {
            rip: ENTRY_POINT,
            rsp: STACK_TOP,
            ..TrapFrame::default()
        };
        Ok(())
    }

    fn power_off(&self) {
        self.powered_off.store(true, Ordering::Relaxed);
    }
}

/// A kernel over `fs` with a fake console, thread host and thread scheduler.
pub fn kernel(fs: MemFs) -> (Kernel, Arc<FakeConsole>, Arc<ThreadHost>) {
    let console = Arc::new(FakeConsole::new());
    let host = Arc::new(ThreadHost::default());
    let kernel = Kernel::new(
        Box::new(fs),
        Arc::clone(&host) as Arc<dyn ProcessHost>,
        Arc::new(ThreadScheduler::default()),
        Arc::clone(&console) as Arc<dyn Console>,
        Config::default(),
    );
    (kernel, console, host)
}

