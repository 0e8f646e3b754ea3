//! File syscalls
//!
//! Every call that reaches the filesystem or a file handle does so while
//! holding the filesystem access guard, and takes the caller's descriptor
//! table lock only after it.

use log::debug;

use super::handler::{Action, SysResult};
use super::validate::UserAccess;
use super::SyscallError;
use crate::fs::Fd;
use crate::kernel::Kernel;
use crate::proc::Process;

/// Turn a raw descriptor argument into an in-bounds [`Fd`].
fn parse_fd(raw: i32) -> Result<Fd, SyscallError> {
    Fd::new(raw).ok_or(SyscallError::BadDescriptor)
}

pub(super) fn sys_create(
    kernel: &Kernel,
    user: &UserAccess<'_>,
    path: usize,
    initial_size: u32,
) -> SysResult {
    let path = user.read_str(path, kernel.config().max_path_len)?;
    let created = kernel.fs().lock().create(&path, u64::from(initial_size));
    Ok(Action::Return(created as i64))
}

pub(super) fn sys_remove(kernel: &Kernel, user: &UserAccess<'_>, path: usize) -> SysResult {
    let path = user.read_str(path, kernel.config().max_path_len)?;
    let removed = kernel.fs().lock().remove(&path);
    Ok(Action::Return(removed as i64))
}

pub(super) fn sys_open(
    kernel: &Kernel,
    current: &Process,
    user: &UserAccess<'_>,
    path: usize,
) -> SysResult {
    let path = user.read_str(path, kernel.config().max_path_len)?;
    let mut fs = kernel.fs().lock();
    let file = fs.open(&path).ok_or(SyscallError::NoSuchFile)?;
    let fd = current.files().lock().allocate(file, &fs)?;
    debug!("[FILE] pid {} open '{}' -> fd {}", current.pid(), path, fd.as_raw());
    Ok(Action::Return(i64::from(fd.as_raw())))
}

pub(super) fn sys_filesize(kernel: &Kernel, current: &Process, fd: i32) -> SysResult {
    let fd = parse_fd(fd)?;
    let fs = kernel.fs().lock();
    let mut files = current.files().lock();
    let length = files.get_mut(fd, &fs)?.length();
    Ok(Action::Return(length as i64))
}

/// Read from `fd` into the user buffer.
///
/// Standard input yields console bytes, which are copied into the buffer;
/// standard output cannot be read.
pub(super) fn sys_read(
    kernel: &Kernel,
    current: &Process,
    user: &UserAccess<'_>,
    fd: i32,
    buf: usize,
    len: u32,
) -> SysResult {
    let fd = parse_fd(fd)?;
    let len = len as usize;

    if fd == Fd::STDOUT {
        return Err(SyscallError::NotOpen);
    }
    if fd == Fd::STDIN {
        let console = kernel.console();
        let read = user.stream_out(buf, len, |chunk| {
            for byte in chunk.iter_mut() {
                *byte = console.get_byte();
            }
            chunk.len()
        })?;
        return Ok(Action::Return(read as i64));
    }

    let fs = kernel.fs().lock();
    let mut files = current.files().lock();
    let file = files.get_mut(fd, &fs)?;
    let read = user.stream_out(buf, len, |chunk| file.read(chunk))?;
    Ok(Action::Return(read as i64))
}

/// Write the user buffer to `fd`.
///
/// Standard output takes every byte; standard input cannot be written.
pub(super) fn sys_write(
    kernel: &Kernel,
    current: &Process,
    user: &UserAccess<'_>,
    fd: i32,
    buf: usize,
    len: u32,
) -> SysResult {
    let fd = parse_fd(fd)?;
    let len = len as usize;

    if fd == Fd::STDIN {
        return Err(SyscallError::NotOpen);
    }
    if fd == Fd::STDOUT {
        let console = kernel.console();
        let written = user.stream_in(buf, len, |chunk| {
            console.put_bytes(chunk);
            chunk.len()
        })?;
        return Ok(Action::Return(written as i64));
    }

    let fs = kernel.fs().lock();
    let mut files = current.files().lock();
    let file = files.get_mut(fd, &fs)?;
    let written = user.stream_in(buf, len, |chunk| file.write(chunk))?;
    Ok(Action::Return(written as i64))
}

/// Move the cursor of `fd`. Silently ignored if nothing is open there.
pub(super) fn sys_seek(kernel: &Kernel, current: &Process, fd: i32, position: u32) -> SysResult {
    let fd = parse_fd(fd)?;
    let fs = kernel.fs().lock();
    let mut files = current.files().lock();
    match files.get_mut(fd, &fs) {
        Ok(file) => file.seek(u64::from(position)),
        Err(err) => debug!("[FILE] pid {} seek fd {}: {}", current.pid(), fd.as_raw(), err),
    }
    Ok(Action::Done)
}

pub(super) fn sys_tell(kernel: &Kernel, current: &Process, fd: i32) -> SysResult {
    let fd = parse_fd(fd)?;
    let fs = kernel.fs().lock();
    let mut files = current.files().lock();
    let position = files.get_mut(fd, &fs)?.tell();
    Ok(Action::Return(position as i64))
}

/// Close `fd`. Closing anything that is not an open file is fatal.
pub(super) fn sys_close(kernel: &Kernel, current: &Process, fd: i32) -> SysResult {
    let fd = parse_fd(fd)?;
    let fs = kernel.fs().lock();
    current
        .files()
        .lock()
        .release(fd, &fs)
        .map_err(|_| SyscallError::BadClose)?;
    debug!("[FILE] pid {} close fd {}", current.pid(), fd.as_raw());
    Ok(Action::Done)
}
