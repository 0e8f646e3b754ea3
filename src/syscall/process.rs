//! Process syscalls

use super::handler::{Action, SysResult};
use super::validate::UserAccess;
use super::SyscallError;
use crate::kernel::Kernel;
use crate::proc::{lifecycle, Pid, Process};
use crate::trap::TrapFrame;

pub(super) fn sys_fork(
    kernel: &Kernel,
    current: &Process,
    user: &UserAccess<'_>,
    name: usize,
    frame: &TrapFrame,
) -> SysResult {
    let name = user.read_str(name, kernel.config().max_command_line)?;
    let pid = lifecycle::fork(kernel, current, &name, frame)?;
    Ok(Action::Return(i64::from(pid.as_raw())))
}

/// The command line is copied into kernel memory before the loader may
/// tear down the image it lives in.
pub(super) fn sys_exec(
    kernel: &Kernel,
    current: &Process,
    user: &UserAccess<'_>,
    command_line: usize,
    frame: &mut TrapFrame,
) -> SysResult {
    let command_line = user.read_str(command_line, kernel.config().max_command_line)?;
    lifecycle::exec(kernel, current, &command_line, frame)?;
    Ok(Action::Replaced)
}

pub(super) fn sys_wait(kernel: &Kernel, current: &Process, pid: i32) -> SysResult {
    let pid = Pid::from_raw(pid).ok_or(SyscallError::NotChild)?;
    let status = lifecycle::wait(kernel, current, pid)?;
    Ok(Action::Return(i64::from(status)))
}
