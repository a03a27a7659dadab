//! TEAM_421: Syscall boundary
//!
//! Raw-integer entry points. Each converts its arguments, calls into the
//! [`Vfs`], and maps any [`VfsError`] to its errno. Nothing else escapes.

use alloc::vec::Vec;

use linux_raw_sys::errno::{EBADF, EINVAL, ERANGE};
use linux_raw_sys::general::{AT_FDCWD, AT_REMOVEDIR, AT_SYMLINK_NOFOLLOW, F_GETFL, F_SETFL, O_CLOEXEC};

use crate::error::VfsError;
use crate::file::{OpenFlags, SeekWhence};
use crate::io_context::Handle;
use crate::manager::Vfs;
use crate::stat::{DirEntry, Stat};
use crate::task::TaskContext;
use crate::volume::VolumeFlags;

/// TEAM_421: Ok(return value) or Err(positive errno)
pub type SyscallResult = Result<i64, u32>;

fn errno(err: VfsError) -> u32 {
    log::debug!("[SYSCALL] failed: {}", err);
    err.errno()
}

/// User numbers never address the kernel context
fn handle(fd: i32) -> Result<Handle, u32> {
    Handle::from_raw(fd).filter(|h| !h.is_kernel()).ok_or(EBADF)
}

/// AT_FDCWD means "relative to the cwd"
fn dir_handle(dirfd: i32) -> Result<Option<Handle>, u32> {
    if dirfd == AT_FDCWD {
        Ok(None)
    } else {
        handle(dirfd).map(Some)
    }
}

fn offset(offset: i64) -> Result<u64, u32> {
    u64::try_from(offset).map_err(|_| EINVAL)
}

/// TEAM_345: openat(dirfd, pathname, flags, mode)
pub fn sys_openat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, flags: u32, mode: u32) -> SyscallResult {
    let base = dir_handle(dirfd)?;
    let flags = OpenFlags::new(flags).without(OpenFlags::O_KERNEL);
    vfs.open(task, base, path, flags, mode)
        .map(|h| i64::from(h.raw()))
        .map_err(errno)
}

pub fn sys_close(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> SyscallResult {
    vfs.close(task, handle(fd)?).map(|()| 0).map_err(errno)
}

pub fn sys_read(vfs: &Vfs, task: &dyn TaskContext, fd: i32, buf: &mut [u8]) -> SyscallResult {
    vfs.read(task, handle(fd)?, buf).map(|n| n as i64).map_err(errno)
}

pub fn sys_write(vfs: &Vfs, task: &dyn TaskContext, fd: i32, buf: &[u8]) -> SyscallResult {
    vfs.write(task, handle(fd)?, buf).map(|n| n as i64).map_err(errno)
}

pub fn sys_readv(vfs: &Vfs, task: &dyn TaskContext, fd: i32, iov: &mut [&mut [u8]]) -> SyscallResult {
    vfs.readv(task, handle(fd)?, iov).map(|n| n as i64).map_err(errno)
}

pub fn sys_writev(vfs: &Vfs, task: &dyn TaskContext, fd: i32, iov: &[&[u8]]) -> SyscallResult {
    vfs.writev(task, handle(fd)?, iov).map(|n| n as i64).map_err(errno)
}

pub fn sys_pread64(vfs: &Vfs, task: &dyn TaskContext, fd: i32, buf: &mut [u8], pos: i64) -> SyscallResult {
    vfs.pread(task, handle(fd)?, offset(pos)?, buf)
        .map(|n| n as i64)
        .map_err(errno)
}

pub fn sys_pwrite64(vfs: &Vfs, task: &dyn TaskContext, fd: i32, buf: &[u8], pos: i64) -> SyscallResult {
    vfs.pwrite(task, handle(fd)?, offset(pos)?, buf)
        .map(|n| n as i64)
        .map_err(errno)
}

pub fn sys_lseek(vfs: &Vfs, task: &dyn TaskContext, fd: i32, offset: i64, whence: u32) -> SyscallResult {
    let whence = SeekWhence::from_raw(whence).map_err(errno)?;
    vfs.lseek(task, handle(fd)?, offset, whence)
        .map(|pos| pos as i64)
        .map_err(errno)
}

pub fn sys_sync(vfs: &Vfs) -> SyscallResult {
    vfs.sync().map(|()| 0).map_err(errno)
}

pub fn sys_fsync(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> SyscallResult {
    vfs.fsync(task, handle(fd)?).map(|()| 0).map_err(errno)
}

pub fn sys_ioctl(
    vfs: &Vfs,
    task: &dyn TaskContext,
    fd: i32,
    request: u32,
    input: &[u8],
    output: &mut [u8],
) -> SyscallResult {
    vfs.device_control(task, handle(fd)?, request, input, output)
        .map(|n| n as i64)
        .map_err(errno)
}

pub fn sys_dup(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> SyscallResult {
    vfs.dup(task, handle(fd)?)
        .map(|h| i64::from(h.raw()))
        .map_err(errno)
}

/// dup3(oldfd, newfd, flags). Only O_CLOEXEC is accepted and it has no
/// effect here; there is no exec in this layer.
pub fn sys_dup3(vfs: &Vfs, task: &dyn TaskContext, oldfd: i32, newfd: i32, flags: u32) -> SyscallResult {
    if oldfd == newfd || flags & !O_CLOEXEC != 0 {
        return Err(EINVAL);
    }
    vfs.dup_to(task, handle(oldfd)?, handle(newfd)?)
        .map(|h| i64::from(h.raw()))
        .map_err(errno)
}

/// fcntl F_GETFL / F_SETFL
pub fn sys_fcntl(vfs: &Vfs, task: &dyn TaskContext, fd: i32, cmd: u32, arg: u32) -> SyscallResult {
    let fd = handle(fd)?;
    match cmd {
        F_GETFL => vfs
            .get_flags(task, fd)
            .map(|f| i64::from(f.bits()))
            .map_err(errno),
        F_SETFL => vfs
            .set_flags(task, fd, OpenFlags::new(arg))
            .map(|()| 0)
            .map_err(errno),
        _ => Err(EINVAL),
    }
}

pub fn sys_readdir(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> Result<Option<DirEntry>, u32> {
    vfs.read_directory(task, handle(fd)?).map_err(errno)
}

pub fn sys_mkdirat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, mode: u32) -> SyscallResult {
    vfs.create_directory(task, dir_handle(dirfd)?, path, mode)
        .map(|()| 0)
        .map_err(errno)
}

/// unlinkat; AT_REMOVEDIR selects rmdir
pub fn sys_unlinkat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, flags: u32) -> SyscallResult {
    let base = dir_handle(dirfd)?;
    let result = if flags & AT_REMOVEDIR != 0 {
        vfs.remove_directory(task, base, path)
    } else {
        vfs.unlink(task, base, path)
    };
    result.map(|()| 0).map_err(errno)
}

pub fn sys_renameat(
    vfs: &Vfs,
    task: &dyn TaskContext,
    olddirfd: i32,
    oldpath: &str,
    newdirfd: i32,
    newpath: &str,
) -> SyscallResult {
    vfs.rename(task, dir_handle(olddirfd)?, oldpath, dir_handle(newdirfd)?, newpath)
        .map(|()| 0)
        .map_err(errno)
}

pub fn sys_symlinkat(vfs: &Vfs, task: &dyn TaskContext, target: &str, newdirfd: i32, linkpath: &str) -> SyscallResult {
    vfs.create_symlink(task, dir_handle(newdirfd)?, linkpath, target)
        .map(|()| 0)
        .map_err(errno)
}

/// readlinkat. The target is truncated to `buf` and not NUL terminated.
pub fn sys_readlinkat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, buf: &mut [u8]) -> SyscallResult {
    let target = vfs.read_link(task, dir_handle(dirfd)?, path).map_err(errno)?;
    let count = target.len().min(buf.len());
    buf[..count].copy_from_slice(&target.as_bytes()[..count]);
    Ok(count as i64)
}

pub fn sys_fstat(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> Result<Stat, u32> {
    vfs.fstat(task, handle(fd)?).map_err(errno)
}

/// fstatat; AT_SYMLINK_NOFOLLOW reports a final symlink itself
pub fn sys_fstatat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, flags: u32) -> Result<Stat, u32> {
    let base = dir_handle(dirfd)?;
    if flags & AT_SYMLINK_NOFOLLOW != 0 {
        vfs.lstat(task, base, path).map_err(errno)
    } else {
        vfs.stat(task, base, path).map_err(errno)
    }
}

pub fn sys_faccessat(vfs: &Vfs, task: &dyn TaskContext, dirfd: i32, path: &str, mode: u32) -> SyscallResult {
    vfs.access(task, dir_handle(dirfd)?, path, mode)
        .map(|()| 0)
        .map_err(errno)
}

pub fn sys_mount(
    vfs: &Vfs,
    task: &dyn TaskContext,
    device: &str,
    dir: &str,
    fs_name: &str,
    flags: u32,
    args: &str,
) -> SyscallResult {
    vfs.mount(task, device, dir, fs_name, VolumeFlags::from_bits_truncate(flags), args)
        .map(|volume| volume.id() as i64)
        .map_err(errno)
}

pub fn sys_chdir(vfs: &Vfs, task: &dyn TaskContext, path: &str) -> SyscallResult {
    vfs.chdir(task, path).map(|()| 0).map_err(errno)
}

pub fn sys_fchdir(vfs: &Vfs, task: &dyn TaskContext, fd: i32) -> SyscallResult {
    vfs.fchdir(task, handle(fd)?).map(|()| 0).map_err(errno)
}

/// getcwd. Writes a NUL-terminated path and returns its length including
/// the NUL; ERANGE if `buf` is too small.
pub fn sys_getcwd(vfs: &Vfs, task: &dyn TaskContext, buf: &mut [u8]) -> SyscallResult {
    let capacity = buf.len().saturating_sub(1);
    let path = vfs.getcwd(task, capacity).map_err(|e| match e {
        VfsError::NameTooLong => ERANGE,
        other => errno(other),
    })?;
    let mut bytes: Vec<u8> = path.into_bytes();
    bytes.push(0);
    buf[..bytes.len()].copy_from_slice(&bytes);
    Ok(bytes.len() as i64)
}
