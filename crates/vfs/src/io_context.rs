//! TEAM_168: Handle tables and IO contexts.
//!
//! One [`IoContext`] per process plus one shared kernel context. Handle
//! numbers carry [`KERNEL_HANDLE_FLAG`] when they address the kernel
//! context, so a bare integer always names exactly one table.
//!
//! Opening is split into reserve, then bind. A reservation is released on
//! drop unless committed, so a failed open never leaves a number behind.

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;

use los_utils::{Mutex, RwLock, ScopeGuard, SlotTable};

use crate::error::{VfsError, VfsResult};
use crate::file::FileRef;
use crate::inode::InodeRef;

/// Selector bit for handles in the kernel context
pub const KERNEL_HANDLE_FLAG: i32 = 0x4000_0000;

/// TEAM_470: Reference to an IO context
pub type IoContextRef = Arc<IoContext>;

/// TEAM_168: A file descriptor number
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Handle(i32);

impl Handle {
    fn new(index: usize, kernel: bool) -> Self {
        let index = index as i32;
        Self(if kernel { index | KERNEL_HANDLE_FLAG } else { index })
    }

    /// Negative numbers are never handles
    pub const fn from_raw(raw: i32) -> Option<Self> {
        if raw < 0 { None } else { Some(Self(raw)) }
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    pub const fn is_kernel(self) -> bool {
        self.0 & KERNEL_HANDLE_FLAG != 0
    }

    /// Slot within its context
    pub const fn index(self) -> usize {
        (self.0 & !KERNEL_HANDLE_FLAG) as usize
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_kernel() {
            write!(f, "k{}", self.index())
        } else {
            write!(f, "{}", self.0)
        }
    }
}

pub struct IoContext {
    kernel: bool,
    files: Mutex<SlotTable<FileRef>>,
    cwd: RwLock<InodeRef>,
}

impl IoContext {
    pub fn new(kernel: bool, cwd: InodeRef, max_handles: usize) -> Self {
        Self {
            kernel,
            files: Mutex::new(SlotTable::new(max_handles)),
            cwd: RwLock::new(cwd),
        }
    }

    pub fn is_kernel(&self) -> bool {
        self.kernel
    }

    pub fn cwd(&self) -> InodeRef {
        self.cwd.read().clone()
    }

    pub fn set_cwd(&self, inode: InodeRef) {
        *self.cwd.write() = inode;
    }

    /// TEAM_168: Reserve the lowest free number without binding anything
    pub fn allocate(&self) -> VfsResult<Handle> {
        let index = self
            .files
            .lock()
            .reserve()
            .ok_or(VfsError::TooManyOpenFiles)?;
        Ok(Handle::new(index, self.kernel))
    }

    /// Attach `file` to a number returned by [`IoContext::allocate`]
    pub fn bind(&self, handle: Handle, file: FileRef) -> VfsResult<()> {
        self.check_context(handle)?;
        self.files
            .lock()
            .fill(handle.index(), file)
            .map_err(|_| VfsError::BadFd)
    }

    /// Release a number. The bound node, if any, is returned so the caller
    /// decides where its last reference drops.
    pub fn free(&self, handle: Handle) -> Option<FileRef> {
        if self.check_context(handle).is_err() {
            return None;
        }
        self.files.lock().release(handle.index())
    }

    /// Bind `file` at a fixed number, displacing whatever was there (dup2).
    /// A number reserved by an open still in progress is `Busy`.
    pub fn install(&self, handle: Handle, file: FileRef) -> VfsResult<Option<FileRef>> {
        self.check_context(handle)?;
        let mut files = self.files.lock();
        if handle.index() >= files.limit() {
            return Err(VfsError::BadFd);
        }
        files.replace(handle.index(), file).map_err(|_| VfsError::Busy)
    }

    /// TEAM_168: Resolve a number to its node
    pub fn lookup(&self, handle: Handle) -> VfsResult<FileRef> {
        self.check_context(handle)?;
        self.files
            .lock()
            .get(handle.index())
            .cloned()
            .ok_or(VfsError::BadFd)
    }

    /// Reserve a number that is released again if the guard drops before
    /// [`IoContext::commit`].
    pub fn reserve(&self) -> VfsResult<ScopeGuard<Handle, impl FnOnce(Handle) + '_>> {
        let handle = self.allocate()?;
        Ok(ScopeGuard::new(handle, move |h| {
            let _ = self.free(h);
        }))
    }

    /// Bind the reserved number and disarm its guard
    pub fn commit(
        &self,
        reservation: ScopeGuard<Handle, impl FnOnce(Handle)>,
        file: FileRef,
    ) -> VfsResult<Handle> {
        let handle = *reservation;
        self.bind(handle, file)?;
        Ok(ScopeGuard::dismiss(reservation))
    }

    pub fn open_count(&self) -> usize {
        self.files.lock().occupied()
    }

    /// Drop every handle, e.g. on process exit
    pub fn close_all(&self) {
        let files: Vec<FileRef> = self.files.lock().drain();
        drop(files);
    }

    fn check_context(&self, handle: Handle) -> VfsResult<()> {
        if handle.is_kernel() == self.kernel {
            Ok(())
        } else {
            Err(VfsError::BadFd)
        }
    }
}
