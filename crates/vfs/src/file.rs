//! TEAM_202: Open file nodes
//!
//! A [`FileTableNode`] is what a handle number points at. Duplicated handles
//! share one node (and so one cursor); the node's operations are closed when
//! the last handle referencing it goes away.

use alloc::sync::Arc;
use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU64, AtomicUsize, Ordering};

use linux_raw_sys::general as raw;

use crate::error::{VfsError, VfsResult};
use crate::inode::InodeRef;

/// Largest cursor a seek may set; keeps positions representable as `off_t`
pub const MAX_POSITION: u64 = i64::MAX as u64;

/// TEAM_202: Reference to an open file
pub type FileRef = Arc<FileTableNode>;

/// TEAM_202: Open file flags
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OpenFlags(u32);

impl OpenFlags {
    // Access modes (mutually exclusive)
    pub const O_RDONLY: u32 = raw::O_RDONLY;
    pub const O_WRONLY: u32 = raw::O_WRONLY;
    pub const O_RDWR: u32 = raw::O_RDWR;
    pub const O_ACCMODE: u32 = raw::O_ACCMODE;

    // File creation flags
    pub const O_CREAT: u32 = raw::O_CREAT;
    pub const O_EXCL: u32 = raw::O_EXCL;
    pub const O_TRUNC: u32 = raw::O_TRUNC;
    pub const O_DIRECTORY: u32 = raw::O_DIRECTORY;
    pub const O_NOFOLLOW: u32 = raw::O_NOFOLLOW;
    pub const O_CLOEXEC: u32 = raw::O_CLOEXEC;
    pub const O_PATH: u32 = raw::O_PATH;

    // File status flags
    pub const O_APPEND: u32 = raw::O_APPEND;
    pub const O_NONBLOCK: u32 = raw::O_NONBLOCK;

    /// TEAM_470: Allocate the handle in the kernel IO context
    pub const O_KERNEL: u32 = 0x4000_0000;

    /// Flags that set_flags may change on an open node
    pub const STATUS_MASK: u32 = Self::O_APPEND | Self::O_NONBLOCK;

    pub const fn new(flags: u32) -> Self {
        Self(flags)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn without(self, flags: u32) -> Self {
        Self(self.0 & !flags)
    }

    pub fn access_mode(&self) -> u32 {
        self.0 & Self::O_ACCMODE
    }

    pub fn is_readable(&self) -> bool {
        let mode = self.access_mode();
        mode == Self::O_RDONLY || mode == Self::O_RDWR
    }

    pub fn is_writable(&self) -> bool {
        let mode = self.access_mode();
        mode == Self::O_WRONLY || mode == Self::O_RDWR
    }

    pub fn is_create(&self) -> bool {
        self.0 & Self::O_CREAT != 0
    }

    pub fn is_exclusive(&self) -> bool {
        self.0 & Self::O_EXCL != 0
    }

    pub fn is_truncate(&self) -> bool {
        self.0 & Self::O_TRUNC != 0
    }

    pub fn is_append(&self) -> bool {
        self.0 & Self::O_APPEND != 0
    }

    pub fn is_directory(&self) -> bool {
        self.0 & Self::O_DIRECTORY != 0
    }

    pub fn is_nofollow(&self) -> bool {
        self.0 & Self::O_NOFOLLOW != 0
    }

    pub fn is_path(&self) -> bool {
        self.0 & Self::O_PATH != 0
    }

    pub fn is_kernel(&self) -> bool {
        self.0 & Self::O_KERNEL != 0
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        Self(Self::O_RDONLY)
    }
}

/// TEAM_202: Seek origin for lseek
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeekWhence {
    Set,
    Cur,
    End,
}

impl SeekWhence {
    pub fn from_raw(whence: u32) -> VfsResult<Self> {
        match whence {
            raw::SEEK_SET => Ok(Self::Set),
            raw::SEEK_CUR => Ok(Self::Cur),
            raw::SEEK_END => Ok(Self::End),
            _ => Err(VfsError::InvalidArgument),
        }
    }
}

/// TEAM_470: What kind of object a handle refers to
pub enum NodeKind {
    /// Byte stream with a cursor
    File { position: AtomicU64 },
    /// Directory with a scan cursor
    Directory { cursor: AtomicUsize },
    /// Identity only, no driver operations (O_PATH)
    Path,
}

pub struct FileTableNode {
    inode: InodeRef,
    flags: AtomicU32,
    kind: NodeKind,
}

impl FileTableNode {
    pub fn file(inode: InodeRef, flags: OpenFlags) -> Self {
        Self::with_kind(inode, flags, NodeKind::File { position: AtomicU64::new(0) })
    }

    pub fn directory(inode: InodeRef, flags: OpenFlags) -> Self {
        Self::with_kind(inode, flags, NodeKind::Directory { cursor: AtomicUsize::new(0) })
    }

    pub fn path(inode: InodeRef, flags: OpenFlags) -> Self {
        Self::with_kind(inode, flags, NodeKind::Path)
    }

    fn with_kind(inode: InodeRef, flags: OpenFlags, kind: NodeKind) -> Self {
        Self {
            inode,
            flags: AtomicU32::new(flags.without(OpenFlags::O_CREAT | OpenFlags::O_KERNEL).bits()),
            kind,
        }
    }

    pub fn inode(&self) -> &InodeRef {
        &self.inode
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn flags(&self) -> OpenFlags {
        OpenFlags::new(self.flags.load(Ordering::Relaxed))
    }

    /// TEAM_470: Replace the status flags, keeping access mode and creation flags
    pub fn set_status_flags(&self, flags: OpenFlags) {
        let status = flags.bits() & OpenFlags::STATUS_MASK;
        let _ = self
            .flags
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |old| {
                Some((old & !OpenFlags::STATUS_MASK) | status)
            });
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, NodeKind::Path)
    }

    /// Byte cursor; zero for non-file nodes
    pub fn position(&self) -> u64 {
        match &self.kind {
            NodeKind::File { position } => position.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn set_position(&self, pos: u64) {
        if let NodeKind::File { position } = &self.kind {
            position.store(pos, Ordering::Relaxed);
        }
    }

    /// Directory scan cursor; zero for non-directory nodes
    pub fn cursor(&self) -> usize {
        match &self.kind {
            NodeKind::Directory { cursor } => cursor.load(Ordering::Relaxed),
            _ => 0,
        }
    }

    pub fn set_cursor(&self, value: usize) {
        if let NodeKind::Directory { cursor } = &self.kind {
            cursor.store(value, Ordering::Relaxed);
        }
    }

    /// TEAM_202: Compute and store a new position. `size` is the current
    /// end of file, used for [`SeekWhence::End`].
    pub fn seek(&self, offset: i64, whence: SeekWhence, size: u64) -> VfsResult<u64> {
        let base = match whence {
            SeekWhence::Set => 0,
            SeekWhence::Cur => self.position(),
            SeekWhence::End => size,
        };
        let new_offset = base
            .checked_add_signed(offset)
            .filter(|&pos| pos <= MAX_POSITION)
            .ok_or(VfsError::InvalidArgument)?;
        self.set_position(new_offset);
        Ok(new_offset)
    }
}

impl Drop for FileTableNode {
    fn drop(&mut self) {
        if self.is_path() {
            return;
        }
        if let Some(ops) = self.inode.file_ops() {
            if let Err(e) = ops.close(self) {
                log::warn!("[VFS] close of {:?} failed: {}", self.inode, e);
            }
        }
    }
}

impl fmt::Debug for FileTableNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NodeKind::File { .. } => "file",
            NodeKind::Directory { .. } => "directory",
            NodeKind::Path => "path",
        };
        f.debug_struct("FileTableNode")
            .field("kind", &kind)
            .field("inode", &self.inode)
            .field("flags", &self.flags())
            .finish()
    }
}
