//! TEAM_202: VFS Dispatch Layer
//!
//! The operations syscalls call into. Each one resolves names, applies the
//! cross-volume and trailing-slash policy, then hands the actual work to
//! the owning driver. Handles are taken and returned as [`Handle`] numbers.

use alloc::string::String;
use alloc::sync::Arc;

use crate::driver::FileOpsRef;
use crate::error::{VfsError, VfsResult};
use crate::file::{FileRef, FileTableNode, NodeKind, OpenFlags, SeekWhence};
use crate::inode::InodeRef;
use crate::io_context::Handle;
use crate::manager::Vfs;
use crate::mode::S_IWUGO;
use crate::path::{LookupFlags, check_entry_name, strip_trailing_slashes};
use crate::stat::{DirEntry, Stat, StatMask};
use crate::task::TaskContext;
use crate::volume::VolumeRef;

/// `access()` mode bit asking for write permission
const W_OK: u32 = 2;

/// Treat a short transfer as an I/O error
fn exact(transferred: usize, wanted: usize) -> VfsResult<()> {
    if transferred == wanted {
        Ok(())
    } else {
        Err(VfsError::IoError)
    }
}

/// Cursor after a transfer of `count` bytes at `position`
fn advance(position: u64, count: usize) -> VfsResult<u64> {
    position
        .checked_add(count as u64)
        .ok_or(VfsError::FileTooLarge)
}

impl Vfs {
    // ========================================================================
    // Handle lookup
    // ========================================================================

    /// TEAM_168: The node bound to `handle`, whatever its kind
    pub fn file_node(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<FileRef> {
        self.context_for(task, handle.is_kernel()).lookup(handle)
    }

    /// A byte-stream node and its operations
    fn stream(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<(FileRef, FileOpsRef)> {
        let node = self.file_node(task, handle)?;
        match node.kind() {
            NodeKind::File { .. } => {}
            NodeKind::Directory { .. } => return Err(VfsError::IsADirectory),
            NodeKind::Path => return Err(VfsError::BadFd),
        }
        let ops = node.inode().file_ops().cloned().ok_or(VfsError::NotImplemented)?;
        Ok((node, ops))
    }

    /// An open directory and its operations
    fn directory(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<(FileRef, FileOpsRef)> {
        let node = self.file_node(task, handle)?;
        if !node.is_directory() {
            return Err(VfsError::NotADirectory);
        }
        let ops = node.inode().file_ops().cloned().ok_or(VfsError::NotImplemented)?;
        Ok((node, ops))
    }

    /// Any node that is not path-only, plus its operations
    fn operable(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<(FileRef, FileOpsRef)> {
        let node = self.file_node(task, handle)?;
        if node.is_path() {
            return Err(VfsError::BadFd);
        }
        let ops = node.inode().file_ops().cloned().ok_or(VfsError::NotImplemented)?;
        Ok((node, ops))
    }

    /// Starting directory for a relative path: `base`, or the cwd if `None`
    fn start_inode(&self, task: &dyn TaskContext, base: Option<Handle>) -> VfsResult<Option<InodeRef>> {
        let Some(base) = base else {
            return Ok(None);
        };
        let inode = self.file_node(task, base)?.inode().clone();
        if !inode.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        Ok(Some(inode))
    }

    fn writable_volume(inode: &InodeRef) -> VfsResult<VolumeRef> {
        let volume = inode.volume()?;
        if volume.is_read_only() {
            return Err(VfsError::ReadOnlyFs);
        }
        Ok(volume)
    }

    // ========================================================================
    // Open / close
    // ========================================================================

    /// TEAM_202: Open `path` relative to `base` (or the cwd).
    ///
    /// The handle number is reserved first and released again on any error,
    /// so a failed open never leaves a number bound or taken.
    pub fn open(
        &self,
        task: &dyn TaskContext,
        base: Option<Handle>,
        path: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> VfsResult<Handle> {
        let context = self.context_for(task, flags.is_kernel());
        let reservation = context.reserve()?;

        let start = self.start_inode(task, base)?;
        let (parent, name) = self.locate_parent(task, start, path)?;
        let lookup = if flags.is_nofollow() {
            LookupFlags::CROSS_MOUNT
        } else {
            LookupFlags::FULL
        };

        let node = match self.locate_by_name(task, &parent, name, lookup) {
            Ok(_) if flags.is_create() && flags.is_exclusive() => {
                return Err(VfsError::AlreadyExists);
            }
            Ok(inode) => Self::open_node(&inode, flags)?,
            Err(VfsError::NotFound) if flags.is_create() => {
                check_entry_name(name)?;
                let volume = Self::writable_volume(&parent)?;
                parent
                    .driver()
                    .create_file(&volume, &parent, name, flags, mode)?
            }
            Err(e) => return Err(e),
        };

        let handle = context.commit(reservation, Arc::new(node))?;
        log::trace!("[VFS] open '{}' -> {}", path, handle);
        Ok(handle)
    }

    /// TEAM_470: Open an already resolved inode
    pub fn open_inode(&self, task: &dyn TaskContext, inode: &InodeRef, flags: OpenFlags) -> VfsResult<Handle> {
        let context = self.context_for(task, flags.is_kernel());
        let reservation = context.reserve()?;
        let node = Self::open_node(inode, flags)?;
        context.commit(reservation, Arc::new(node))
    }

    /// Turn a resolved inode into an open node without binding a handle
    pub(crate) fn open_node(inode: &InodeRef, flags: OpenFlags) -> VfsResult<FileTableNode> {
        if flags.is_path() {
            return Ok(FileTableNode::path(inode.clone(), flags));
        }
        if flags.is_nofollow() && inode.is_symlink() {
            return Err(VfsError::Loop);
        }

        let ops = inode.file_ops().ok_or(VfsError::NotImplemented)?;
        let volume = inode.volume()?;
        let flags = flags.without(OpenFlags::O_CREAT);
        if inode.is_dir() {
            if flags.is_writable() {
                return Err(VfsError::IsADirectory);
            }
            ops.open_directory(&volume, inode, flags)
        } else {
            if flags.is_directory() {
                return Err(VfsError::NotADirectory);
            }
            if flags.is_writable() && volume.is_read_only() {
                return Err(VfsError::ReadOnlyFs);
            }
            ops.open_file(&volume, inode, flags)
        }
    }

    /// TEAM_202: Release a handle. The node closes once no duplicate remains.
    pub fn close(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<()> {
        let context = self.context_for(task, handle.is_kernel());
        context.lookup(handle)?;
        let node = context.free(handle);
        drop(node);
        Ok(())
    }

    /// TEAM_470: New handle sharing the node (and cursor) of `handle`
    pub fn dup(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<Handle> {
        let node = self.file_node(task, handle)?;
        let context = self.context_for(task, handle.is_kernel());
        let reservation = context.reserve()?;
        context.commit(reservation, node)
    }

    /// TEAM_470: Bind the node of `handle` at `target`, closing what was there
    pub fn dup_to(&self, task: &dyn TaskContext, handle: Handle, target: Handle) -> VfsResult<Handle> {
        let node = self.file_node(task, handle)?;
        if handle == target {
            return Ok(target);
        }
        let displaced = self.context_for(task, target.is_kernel()).install(target, node)?;
        drop(displaced);
        Ok(target)
    }

    /// TEAM_470: Reopen the inode behind `handle` as an independent node.
    /// The new node starts at the same position.
    pub fn copy_fd(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<Handle> {
        let node = self.file_node(task, handle)?;
        let context = self.context_for(task, handle.is_kernel());
        let reservation = context.reserve()?;
        let copy = Self::open_node(node.inode(), node.flags().without(OpenFlags::O_TRUNC))?;
        copy.set_position(node.position());
        context.commit(reservation, Arc::new(copy))
    }

    pub fn get_flags(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<OpenFlags> {
        Ok(self.file_node(task, handle)?.flags())
    }

    /// Replace the status flags (APPEND, NONBLOCK) of an open node
    pub fn set_flags(&self, task: &dyn TaskContext, handle: Handle, flags: OpenFlags) -> VfsResult<()> {
        self.file_node(task, handle)?.set_status_flags(flags);
        Ok(())
    }

    // ========================================================================
    // Read / write / seek
    // ========================================================================

    /// TEAM_202: Scatter read at the cursor, advancing it. Short counts are returned as-is.
    pub fn readv(&self, task: &dyn TaskContext, handle: Handle, segments: &mut [&mut [u8]]) -> VfsResult<usize> {
        let (node, ops) = self.stream(task, handle)?;
        if !node.flags().is_readable() {
            return Err(VfsError::BadFd);
        }
        let position = node.position();
        let count = ops.read(&node, position, segments)?;
        node.set_position(advance(position, count)?);
        Ok(count)
    }

    /// Scatter read at `position`; the cursor is untouched
    pub fn preadv(
        &self,
        task: &dyn TaskContext,
        handle: Handle,
        position: u64,
        segments: &mut [&mut [u8]],
    ) -> VfsResult<usize> {
        let (node, ops) = self.stream(task, handle)?;
        if !node.flags().is_readable() {
            return Err(VfsError::BadFd);
        }
        ops.read(&node, position, segments)
    }

    /// TEAM_202: Gather write at the cursor (or end of file with O_APPEND)
    pub fn writev(&self, task: &dyn TaskContext, handle: Handle, segments: &[&[u8]]) -> VfsResult<usize> {
        let (node, ops) = self.stream(task, handle)?;
        if !node.flags().is_writable() {
            return Err(VfsError::BadFd);
        }
        let position = if node.flags().is_append() {
            Self::stat_inode(node.inode())?.size
        } else {
            node.position()
        };
        let count = ops.write(&node, position, segments)?;
        node.set_position(advance(position, count)?);
        Ok(count)
    }

    pub fn pwritev(
        &self,
        task: &dyn TaskContext,
        handle: Handle,
        position: u64,
        segments: &[&[u8]],
    ) -> VfsResult<usize> {
        let (node, ops) = self.stream(task, handle)?;
        if !node.flags().is_writable() {
            return Err(VfsError::BadFd);
        }
        ops.write(&node, position, segments)
    }

    pub fn read(&self, task: &dyn TaskContext, handle: Handle, buf: &mut [u8]) -> VfsResult<usize> {
        self.readv(task, handle, &mut [buf])
    }

    pub fn write(&self, task: &dyn TaskContext, handle: Handle, buf: &[u8]) -> VfsResult<usize> {
        self.writev(task, handle, &[buf])
    }

    pub fn pread(&self, task: &dyn TaskContext, handle: Handle, position: u64, buf: &mut [u8]) -> VfsResult<usize> {
        self.preadv(task, handle, position, &mut [buf])
    }

    pub fn pwrite(&self, task: &dyn TaskContext, handle: Handle, position: u64, buf: &[u8]) -> VfsResult<usize> {
        self.pwritev(task, handle, position, &[buf])
    }

    /// Fill `buf` completely or fail with `IoError`
    pub fn read_exact(&self, task: &dyn TaskContext, handle: Handle, buf: &mut [u8]) -> VfsResult<()> {
        let wanted = buf.len();
        exact(self.read(task, handle, buf)?, wanted)
    }

    pub fn write_exact(&self, task: &dyn TaskContext, handle: Handle, buf: &[u8]) -> VfsResult<()> {
        exact(self.write(task, handle, buf)?, buf.len())
    }

    pub fn pread_exact(&self, task: &dyn TaskContext, handle: Handle, position: u64, buf: &mut [u8]) -> VfsResult<()> {
        let wanted = buf.len();
        exact(self.pread(task, handle, position, buf)?, wanted)
    }

    pub fn pwrite_exact(&self, task: &dyn TaskContext, handle: Handle, position: u64, buf: &[u8]) -> VfsResult<()> {
        exact(self.pwrite(task, handle, position, buf)?, buf.len())
    }

    /// TEAM_202: Move the cursor; returns the new position
    pub fn lseek(&self, task: &dyn TaskContext, handle: Handle, offset: i64, whence: SeekWhence) -> VfsResult<u64> {
        let (node, _) = self.stream(task, handle)?;
        let size = match whence {
            SeekWhence::End => Self::stat_inode(node.inode())?.size,
            SeekWhence::Set | SeekWhence::Cur => 0,
        };
        node.seek(offset, whence, size)
    }

    pub fn fsync(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<()> {
        let (node, ops) = self.operable(task, handle)?;
        ops.sync(&node)
    }

    /// ioctl. Returns the number of bytes written to `output`.
    pub fn device_control(
        &self,
        task: &dyn TaskContext,
        handle: Handle,
        request: u32,
        input: &[u8],
        output: &mut [u8],
    ) -> VfsResult<usize> {
        let (node, ops) = self.operable(task, handle)?;
        ops.device_control(&node, request, input, output)
    }

    // ========================================================================
    // Directories
    // ========================================================================

    /// TEAM_202: Next entry of an open directory, `None` at the end
    pub fn read_directory(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<Option<DirEntry>> {
        let (node, ops) = self.directory(task, handle)?;
        ops.read_directory(&node.inode().volume()?, &node)
    }

    pub fn rewind_directory(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<()> {
        let (node, ops) = self.directory(task, handle)?;
        ops.rewind_directory(&node.inode().volume()?, &node)
    }

    pub fn create_directory(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str, mode: u32) -> VfsResult<()> {
        let (path, _) = strip_trailing_slashes(path);
        let (parent, name) = self.locate_parent(task, self.start_inode(task, base)?, path)?;
        check_entry_name(name)?;
        let volume = Self::writable_volume(&parent)?;
        parent.driver().create_directory(&volume, &parent, name, mode)
    }

    pub fn remove_directory(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str) -> VfsResult<()> {
        let (path, _) = strip_trailing_slashes(path);
        let (parent, name) = self.locate_parent(task, self.start_inode(task, base)?, path)?;
        check_entry_name(name)?;
        let volume = Self::writable_volume(&parent)?;
        parent.driver().remove_directory(&volume, &parent, name)
    }

    pub fn unlink(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str) -> VfsResult<()> {
        let (parent, name) = self.locate_parent(task, self.start_inode(task, base)?, path)?;
        check_entry_name(name)?;
        let volume = Self::writable_volume(&parent)?;
        parent.driver().unlink(&volume, &parent, name)
    }

    // ========================================================================
    // Symlinks
    // ========================================================================

    /// TEAM_202: Create a symlink at `path` pointing to `target`
    pub fn create_symlink(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str, target: &str) -> VfsResult<()> {
        if target.is_empty() {
            return Err(VfsError::NotFound);
        }
        if target.len() > self.config().symlink_len_max {
            return Err(VfsError::NameTooLong);
        }
        let (parent, name) = self.locate_parent(task, self.start_inode(task, base)?, path)?;
        check_entry_name(name)?;
        let volume = Self::writable_volume(&parent)?;
        parent.driver().create_symlink(&volume, &parent, name, target)
    }

    /// TEAM_202: Target text of the symlink at `path`
    pub fn read_link(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str) -> VfsResult<String> {
        let start = self.start_inode(task, base)?;
        let inode = self.locate_by_path(task, start, path, LookupFlags::CROSS_MOUNT)?;
        if !inode.is_symlink() {
            return Err(VfsError::InvalidArgument);
        }
        let ops = inode.file_ops().ok_or(VfsError::NotImplemented)?;
        let volume = inode.volume()?;
        if Self::stat_inode(&inode)?.size > self.config().symlink_len_max as u64 {
            return Err(VfsError::NameTooLong);
        }
        ops.read_link(&volume, &inode)
    }

    // ========================================================================
    // Rename
    // ========================================================================

    /// TEAM_202: Rename within one volume.
    ///
    /// Trailing separators are stripped and make the source a required
    /// directory. Parents on different volumes fail before any driver runs.
    pub fn rename(
        &self,
        task: &dyn TaskContext,
        old_base: Option<Handle>,
        old_path: &str,
        new_base: Option<Handle>,
        new_path: &str,
    ) -> VfsResult<()> {
        let (old_path, old_is_dir) = strip_trailing_slashes(old_path);
        let (new_path, new_is_dir) = strip_trailing_slashes(new_path);

        let (old_parent, old_name) = self.locate_parent(task, self.start_inode(task, old_base)?, old_path)?;
        let (new_parent, new_name) = self.locate_parent(task, self.start_inode(task, new_base)?, new_path)?;
        check_entry_name(old_name)?;
        check_entry_name(new_name)?;

        if old_parent.volume_id() != new_parent.volume_id() {
            return Err(VfsError::CrossDevice);
        }
        let volume = Self::writable_volume(&old_parent)?;
        old_parent.driver().rename(
            &volume,
            &old_parent,
            old_name,
            &new_parent,
            new_name,
            old_is_dir || new_is_dir,
        )
    }

    // ========================================================================
    // Attributes
    // ========================================================================

    /// TEAM_470: Driver attributes, with write bits masked on read-only volumes
    pub(crate) fn stat_inode(inode: &InodeRef) -> VfsResult<Stat> {
        let ops = inode.file_ops().ok_or(VfsError::NotImplemented)?;
        let volume = inode.volume()?;
        let mut stat = ops.read_stat(&volume, inode)?;
        if volume.is_read_only() {
            stat.mode &= !S_IWUGO;
        }
        Ok(stat)
    }

    pub fn stat(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str) -> VfsResult<Stat> {
        let start = self.start_inode(task, base)?;
        Self::stat_inode(&self.locate_by_path(task, start, path, LookupFlags::FULL)?)
    }

    /// Like [`Vfs::stat`] but reports a final symlink itself
    pub fn lstat(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str) -> VfsResult<Stat> {
        let start = self.start_inode(task, base)?;
        Self::stat_inode(&self.locate_by_path(task, start, path, LookupFlags::CROSS_MOUNT)?)
    }

    pub fn fstat(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<Stat> {
        Self::stat_inode(self.file_node(task, handle)?.inode())
    }

    /// TEAM_470: Apply the fields of `stat` selected by `mask`
    pub fn write_stat(&self, task: &dyn TaskContext, handle: Handle, stat: &Stat, mask: StatMask) -> VfsResult<()> {
        let (node, ops) = self.operable(task, handle)?;
        let volume = Self::writable_volume(node.inode())?;
        ops.write_stat(&volume, node.inode(), stat, mask)
    }

    /// Check `mode` (F_OK/R_OK/W_OK/X_OK) for `path`
    pub fn access(&self, task: &dyn TaskContext, base: Option<Handle>, path: &str, mode: u32) -> VfsResult<()> {
        let start = self.start_inode(task, base)?;
        let inode = self.locate_by_path(task, start, path, LookupFlags::FULL)?;
        if mode == 0 {
            return Ok(());
        }
        let volume = inode.volume()?;
        if mode & W_OK != 0 && volume.is_read_only() {
            return Err(VfsError::ReadOnlyFs);
        }
        let ops = inode.file_ops().ok_or(VfsError::NotImplemented)?;
        ops.check_access(&volume, &inode, mode)
    }

    // ========================================================================
    // Working directory
    // ========================================================================

    pub fn chdir(&self, task: &dyn TaskContext, path: &str) -> VfsResult<()> {
        let inode = self.locate_by_path(task, None, path, LookupFlags::FULL)?;
        if !inode.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        task.io_context().set_cwd(inode);
        Ok(())
    }

    pub fn fchdir(&self, task: &dyn TaskContext, handle: Handle) -> VfsResult<()> {
        let inode = self.file_node(task, handle)?.inode().clone();
        if !inode.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        task.io_context().set_cwd(inode);
        Ok(())
    }

    /// Absolute path of the current directory, at most `capacity` bytes
    pub fn getcwd(&self, task: &dyn TaskContext, capacity: usize) -> VfsResult<String> {
        self.directory_name(task, &task.io_context().cwd(), capacity)
    }

    /// Absolute path of the directory open at `handle`
    pub fn get_directory_path(&self, task: &dyn TaskContext, handle: Handle, capacity: usize) -> VfsResult<String> {
        let inode = self.file_node(task, handle)?.inode().clone();
        if !inode.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        self.directory_name(task, &inode, capacity)
    }
}
