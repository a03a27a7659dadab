//! TEAM_202: Filesystem driver traits
//!
//! [`FilesystemDriver`] covers naming: mounting, lookup and directory
//! mutation. [`FileOps`] covers what can be done with a node once it has
//! been resolved. Defaults return `NotImplemented` so a driver only writes
//! what it supports.
//!
//! Drivers must return the same `Arc<Inode>` for a node every time it is
//! looked up while any reference to it is alive. Mount points are recorded
//! on that object.

use alloc::string::String;
use alloc::sync::Arc;

use crate::error::{VfsError, VfsResult};
use crate::file::{FileTableNode, OpenFlags};
use crate::inode::InodeRef;
use crate::stat::{DirEntry, Stat, StatMask};
use crate::volume::{VolumeFlags, VolumeId, VolumeRef};

pub type DriverRef = Arc<dyn FilesystemDriver>;
pub type FileOpsRef = Arc<dyn FileOps>;

pub trait FilesystemDriver: Send + Sync {
    /// Name the driver is registered under
    fn name(&self) -> &str;

    /// Create a volume with the given id. The root inode must carry it.
    fn mount(
        self: Arc<Self>,
        volume_id: VolumeId,
        device: &str,
        flags: VolumeFlags,
        args: &str,
    ) -> VfsResult<VolumeRef>;

    /// Look up `name` in the directory `parent`. "." and ".." are passed
    /// through; ".." of the volume root never reaches the driver.
    fn locate_inode(&self, volume: &VolumeRef, parent: &InodeRef, name: &str)
    -> VfsResult<InodeRef>;

    /// Create a regular file and open it with `flags`
    fn create_file(
        &self,
        _volume: &VolumeRef,
        _parent: &InodeRef,
        _name: &str,
        _flags: OpenFlags,
        _mode: u32,
    ) -> VfsResult<FileTableNode> {
        Err(VfsError::NotImplemented)
    }

    fn create_directory(
        &self,
        _volume: &VolumeRef,
        _parent: &InodeRef,
        _name: &str,
        _mode: u32,
    ) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    fn create_symlink(
        &self,
        _volume: &VolumeRef,
        _parent: &InodeRef,
        _name: &str,
        _target: &str,
    ) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    /// Move an entry. Both parents are on `volume`. `must_be_dir` is set
    /// when either operand had a trailing slash.
    fn rename(
        &self,
        _volume: &VolumeRef,
        _old_parent: &InodeRef,
        _old_name: &str,
        _new_parent: &InodeRef,
        _new_name: &str,
        _must_be_dir: bool,
    ) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    fn unlink(&self, _volume: &VolumeRef, _parent: &InodeRef, _name: &str) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    fn remove_directory(
        &self,
        _volume: &VolumeRef,
        _parent: &InodeRef,
        _name: &str,
    ) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    /// Flush the whole volume
    fn sync(&self, _volume: &VolumeRef) -> VfsResult<()> {
        Ok(())
    }
}

pub trait FileOps: Send + Sync {
    fn open_file(
        &self,
        _volume: &VolumeRef,
        inode: &InodeRef,
        flags: OpenFlags,
    ) -> VfsResult<FileTableNode> {
        Ok(FileTableNode::file(inode.clone(), flags))
    }

    fn open_directory(
        &self,
        _volume: &VolumeRef,
        inode: &InodeRef,
        flags: OpenFlags,
    ) -> VfsResult<FileTableNode> {
        Ok(FileTableNode::directory(inode.clone(), flags))
    }

    /// Called once, when the last handle to `file` is gone
    fn close(&self, _file: &FileTableNode) -> VfsResult<()> {
        Ok(())
    }

    /// Scatter read at `position`. Short counts are not errors.
    fn read(
        &self,
        _file: &FileTableNode,
        _position: u64,
        _segments: &mut [&mut [u8]],
    ) -> VfsResult<usize> {
        Err(VfsError::NotImplemented)
    }

    /// Gather write at `position`
    fn write(&self, _file: &FileTableNode, _position: u64, _segments: &[&[u8]]) -> VfsResult<usize> {
        Err(VfsError::NotImplemented)
    }

    fn read_link(&self, _volume: &VolumeRef, _inode: &InodeRef) -> VfsResult<String> {
        Err(VfsError::NotImplemented)
    }

    /// Next entry at the directory cursor, advancing it. `None` at the end.
    fn read_directory(
        &self,
        _volume: &VolumeRef,
        _dir: &FileTableNode,
    ) -> VfsResult<Option<DirEntry>> {
        Err(VfsError::NotImplemented)
    }

    fn rewind_directory(&self, _volume: &VolumeRef, dir: &FileTableNode) -> VfsResult<()> {
        dir.set_cursor(0);
        Ok(())
    }

    /// Attributes of `inode`. For a symlink, `size` must be the target
    /// length: it is checked before [`FileOps::read_link`] is called, so the
    /// default refuses symlinks instead of reporting a size of 0.
    fn read_stat(&self, _volume: &VolumeRef, inode: &InodeRef) -> VfsResult<Stat> {
        if inode.is_symlink() {
            return Err(VfsError::NotImplemented);
        }
        Ok(Stat::from_inode(inode))
    }

    fn write_stat(
        &self,
        _volume: &VolumeRef,
        _inode: &InodeRef,
        _stat: &Stat,
        _mask: StatMask,
    ) -> VfsResult<()> {
        Err(VfsError::NotImplemented)
    }

    /// Check `mode` (R_OK/W_OK/X_OK bits) against the node
    fn check_access(&self, _volume: &VolumeRef, _inode: &InodeRef, _mode: u32) -> VfsResult<()> {
        Ok(())
    }

    /// ioctl. Returns the number of bytes placed in `output`.
    fn device_control(
        &self,
        _file: &FileTableNode,
        _request: u32,
        _input: &[u8],
        _output: &mut [u8],
    ) -> VfsResult<usize> {
        Err(VfsError::NotSupported)
    }

    fn sync(&self, _file: &FileTableNode) -> VfsResult<()> {
        Ok(())
    }
}
