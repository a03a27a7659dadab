//! TEAM_194: Tmpfs - in-memory filesystem
//!
//! Backs the root volume and can be mounted anywhere by name. Each mount is
//! an independent tree whose inode numbers start again at 1.

mod dir_ops;
mod file_ops;
mod node;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::{Arc, Weak};

use crate::driver::{DriverRef, FileOpsRef, FilesystemDriver};
use crate::error::{VfsError, VfsResult};
use crate::file::{FileTableNode, OpenFlags};
use crate::inode::{Inode, InodeRef};
use crate::manager::DEVICE_DIR;
use crate::mode::{self, S_IFCHR, S_IFDIR, S_IFLNK, S_IFREG};
use crate::volume::{Volume, VolumeFlags, VolumeId, VolumeRef};

use node::{Content, ROOT_INO, TmpfsNode, TmpfsVolume};

pub use node::MAX_FILE_SIZE;

/// TEAM_194: The tmpfs driver. Stateless; all state lives in the volumes.
#[derive(Default)]
pub struct Tmpfs;

impl Tmpfs {
    pub const NAME: &'static str = "tmpfs";

    pub fn new() -> Self {
        Self
    }

    /// TEAM_470: Create a character device node at `path` below "/dev"
    pub fn register_device(&self, volume: &VolumeRef, path: &str, ops: FileOpsRef) -> VfsResult<u64> {
        let (dir, name) = Self::device_parent(volume, path)?;
        let mode = mode::make_mode(S_IFCHR, 0o666);
        let inode = dir_ops::insert(volume, &dir, name, mode, Content::Device, Some(ops))?;
        Ok(inode.ino())
    }

    /// TEAM_470: Move the device node with id `ino` to `new_path` below "/dev"
    pub fn rename_device(&self, volume: &VolumeRef, ino: u64, new_path: &str) -> VfsResult<()> {
        let dev = Self::device_root(volume)?;
        let (old_dir, old_name) = dir_ops::find_by_ino(&dev, ino)?.ok_or(VfsError::NotFound)?;
        let (new_dir, new_name) = Self::device_parent(volume, new_path)?;
        dir_ops::rename(volume, &old_dir, &old_name, &new_dir, new_name, false)
    }

    pub fn remove_device(&self, volume: &VolumeRef, ino: u64) -> VfsResult<()> {
        let dev = Self::device_root(volume)?;
        let (dir, name) = dir_ops::find_by_ino(&dev, ino)?.ok_or(VfsError::NotFound)?;
        dir_ops::unlink(volume, &dir, &name)
    }

    fn device_root(volume: &VolumeRef) -> VfsResult<InodeRef> {
        dir_ops::lookup(volume.root(), DEVICE_DIR)
    }

    /// Directory that will hold `path`, created on demand, plus the leaf name
    fn device_parent<'p>(volume: &VolumeRef, path: &'p str) -> VfsResult<(InodeRef, &'p str)> {
        let mut dir = Self::device_root(volume)?;
        let mut components = path.split('/').filter(|c| !c.is_empty()).peekable();
        while let Some(component) = components.next() {
            crate::path::check_entry_name(component)?;
            if components.peek().is_none() {
                return Ok((dir, component));
            }
            dir = match dir_ops::lookup(&dir, component) {
                Ok(existing) => existing,
                Err(VfsError::NotFound) => {
                    let mode = mode::make_mode(S_IFDIR, 0o755);
                    let empty = Content::Directory(BTreeMap::new());
                    dir_ops::insert(volume, &dir, component, mode, empty, dir.file_ops().cloned())?
                }
                Err(e) => return Err(e),
            };
        }
        Err(VfsError::InvalidArgument)
    }
}

impl FilesystemDriver for Tmpfs {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn mount(
        self: Arc<Self>,
        volume_id: VolumeId,
        device: &str,
        flags: VolumeFlags,
        _args: &str,
    ) -> VfsResult<VolumeRef> {
        let driver: DriverRef = self.clone();
        let ops: FileOpsRef = self;
        let state = Box::new(TmpfsVolume::new());
        Ok(Volume::new_cyclic(volume_id, device, flags, driver.clone(), state, |volume| {
            let root = TmpfsNode::new(Content::Directory(BTreeMap::new()), Weak::new());
            Arc::new(Inode::new(
                ROOT_INO,
                mode::make_mode(S_IFDIR, 0o777),
                volume.clone(),
                volume_id,
                driver,
                Some(ops),
                Box::new(root),
            ))
        }))
    }

    fn locate_inode(&self, _volume: &VolumeRef, parent: &InodeRef, name: &str) -> VfsResult<InodeRef> {
        dir_ops::lookup(parent, name)
    }

    fn create_file(
        &self,
        volume: &VolumeRef,
        parent: &InodeRef,
        name: &str,
        flags: OpenFlags,
        mode: u32,
    ) -> VfsResult<FileTableNode> {
        let mode = mode::make_mode(S_IFREG, mode);
        let ops = parent.file_ops().cloned();
        let inode = dir_ops::insert(volume, parent, name, mode, Content::File(alloc::vec::Vec::new()), ops)?;
        Ok(FileTableNode::file(inode, flags))
    }

    fn create_directory(&self, volume: &VolumeRef, parent: &InodeRef, name: &str, mode: u32) -> VfsResult<()> {
        let mode = mode::make_mode(S_IFDIR, mode);
        let ops = parent.file_ops().cloned();
        dir_ops::insert(volume, parent, name, mode, Content::Directory(BTreeMap::new()), ops)?;
        Ok(())
    }

    fn create_symlink(&self, volume: &VolumeRef, parent: &InodeRef, name: &str, target: &str) -> VfsResult<()> {
        let mode = mode::make_mode(S_IFLNK, 0o777);
        let ops = parent.file_ops().cloned();
        dir_ops::insert(volume, parent, name, mode, Content::Symlink(String::from(target)), ops)?;
        Ok(())
    }

    fn rename(
        &self,
        volume: &VolumeRef,
        old_parent: &InodeRef,
        old_name: &str,
        new_parent: &InodeRef,
        new_name: &str,
        must_be_dir: bool,
    ) -> VfsResult<()> {
        dir_ops::rename(volume, old_parent, old_name, new_parent, new_name, must_be_dir)
    }

    fn unlink(&self, volume: &VolumeRef, parent: &InodeRef, name: &str) -> VfsResult<()> {
        dir_ops::unlink(volume, parent, name)
    }

    fn remove_directory(&self, volume: &VolumeRef, parent: &InodeRef, name: &str) -> VfsResult<()> {
        dir_ops::remove_directory(volume, parent, name)
    }
}
