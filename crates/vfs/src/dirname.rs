//! TEAM_470: Directory name reconstruction.
//!
//! There is no path cache, so the name of a directory is rebuilt by
//! walking ".." up to the root and finding, in each parent, the entry that
//! leads back down.

use alloc::string::String;

use crate::error::{VfsError, VfsResult};
use crate::file::OpenFlags;
use crate::inode::InodeRef;
use crate::manager::Vfs;
use crate::path::LookupFlags;
use crate::task::TaskContext;

impl Vfs {
    /// TEAM_470: Absolute path of `inode`, failing with `NameTooLong` when it
    /// would exceed `capacity` bytes (never more than the configured `path_max`).
    ///
    /// When a parent is on another volume, `inode` is the root of a volume
    /// mounted in that parent and the matching entry is the one whose
    /// mount-root link is `inode`. Otherwise both share a volume and the
    /// entry is matched by inode number. No match means the tree changed
    /// under the walk; that is reported as `NotFound`.
    pub fn directory_name(
        &self,
        task: &dyn TaskContext,
        inode: &InodeRef,
        capacity: usize,
    ) -> VfsResult<String> {
        let capacity = capacity.min(self.config().path_max);
        let root = self.root_inode();
        if inode.same_node(root) {
            return if capacity >= 1 {
                Ok(String::from("/"))
            } else {
                Err(VfsError::NameTooLong)
            };
        }

        let mut path = String::new();
        let mut current = inode.clone();
        loop {
            let parent = self.locate_by_name(task, &current, "..", LookupFlags::CROSS_MOUNT)?;
            let name = self.entry_name_in(task, &parent, &current)?;

            if path.len() + name.len() + 1 > capacity {
                return Err(VfsError::NameTooLong);
            }
            path.insert_str(0, &name);
            path.insert(0, '/');

            if parent.same_node(root) {
                return Ok(path);
            }
            current = parent;
        }
    }

    /// Name under which `child` appears in `parent`
    fn entry_name_in(
        &self,
        task: &dyn TaskContext,
        parent: &InodeRef,
        child: &InodeRef,
    ) -> VfsResult<String> {
        let ops = parent.file_ops().ok_or(VfsError::NotImplemented)?;
        let volume = parent.volume()?;
        // Closed when it drops, on every exit from this function
        let dir = Self::open_node(parent, OpenFlags::new(OpenFlags::O_RDONLY | OpenFlags::O_DIRECTORY))?;
        let crosses_mount = child.volume_id() != parent.volume_id();

        while let Some(entry) = ops.read_directory(&volume, &dir)? {
            if entry.name == "." || entry.name == ".." {
                continue;
            }
            let matched = if crosses_mount {
                self.locate_by_name(task, parent, &entry.name, LookupFlags::empty())?
                    .mount_root()
                    .is_some_and(|root| root.same_node(child))
            } else {
                entry.ino == child.ino()
            };
            if matched {
                return Ok(entry.name);
            }
        }

        log::warn!("[VFS] no entry for {:?} in {:?}", child, parent);
        Err(VfsError::NotFound)
    }
}
