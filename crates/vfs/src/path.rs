//! TEAM_201: Path resolution
//!
//! Walks a path one component at a time through driver lookups. Every
//! component but the last is fully resolved: mounts are crossed and
//! symlinks followed. How the last component is treated is the caller's
//! choice, expressed with [`LookupFlags`].

use bitflags::bitflags;

use crate::config::NAME_MAX;
use crate::error::{VfsError, VfsResult};
use crate::inode::InodeRef;
use crate::manager::Vfs;
use crate::task::{TaskContext, enter_symlink_scope};
use crate::volume::VOLID_ROOT;

bitflags! {
    /// TEAM_470: How to treat the final component of a lookup
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct LookupFlags: u32 {
        /// Replace a mount point by the root of the volume mounted on it
        const CROSS_MOUNT = 0x1;
        /// Resolve a symlink to its target
        const FOLLOW_SYMLINKS = 0x2;
    }
}

impl LookupFlags {
    /// Flags used for intermediate components
    pub const FULL: Self = Self::CROSS_MOUNT.union(Self::FOLLOW_SYMLINKS);
}

/// TEAM_470: Strip trailing separators. The flag is set when any were
/// removed, meaning the operand must name a directory. "/" stays "/".
pub fn strip_trailing_slashes(path: &str) -> (&str, bool) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        let root = if path.is_empty() { path } else { &path[..1] };
        return (root, path.len() > 1);
    }
    (trimmed, trimmed.len() != path.len())
}

/// TEAM_470: Validate a name about to be created, removed or renamed
pub fn check_entry_name(name: &str) -> VfsResult<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(VfsError::InvalidArgument);
    }
    if name.len() > NAME_MAX {
        return Err(VfsError::NameTooLong);
    }
    Ok(())
}

impl Vfs {
    /// TEAM_470: Resolve everything but the last component of `path`.
    ///
    /// Absolute paths start at the root volume's root; relative ones at
    /// `start`, or the context's current directory when `start` is `None`.
    /// Returns the parent inode and the final component, which may be empty
    /// (path was "" or ended in a separator).
    pub fn locate_parent<'p>(
        &self,
        task: &dyn TaskContext,
        start: Option<InodeRef>,
        path: &'p str,
    ) -> VfsResult<(InodeRef, &'p str)> {
        let bytes = path.as_bytes();
        let mut current = match (path.starts_with('/'), start) {
            (true, _) => self.root_inode().clone(),
            (false, Some(inode)) => inode,
            (false, None) => task.io_context().cwd(),
        };

        let mut name_start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            if byte != b'/' {
                continue;
            }
            if i > name_start {
                let name = &path[name_start..i];
                current = self.locate_by_name(task, &current, name, LookupFlags::FULL)?;
            }
            name_start = i + 1;
        }
        Ok((current, &path[name_start..]))
    }

    /// TEAM_470: Look up one name in `parent`.
    ///
    /// ".." of a mounted volume's root continues from the mount point in the
    /// parent volume; ".." of the global root is the root.
    pub fn locate_by_name(
        &self,
        task: &dyn TaskContext,
        parent: &InodeRef,
        name: &str,
        flags: LookupFlags,
    ) -> VfsResult<InodeRef> {
        if name.is_empty() {
            return Ok(parent.clone());
        }
        if name == "." {
            return if parent.is_dir() {
                Ok(parent.clone())
            } else {
                Err(VfsError::NotADirectory)
            };
        }

        let mut parent = parent.clone();
        if name == ".." {
            let volume = parent.volume()?;
            if parent.same_node(volume.root()) {
                if volume.id() == VOLID_ROOT {
                    return Ok(parent);
                }
                parent = volume.mount_point().ok_or(VfsError::NotFound)?;
            }
        }

        if !parent.is_dir() {
            return Err(VfsError::NotADirectory);
        }

        let volume = parent.volume()?;
        let mut inode = parent.driver().locate_inode(&volume, &parent, name)?;
        log::trace!("[VFS] lookup {:?}/{} -> {:?}", parent, name, inode);

        if flags.contains(LookupFlags::CROSS_MOUNT) {
            if let Some(root) = inode.mount_root() {
                inode = root;
            }
        }
        if flags.contains(LookupFlags::FOLLOW_SYMLINKS) {
            inode = self.follow_symlinks(task, &parent, inode)?;
        }
        Ok(inode)
    }

    /// TEAM_470: Resolve a whole path, treating the last component per `flags`
    pub fn locate_by_path(
        &self,
        task: &dyn TaskContext,
        start: Option<InodeRef>,
        path: &str,
        flags: LookupFlags,
    ) -> VfsResult<InodeRef> {
        let (parent, name) = self.locate_parent(task, start, path)?;
        self.locate_by_name(task, &parent, name, flags)
    }

    /// TEAM_470: Expand `inode` until it is no longer a symlink.
    ///
    /// `parent` is the directory the link was found in; relative targets are
    /// resolved from the directory holding the link being expanded. Nested
    /// expansion (a link inside a link target) is bounded by the task's
    /// depth counter, chain length by `symlink_loop_max`.
    pub(crate) fn follow_symlinks(
        &self,
        task: &dyn TaskContext,
        parent: &InodeRef,
        inode: InodeRef,
    ) -> VfsResult<InodeRef> {
        if !inode.is_symlink() {
            return Ok(inode);
        }

        let _depth = enter_symlink_scope(task.symlink_depth(), self.config().symlink_depth_max)
            .inspect_err(|_| log::warn!("[VFS] symlink nesting too deep at {:?}", inode))?;

        let mut inode = inode;
        let mut link_dir = parent.clone();
        let mut followed = 0;
        while inode.is_symlink() {
            if followed >= self.config().symlink_loop_max {
                log::warn!("[VFS] symlink chain too long at {:?}", inode);
                return Err(VfsError::Loop);
            }
            followed += 1;

            let target = self.read_link_target(&inode)?;
            let (dir, name) = self.locate_parent(task, Some(link_dir.clone()), &target)?;
            inode = if name.is_empty() || name == "." {
                dir.clone()
            } else {
                self.locate_by_name(task, &dir, name, LookupFlags::CROSS_MOUNT)?
            };
            link_dir = dir;
        }
        Ok(inode)
    }

    /// Read a link target after checking its stored length
    fn read_link_target(&self, inode: &InodeRef) -> VfsResult<alloc::string::String> {
        let ops = inode.file_ops().ok_or(VfsError::NotImplemented)?;
        let volume = inode.volume()?;
        let length = ops.read_stat(&volume, inode)?.size;
        if length > self.config().symlink_len_max as u64 {
            return Err(VfsError::NameTooLong);
        }
        ops.read_link(&volume, inode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests: trailing separators set the directory flag, root is preserved
    #[test]
    fn test_strip_trailing_slashes() {
        assert_eq!(strip_trailing_slashes("a/b"), ("a/b", false));
        assert_eq!(strip_trailing_slashes("a/b/"), ("a/b", true));
        assert_eq!(strip_trailing_slashes("a//"), ("a", true));
        assert_eq!(strip_trailing_slashes("/"), ("/", false));
        assert_eq!(strip_trailing_slashes("//"), ("/", true));
        assert_eq!(strip_trailing_slashes(""), ("", false));
    }

    /// Tests: reserved and oversized names
    #[test]
    fn test_check_entry_name() {
        assert_eq!(check_entry_name("file"), Ok(()));
        assert_eq!(check_entry_name(""), Err(VfsError::InvalidArgument));
        assert_eq!(check_entry_name("."), Err(VfsError::InvalidArgument));
        assert_eq!(check_entry_name(".."), Err(VfsError::InvalidArgument));
        let long = "x".repeat(NAME_MAX + 1);
        assert_eq!(check_entry_name(&long), Err(VfsError::NameTooLong));
    }
}
