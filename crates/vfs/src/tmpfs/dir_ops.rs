//! TEAM_203: Tmpfs Directory Operations

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::Arc;

use crate::driver::FileOpsRef;
use crate::error::{VfsError, VfsResult};
use crate::inode::{Inode, InodeRef};
use crate::mode;
use crate::stat::DirEntry;
use crate::volume::VolumeRef;

use super::node::{Content, make_inode, node, parent_of, volume_state};

/// Run `f` on the child map of `dir` under its content lock
pub(super) fn with_children<R>(
    dir: &Inode,
    f: impl FnOnce(&mut BTreeMap<String, InodeRef>) -> VfsResult<R>,
) -> VfsResult<R> {
    let mut content = node(dir)?.content.lock();
    match &mut *content {
        Content::Directory(children) => f(children),
        _ => Err(VfsError::NotADirectory),
    }
}

pub(super) fn lookup(dir: &InodeRef, name: &str) -> VfsResult<InodeRef> {
    match name {
        "." => Ok(dir.clone()),
        ".." => parent_of(dir),
        _ => with_children(dir, |children| {
            children.get(name).cloned().ok_or(VfsError::NotFound)
        }),
    }
}

/// TEAM_203: Create a node called `name` in `dir`
pub(super) fn insert(
    volume: &VolumeRef,
    dir: &InodeRef,
    name: &str,
    mode: u32,
    content: Content,
    file_ops: Option<FileOpsRef>,
) -> VfsResult<InodeRef> {
    let _namespace = volume_state(volume)?.namespace_lock.lock();
    with_children(dir, |children| {
        if children.contains_key(name) {
            return Err(VfsError::AlreadyExists);
        }
        let inode = make_inode(volume, mode, content, dir, file_ops)?;
        children.insert(String::from(name), inode.clone());
        Ok(inode)
    })
}

pub(super) fn is_empty(dir: &Inode) -> VfsResult<bool> {
    with_children(dir, |children| Ok(children.is_empty()))
}

pub(super) fn unlink(volume: &VolumeRef, dir: &InodeRef, name: &str) -> VfsResult<()> {
    let _namespace = volume_state(volume)?.namespace_lock.lock();
    let removed = with_children(dir, |children| {
        let child = children.get(name).ok_or(VfsError::NotFound)?;
        if child.is_dir() {
            return Err(VfsError::IsADirectory);
        }
        Ok(children.remove(name))
    })?;
    drop(removed);
    Ok(())
}

pub(super) fn remove_directory(volume: &VolumeRef, dir: &InodeRef, name: &str) -> VfsResult<()> {
    let _namespace = volume_state(volume)?.namespace_lock.lock();
    let removed = with_children(dir, |children| {
        let child = children.get(name).ok_or(VfsError::NotFound)?;
        if !child.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        if child.mount_root().is_some() {
            return Err(VfsError::Busy);
        }
        if !is_empty(child)? {
            return Err(VfsError::DirectoryNotEmpty);
        }
        Ok(children.remove(name))
    })?;
    drop(removed);
    Ok(())
}

/// True if `ancestor` is `inode` or one of its parents
fn is_ancestor(ancestor: &InodeRef, inode: &InodeRef) -> VfsResult<bool> {
    let mut current = inode.clone();
    loop {
        if Arc::ptr_eq(&current, ancestor) {
            return Ok(true);
        }
        let parent = parent_of(&current)?;
        if Arc::ptr_eq(&parent, &current) {
            return Ok(false);
        }
        current = parent;
    }
}

/// TEAM_204: Move `old_name` in `old_dir` to `new_name` in `new_dir`.
///
/// The checks and the edit of both directories happen under the volume's
/// namespace lock, so no create or remove can slip in between.
pub(super) fn rename(
    volume: &VolumeRef,
    old_dir: &InodeRef,
    old_name: &str,
    new_dir: &InodeRef,
    new_name: &str,
    must_be_dir: bool,
) -> VfsResult<()> {
    let _namespace = volume_state(volume)?.namespace_lock.lock();

    let source = lookup(old_dir, old_name)?;
    if must_be_dir && !source.is_dir() {
        return Err(VfsError::NotADirectory);
    }
    if source.mount_root().is_some() {
        return Err(VfsError::Busy);
    }
    // Moving a directory into its own subtree
    if source.is_dir() && is_ancestor(&source, new_dir)? {
        return Err(VfsError::InvalidArgument);
    }

    match lookup(new_dir, new_name) {
        Ok(target) if Arc::ptr_eq(&target, &source) => return Ok(()),
        Ok(target) => {
            if target.mount_root().is_some() {
                return Err(VfsError::Busy);
            }
            match (source.is_dir(), target.is_dir()) {
                (true, false) => return Err(VfsError::NotADirectory),
                (false, true) => return Err(VfsError::IsADirectory),
                (true, true) if !is_empty(&target)? => return Err(VfsError::DirectoryNotEmpty),
                _ => {}
            }
        }
        Err(VfsError::NotFound) => {}
        Err(e) => return Err(e),
    }

    with_children(old_dir, |children| Ok(children.remove(old_name)))?;
    let replaced = with_children(new_dir, |children| {
        Ok(children.insert(String::from(new_name), source.clone()))
    })?;
    *node(&source)?.parent.lock() = Arc::downgrade(new_dir);
    drop(replaced);
    Ok(())
}

/// TEAM_203: Entry number `index` of `dir`; 0 and 1 are "." and ".."
pub(super) fn entry_at(dir: &InodeRef, index: usize) -> VfsResult<Option<DirEntry>> {
    let volume = dir.volume_id();
    let make = |name: &str, inode: &Inode| DirEntry {
        ino: inode.ino(),
        volume,
        name: String::from(name),
        file_type: mode::dirent_type(inode.mode()),
    };
    match index {
        0 => Ok(Some(make(".", dir.as_ref()))),
        1 => Ok(Some(make("..", parent_of(dir)?.as_ref()))),
        _ => with_children(dir, |children| {
            Ok(children
                .iter()
                .nth(index - 2)
                .map(|(name, child)| make(name, child.as_ref())))
        }),
    }
}

/// Locate the entry holding the node with id `ino` below `dir`
pub(super) fn find_by_ino(dir: &InodeRef, ino: u64) -> VfsResult<Option<(InodeRef, String)>> {
    let children: alloc::vec::Vec<(String, InodeRef)> = with_children(dir, |children| {
        Ok(children
            .iter()
            .map(|(name, child)| (name.clone(), child.clone()))
            .collect())
    })?;
    for (name, child) in children {
        if child.ino() == ino {
            return Ok(Some((dir.clone(), name)));
        }
        if child.is_dir() {
            if let Some(found) = find_by_ino(&child, ino)? {
                return Ok(Some(found));
            }
        }
    }
    Ok(None)
}
