//! TEAM_194: Tmpfs Node Types
//!
//! Every tmpfs node is an [`Inode`] whose private data is a [`TmpfsNode`].
//! Directories own their children's inodes, so a lookup always returns the
//! same `Arc` for a given node.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::sync::{Arc, Weak};
use alloc::vec::Vec;
use core::sync::atomic::{AtomicU64, Ordering};

use los_utils::Mutex;

use crate::driver::{DriverRef, FileOpsRef};
use crate::error::{VfsError, VfsResult};
use crate::inode::{Inode, InodeRef, WeakInodeRef};
use crate::volume::VolumeRef;

/// TEAM_194: Maximum file size (16MB)
pub const MAX_FILE_SIZE: usize = 16 * 1024 * 1024;

/// Inode number of every tmpfs volume root
pub(super) const ROOT_INO: u64 = 1;

pub(super) enum Content {
    /// Children by name, sorted for stable readdir order
    Directory(BTreeMap<String, InodeRef>),
    File(Vec<u8>),
    Symlink(String),
    /// Data lives behind the node's own file operations
    Device,
}

impl Content {
    /// Size reported by stat
    pub(super) fn size(&self) -> u64 {
        match self {
            Content::File(data) => data.len() as u64,
            Content::Symlink(target) => target.len() as u64,
            Content::Directory(_) | Content::Device => 0,
        }
    }
}

#[derive(Clone, Copy, Default)]
pub(super) struct Attributes {
    pub uid: u32,
    pub gid: u32,
    pub atime: u64,
    pub mtime: u64,
    pub ctime: u64,
}

/// TEAM_194: A node in the tmpfs tree
pub(super) struct TmpfsNode {
    /// Containing directory; empty for the volume root
    pub parent: Mutex<WeakInodeRef>,
    pub content: Mutex<Content>,
    pub attrs: Mutex<Attributes>,
}

impl TmpfsNode {
    pub(super) fn new(content: Content, parent: WeakInodeRef) -> Self {
        Self {
            parent: Mutex::new(parent),
            content: Mutex::new(content),
            attrs: Mutex::new(Attributes::default()),
        }
    }
}

/// TEAM_470: Per-volume tmpfs state
pub(super) struct TmpfsVolume {
    next_ino: AtomicU64,
    /// Held across every namespace change (create, unlink, rmdir, rename)
    pub namespace_lock: Mutex<()>,
}

impl TmpfsVolume {
    pub(super) fn new() -> Self {
        Self {
            next_ino: AtomicU64::new(ROOT_INO + 1),
            namespace_lock: Mutex::new(()),
        }
    }

    pub(super) fn alloc_ino(&self) -> u64 {
        self.next_ino.fetch_add(1, Ordering::Relaxed)
    }
}

/// The tmpfs half of an inode
pub(super) fn node(inode: &Inode) -> VfsResult<&TmpfsNode> {
    inode.private::<TmpfsNode>().ok_or(VfsError::IoError)
}

pub(super) fn volume_state(volume: &VolumeRef) -> VfsResult<&TmpfsVolume> {
    volume.private::<TmpfsVolume>().ok_or(VfsError::IoError)
}

/// TEAM_470: Build the inode for a new node on `volume`
pub(super) fn make_inode(
    volume: &VolumeRef,
    mode: u32,
    content: Content,
    parent: &InodeRef,
    file_ops: Option<FileOpsRef>,
) -> VfsResult<InodeRef> {
    let ino = volume_state(volume)?.alloc_ino();
    let driver: DriverRef = parent.driver().clone();
    Ok(Arc::new(Inode::new(
        ino,
        mode,
        Arc::downgrade(volume),
        volume.id(),
        driver,
        file_ops,
        Box::new(TmpfsNode::new(content, Arc::downgrade(parent))),
    )))
}

/// Parent directory, or the node itself for the volume root
pub(super) fn parent_of(inode: &InodeRef) -> VfsResult<InodeRef> {
    let parent: Weak<Inode> = node(inode)?.parent.lock().clone();
    Ok(parent.upgrade().unwrap_or_else(|| inode.clone()))
}
