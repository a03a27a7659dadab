//! TEAM_202: Inode Implementation
//!
//! An inode is the driver-produced handle for one filesystem node. Drivers
//! hand out one canonical `Arc<Inode>` per node so identity can be checked
//! with [`Inode::same_node`] even across lookups.

use alloc::boxed::Box;
use alloc::sync::{Arc, Weak};
use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use los_utils::RwLock;

use crate::driver::{DriverRef, FileOpsRef};
use crate::error::{VfsError, VfsResult};
use crate::mode;
use crate::volume::{Volume, VolumeId, VolumeRef};

/// TEAM_202: Reference to an inode
pub type InodeRef = Arc<Inode>;

/// TEAM_202: Weak reference to an inode (for parent pointers)
pub type WeakInodeRef = Weak<Inode>;

pub struct Inode {
    ino: u64,
    volume_id: VolumeId,
    /// File type and permissions (S_IFMT | mode bits)
    mode: AtomicU32,
    volume: Weak<Volume>,
    driver: DriverRef,
    /// Absent means every file operation is unimplemented
    file_ops: Option<FileOpsRef>,
    /// Set while a volume is mounted on this inode
    mount_root: RwLock<Option<InodeRef>>,
    /// Filesystem-specific private data
    private: Box<dyn Any + Send + Sync>,
}

impl Inode {
    /// TEAM_202: Create a new inode
    pub fn new(
        ino: u64,
        mode: u32,
        volume: Weak<Volume>,
        volume_id: VolumeId,
        driver: DriverRef,
        file_ops: Option<FileOpsRef>,
        private: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Self {
            ino,
            volume_id,
            mode: AtomicU32::new(mode),
            volume,
            driver,
            file_ops,
            mount_root: RwLock::new(None),
            private,
        }
    }

    /// Identifier, unique only within [`Inode::volume_id`]
    pub fn ino(&self) -> u64 {
        self.ino
    }

    pub fn volume_id(&self) -> VolumeId {
        self.volume_id
    }

    pub fn mode(&self) -> u32 {
        self.mode.load(Ordering::Relaxed)
    }

    /// Replaces the permission bits, keeping the file type
    pub fn set_permissions(&self, perms: u32) {
        let _ = self
            .mode
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |m| {
                Some(mode::make_mode(m, perms))
            });
    }

    pub fn is_file(&self) -> bool {
        mode::is_reg(self.mode())
    }

    pub fn is_dir(&self) -> bool {
        mode::is_dir(self.mode())
    }

    pub fn is_symlink(&self) -> bool {
        mode::is_lnk(self.mode())
    }

    /// Owning volume. Fails only while the volume is being torn down.
    pub fn volume(&self) -> VfsResult<VolumeRef> {
        self.volume.upgrade().ok_or(VfsError::NotFound)
    }

    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    pub fn file_ops(&self) -> Option<&FileOpsRef> {
        self.file_ops.as_ref()
    }

    /// Root inode of the volume mounted here, if any
    pub fn mount_root(&self) -> Option<InodeRef> {
        self.mount_root.read().clone()
    }

    pub(crate) fn set_mount_root(&self, root: Option<InodeRef>) {
        *self.mount_root.write() = root;
    }

    /// TEAM_470: Same node on the same volume. Raw ids are only compared
    /// once the volumes are known to match.
    pub fn same_node(&self, other: &Inode) -> bool {
        self.volume_id == other.volume_id && self.ino == other.ino
    }

    /// Filesystem-private data, if it has type `T`
    pub fn private<T: Any>(&self) -> Option<&T> {
        self.private.downcast_ref::<T>()
    }
}

impl fmt::Debug for Inode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inode")
            .field("volume", &self.volume_id)
            .field("ino", &self.ino)
            .field("mode", &format_args!("{:o}", self.mode()))
            .finish_non_exhaustive()
    }
}
