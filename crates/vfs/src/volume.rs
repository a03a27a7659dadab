//! TEAM_470: Mounted volumes.
//!
//! A volume owns its root inode. Its link to the mount point is weak: the
//! mount point inode lives in the parent volume and already owns the
//! forward `mount_root` link, so a strong back-link would form a cycle.

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::{Arc, Weak};
use core::any::Any;
use core::fmt;

use bitflags::bitflags;
use los_utils::RwLock;

use crate::driver::DriverRef;
use crate::inode::{Inode, InodeRef};

pub type VolumeId = u64;

/// TEAM_470: Reference to a mounted volume
pub type VolumeRef = Arc<Volume>;

/// Id of the volume mounted at "/"
pub const VOLID_ROOT: VolumeId = 1;

/// First id handed to an ordinary mount
pub const VOLID_FIRST_NORMAL: VolumeId = 16;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
    pub struct VolumeFlags: u32 {
        const READ_ONLY = 0x01;
        const REMOVABLE = 0x02;
        const PERSISTENT = 0x04;
        const SHARED = 0x08;
        const BLOCK_BASED = 0x10;
        const CAN_MOUNT = 0x20;
    }
}

pub struct Volume {
    id: VolumeId,
    device: String,
    flags: VolumeFlags,
    driver: DriverRef,
    root: InodeRef,
    mount_point: RwLock<Weak<Inode>>,
    private: Box<dyn Any + Send + Sync>,
}

impl Volume {
    /// TEAM_470: Build a volume and its root inode together. `make_root`
    /// gets the weak self-reference every inode of the volume must carry.
    pub fn new_cyclic(
        id: VolumeId,
        device: &str,
        flags: VolumeFlags,
        driver: DriverRef,
        private: Box<dyn Any + Send + Sync>,
        make_root: impl FnOnce(&Weak<Volume>) -> InodeRef,
    ) -> VolumeRef {
        Arc::new_cyclic(|weak| Self {
            id,
            device: String::from(device),
            flags,
            driver,
            root: make_root(weak),
            mount_point: RwLock::new(Weak::new()),
            private,
        })
    }

    pub fn id(&self) -> VolumeId {
        self.id
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn flags(&self) -> VolumeFlags {
        self.flags
    }

    pub fn is_read_only(&self) -> bool {
        self.flags.contains(VolumeFlags::READ_ONLY)
    }

    pub fn driver(&self) -> &DriverRef {
        &self.driver
    }

    pub fn root(&self) -> &InodeRef {
        &self.root
    }

    /// TEAM_470: Inode this volume is mounted on.
    ///
    /// Returns `None` for the root volume, and also once the mount point has
    /// been dropped or no longer points back at this volume's root.
    pub fn mount_point(&self) -> Option<InodeRef> {
        let point = self.mount_point.read().upgrade()?;
        let still_mounted = point
            .mount_root()
            .is_some_and(|root| Arc::ptr_eq(&root, &self.root));
        still_mounted.then_some(point)
    }

    pub(crate) fn set_mount_point(&self, point: &InodeRef) {
        *self.mount_point.write() = Arc::downgrade(point);
    }

    /// Driver-private per-volume state
    pub fn private<T: Any>(&self) -> Option<&T> {
        self.private.downcast_ref::<T>()
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("id", &self.id)
            .field("device", &self.device)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
