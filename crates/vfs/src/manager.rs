//! TEAM_470: The VFS instance.
//!
//! Owns the driver registry and the volume table (one lock for both), the
//! root volume and the kernel IO context. Built explicitly by [`Vfs::new`];
//! nothing is set up by static initialization.

use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use los_utils::{HashMap, Mutex};

use crate::config::VfsConfig;
use crate::driver::{DriverRef, FileOpsRef, FilesystemDriver};
use crate::error::{VfsError, VfsResult};
use crate::inode::InodeRef;
use crate::io_context::{IoContext, IoContextRef};
use crate::path::LookupFlags;
use crate::task::TaskContext;
use crate::tmpfs::Tmpfs;
use crate::volume::{VOLID_FIRST_NORMAL, VOLID_ROOT, VolumeFlags, VolumeId, VolumeRef};

/// Directory on the root volume holding device nodes
pub const DEVICE_DIR: &str = "dev";

struct Tables {
    drivers: HashMap<String, DriverRef>,
    volumes: HashMap<VolumeId, VolumeRef>,
    next_volume_id: VolumeId,
}

pub struct Vfs {
    config: VfsConfig,
    tables: Mutex<Tables>,
    root: VolumeRef,
    rootfs: Arc<Tmpfs>,
    kernel_context: IoContextRef,
}

impl Vfs {
    /// TEAM_470: Register the built-in drivers and mount the root volume
    pub fn new(config: VfsConfig) -> VfsResult<Self> {
        let rootfs = Arc::new(Tmpfs::new());
        let driver: DriverRef = rootfs.clone();

        let root = driver
            .clone()
            .mount(VOLID_ROOT, "", VolumeFlags::empty(), "")?;
        root.driver()
            .create_directory(&root, root.root(), DEVICE_DIR, 0o755)?;

        let mut tables = Tables {
            drivers: HashMap::new(),
            volumes: HashMap::new(),
            next_volume_id: VOLID_FIRST_NORMAL,
        };
        tables.drivers.insert(String::from(driver.name()), driver);
        tables.volumes.insert(VOLID_ROOT, root.clone());

        let kernel_context = Arc::new(IoContext::new(
            true,
            root.root().clone(),
            config.max_handles,
        ));
        log::info!("[VFS] root volume {} mounted ({})", VOLID_ROOT, rootfs.name());

        Ok(Self {
            config,
            tables: Mutex::new(tables),
            root,
            rootfs,
            kernel_context,
        })
    }

    pub fn config(&self) -> &VfsConfig {
        &self.config
    }

    pub fn root_volume(&self) -> &VolumeRef {
        &self.root
    }

    pub fn root_inode(&self) -> &InodeRef {
        self.root.root()
    }

    pub fn kernel_context(&self) -> &IoContextRef {
        &self.kernel_context
    }

    /// Fresh per-process context, starting in "/"
    pub fn new_io_context(&self) -> IoContextRef {
        Arc::new(IoContext::new(
            false,
            self.root_inode().clone(),
            self.config.max_handles,
        ))
    }

    /// TEAM_470: The context a handle or an open call addresses
    pub(crate) fn context_for<'a>(
        &'a self,
        task: &'a dyn TaskContext,
        kernel: bool,
    ) -> &'a IoContextRef {
        if kernel {
            &self.kernel_context
        } else {
            task.io_context()
        }
    }

    // ========================================================================
    // Driver registry
    // ========================================================================

    pub fn register_filesystem(&self, driver: DriverRef) -> VfsResult<()> {
        let name = String::from(driver.name());
        let mut tables = self.tables.lock();
        if tables.drivers.contains_key(&name) {
            return Err(VfsError::AlreadyExists);
        }
        log::debug!("[VFS] registered filesystem '{}'", name);
        tables.drivers.insert(name, driver);
        Ok(())
    }

    pub fn find_filesystem(&self, name: &str) -> Option<DriverRef> {
        self.tables.lock().drivers.get(name).cloned()
    }

    // ========================================================================
    // Volume table
    // ========================================================================

    pub fn volume(&self, id: VolumeId) -> Option<VolumeRef> {
        self.tables.lock().volumes.get(&id).cloned()
    }

    /// All mounted volumes, ordered by id
    pub fn volumes(&self) -> Vec<VolumeRef> {
        let mut volumes: Vec<VolumeRef> = self.tables.lock().volumes.values().cloned().collect();
        volumes.sort_by_key(|v| v.id());
        volumes
    }

    /// TEAM_470: Mount `fs_name` on the directory `dir`.
    ///
    /// The mount point is resolved like any intermediate component, so
    /// symlinks are followed and existing mounts crossed. It must be a
    /// plain directory: neither a mount point nor the root of a volume.
    pub fn mount(
        &self,
        task: &dyn TaskContext,
        device: &str,
        dir: &str,
        fs_name: &str,
        flags: VolumeFlags,
        args: &str,
    ) -> VfsResult<VolumeRef> {
        let mount_point = self.locate_by_path(task, None, dir, LookupFlags::FULL)?;
        if !mount_point.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        // Already a mount point, or the root of a volume (no stacking)
        if mount_point.mount_root().is_some() || mount_point.same_node(mount_point.volume()?.root()) {
            return Err(VfsError::Busy);
        }
        let driver = self.find_filesystem(fs_name).ok_or(VfsError::NoDevice)?;

        let id = {
            let mut tables = self.tables.lock();
            let id = tables.next_volume_id;
            tables.next_volume_id += 1;
            id
        };
        let volume = driver.mount(id, device, flags, args)?;

        let mut tables = self.tables.lock();
        if mount_point.mount_root().is_some() {
            return Err(VfsError::Busy);
        }
        tables.volumes.insert(id, volume.clone());
        volume.set_mount_point(&mount_point);
        mount_point.set_mount_root(Some(volume.root().clone()));
        drop(tables);

        log::info!(
            "[VFS] mounted {} '{}' as volume {} on {}",
            fs_name,
            device,
            id,
            dir
        );
        Ok(volume)
    }

    /// TEAM_470: Flush every mounted volume. All volumes are tried; the
    /// first failure is returned.
    pub fn sync(&self) -> VfsResult<()> {
        let mut result = Ok(());
        for volume in self.volumes() {
            if let Err(e) = volume.driver().sync(&volume) {
                log::warn!("[VFS] sync of volume {} failed: {}", volume.id(), e);
                result = result.and(Err(e));
            }
        }
        result
    }

    // ========================================================================
    // Device nodes
    // ========================================================================

    /// TEAM_470: Publish a device under "/dev". `path` is relative to
    /// "/dev"; missing directories are created. Returns the node's id.
    pub fn register_device(&self, path: &str, ops: FileOpsRef) -> VfsResult<u64> {
        let ino = self.rootfs.register_device(&self.root, path, ops)?;
        log::debug!("[VFS] device /{}/{} registered as {}", DEVICE_DIR, path, ino);
        Ok(ino)
    }

    pub fn rename_device(&self, ino: u64, new_path: &str) -> VfsResult<()> {
        self.rootfs.rename_device(&self.root, ino, new_path)
    }

    pub fn remove_device(&self, ino: u64) -> VfsResult<()> {
        self.rootfs.remove_device(&self.root, ino)
    }
}
