//! TEAM_470: Scenario tests for the VFS core.
//!
//! Each test builds its own [`Vfs`] on a fresh tmpfs root; nothing here
//! touches the global instance except `test_global_init`.

mod devices;
mod io;
mod resolve;

use alloc::string::String;
use alloc::vec::Vec;

use crate::config::VfsConfig;
use crate::error::VfsResult;
use crate::file::OpenFlags;
use crate::inode::InodeRef;
use crate::io_context::Handle;
use crate::manager::Vfs;
use crate::path::LookupFlags;
use crate::task::Task;

pub(crate) struct Fixture {
    pub vfs: Vfs,
    pub task: Task,
}

pub(crate) fn setup() -> Fixture {
    setup_with(VfsConfig::default())
}

pub(crate) fn setup_with(config: VfsConfig) -> Fixture {
    // Only the first logger registration wins; later ones are ignored
    let _ = crate::logger::init(log::LevelFilter::Debug);
    let vfs = Vfs::new(config).unwrap();
    let task = Task::new(vfs.new_io_context());
    Fixture { vfs, task }
}

pub(crate) fn flags(bits: u32) -> OpenFlags {
    OpenFlags::new(bits)
}

impl Fixture {
    pub fn mkdir(&self, path: &str) {
        self.vfs.create_directory(&self.task, None, path, 0o755).unwrap();
    }

    pub fn write_file(&self, path: &str, data: &[u8]) {
        let h = self
            .open(path, OpenFlags::O_CREAT | OpenFlags::O_WRONLY | OpenFlags::O_TRUNC)
            .unwrap();
        self.vfs.write_exact(&self.task, h, data).unwrap();
        self.vfs.close(&self.task, h).unwrap();
    }

    pub fn read_file(&self, path: &str) -> Vec<u8> {
        let h = self.open(path, OpenFlags::O_RDONLY).unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 64];
        loop {
            let n = self.vfs.read(&self.task, h, &mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        self.vfs.close(&self.task, h).unwrap();
        out
    }

    pub fn symlink(&self, path: &str, target: &str) {
        self.vfs.create_symlink(&self.task, None, path, target).unwrap();
    }

    pub fn open(&self, path: &str, bits: u32) -> VfsResult<Handle> {
        self.vfs.open(&self.task, None, path, flags(bits), 0o644)
    }

    pub fn resolve(&self, path: &str) -> VfsResult<InodeRef> {
        self.vfs.locate_by_path(&self.task, None, path, LookupFlags::FULL)
    }

    pub fn cwd(&self) -> String {
        self.vfs.getcwd(&self.task, self.vfs.config().path_max).unwrap()
    }
}

/// Tests: [G1] init is idempotent, [G2] the instance is reachable afterwards
#[test]
fn test_global_init() {
    let first = crate::init(VfsConfig::default()).unwrap();
    let second = crate::init(VfsConfig {
        max_handles: 1,
        ..VfsConfig::default()
    })
    .unwrap();
    assert!(core::ptr::eq(first, second)); // [G1]
    assert_eq!(second.config().max_handles, crate::config::MAX_HANDLES);
    assert!(crate::vfs().is_some_and(|v| core::ptr::eq(v, first))); // [G2]
}

/// Tests: the root volume comes up with "/dev" and the tmpfs driver registered
#[test]
fn test_fresh_instance() {
    let fx = setup();
    assert_eq!(fx.vfs.volumes().len(), 1);
    assert_eq!(fx.vfs.root_volume().id(), crate::volume::VOLID_ROOT);
    assert!(fx.vfs.find_filesystem("tmpfs").is_some());
    assert!(fx.resolve("/dev").unwrap().is_dir());
    assert_eq!(fx.cwd(), "/");
}
