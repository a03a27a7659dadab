//! TEAM_470: LevitateOS VFS core
//!
//! Turns paths and handle numbers into driver-backed filesystem objects:
//! path resolution, symlink following, mount traversal and per-process
//! handle tables. Storage lives in pluggable [`FilesystemDriver`]s; the
//! built-in [`tmpfs`] backs the root volume.
//!
//! Call [`init`] once during boot, then reach the instance with [`vfs`].

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod config;
mod dirname;
mod dispatch;
pub mod driver;
pub mod error;
pub mod file;
pub mod inode;
pub mod io_context;
#[cfg(any(test, feature = "std"))]
pub mod logger;
pub mod manager;
pub mod mode;
pub mod path;
pub mod stat;
pub mod syscall;
pub mod task;
pub mod tmpfs;
pub mod volume;

#[cfg(test)]
mod tests;

use los_utils::Once;

pub use config::VfsConfig;
pub use driver::{DriverRef, FileOps, FileOpsRef, FilesystemDriver};
pub use error::{VfsError, VfsResult};
pub use file::{FileRef, FileTableNode, NodeKind, OpenFlags, SeekWhence};
pub use inode::{Inode, InodeRef};
pub use io_context::{Handle, IoContext, IoContextRef, KERNEL_HANDLE_FLAG};
pub use manager::Vfs;
pub use path::LookupFlags;
pub use stat::{DirEntry, Stat, StatMask};
pub use task::{Task, TaskContext};
pub use volume::{VOLID_FIRST_NORMAL, VOLID_ROOT, Volume, VolumeFlags, VolumeId, VolumeRef};

static VFS: Once<Vfs> = Once::new();

/// TEAM_470: Build the global VFS. Later calls return the existing instance
/// and ignore `config`.
pub fn init(config: VfsConfig) -> VfsResult<&'static Vfs> {
    if let Some(vfs) = VFS.get() {
        return Ok(vfs);
    }
    let vfs = Vfs::new(config)?;
    Ok(VFS.call_once(|| vfs))
}

/// The global VFS, once [`init`] has run
pub fn vfs() -> Option<&'static Vfs> {
    VFS.get()
}
