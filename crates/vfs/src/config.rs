//! TEAM_470: VFS tunables and fixed limits.

use linux_raw_sys::general::{NAME_MAX as RAW_NAME_MAX, PATH_MAX as RAW_PATH_MAX};

/// Longest path the kernel accepts, including the reconstructed cwd
pub const PATH_MAX: usize = RAW_PATH_MAX as usize;

/// Longest single path component
pub const NAME_MAX: usize = RAW_NAME_MAX as usize;

/// Nested symlink expansions allowed on one thread
pub const SYMLINK_DEPTH_MAX: u32 = 5;

/// Links followed in a single chain before giving up
pub const SYMLINK_LOOP_MAX: u32 = 16;

/// Default handle table capacity per IO context
pub const MAX_HANDLES: usize = 256;

/// Limits applied by a [`crate::Vfs`] instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VfsConfig {
    /// Recursion bound for symlinks appearing inside link targets
    pub symlink_depth_max: u32,
    /// Iteration bound for one link chain
    pub symlink_loop_max: u32,
    /// Longest link target that will be read
    pub symlink_len_max: usize,
    /// Capacity for reconstructed directory paths
    pub path_max: usize,
    /// Handle slots per IO context
    pub max_handles: usize,
}

impl Default for VfsConfig {
    fn default() -> Self {
        Self {
            symlink_depth_max: SYMLINK_DEPTH_MAX,
            symlink_loop_max: SYMLINK_LOOP_MAX,
            symlink_len_max: PATH_MAX,
            path_max: PATH_MAX,
            max_handles: MAX_HANDLES,
        }
    }
}
