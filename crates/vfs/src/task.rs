//! TEAM_470: Per-thread resolution state.
//!
//! Path resolution needs two things from the caller: which IO context the
//! call runs in, and the calling thread's symlink nesting counter. Each
//! kernel thread owns one [`Task`]; threads of a process share the
//! process's [`IoContextRef`].

use core::sync::atomic::{AtomicU32, Ordering};

use los_utils::ScopeGuard;

use crate::error::{VfsError, VfsResult};
use crate::io_context::IoContextRef;

pub trait TaskContext: Send + Sync {
    /// Context for handles without the kernel selector bit
    fn io_context(&self) -> &IoContextRef;

    /// Symlink nesting depth. Owned by one thread and never shared.
    fn symlink_depth(&self) -> &AtomicU32;
}

pub struct Task {
    io_context: IoContextRef,
    symlink_depth: AtomicU32,
}

impl Task {
    pub fn new(io_context: IoContextRef) -> Self {
        Self {
            io_context,
            symlink_depth: AtomicU32::new(0),
        }
    }
}

impl TaskContext for Task {
    fn io_context(&self) -> &IoContextRef {
        &self.io_context
    }

    fn symlink_depth(&self) -> &AtomicU32 {
        &self.symlink_depth
    }
}

/// TEAM_470: Bump `depth` for the lifetime of the returned guard.
///
/// Fails with `Loop` when the new depth exceeds `max`; the counter is
/// restored on that path too.
pub(crate) fn enter_symlink_scope<'a>(
    depth: &'a AtomicU32,
    max: u32,
) -> VfsResult<ScopeGuard<&'a AtomicU32, impl FnOnce(&'a AtomicU32) + 'a>> {
    let level = depth.fetch_add(1, Ordering::Relaxed) + 1;
    let guard = ScopeGuard::new(depth, |d: &'a AtomicU32| {
        d.fetch_sub(1, Ordering::Relaxed);
    });
    if level > max {
        return Err(VfsError::Loop);
    }
    Ok(guard)
}
