#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod guard;
pub mod slots;

// TEAM_211: Re-export spin crate types as our lock API
// Note: spin::Mutex is re-exported as Mutex for API compatibility
pub use spin::Once;
pub use spin::{Mutex, MutexGuard};
pub use spin::{RwLock, RwLockReadGuard, RwLockWriteGuard};

// TEAM_212: Re-export hashbrown collections
pub use hashbrown::HashMap;

pub use guard::ScopeGuard;
pub use slots::SlotTable;

// ============================================================================
// Unit Tests
// ============================================================================
