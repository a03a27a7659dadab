//! TEAM_470: Scope guards.
//!
//! Runs a closure on a value when the guard leaves scope, unless the guard
//! is dismissed first. Used for allocate/commit/rollback sequences where
//! every early `?` return has to undo a partial step.

use core::mem::ManuallyDrop;
use core::ops::{Deref, DerefMut};

/// TEAM_470: Calls `on_exit(value)` on drop unless [`ScopeGuard::dismiss`]ed.
pub struct ScopeGuard<T, F: FnOnce(T)> {
    value: ManuallyDrop<T>,
    on_exit: ManuallyDrop<F>,
}

impl<T, F: FnOnce(T)> ScopeGuard<T, F> {
    /// [G1] Arms the guard
    pub fn new(value: T, on_exit: F) -> Self {
        Self {
            value: ManuallyDrop::new(value),
            on_exit: ManuallyDrop::new(on_exit),
        }
    }

    /// [G3] Disarms the guard and hands the value back without running `on_exit`
    pub fn dismiss(guard: Self) -> T {
        let mut guard = ManuallyDrop::new(guard);
        // SAFETY: `guard` is never dropped, so each field is taken exactly once.
        unsafe {
            ManuallyDrop::drop(&mut guard.on_exit);
            ManuallyDrop::take(&mut guard.value)
        }
    }
}

impl<T, F: FnOnce(T)> Deref for ScopeGuard<T, F> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, F: FnOnce(T)> DerefMut for ScopeGuard<T, F> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, F: FnOnce(T)> Drop for ScopeGuard<T, F> {
    /// [G2] Runs `on_exit` on every exit path
    fn drop(&mut self) {
        // SAFETY: drop runs once and `dismiss` bypasses it entirely.
        let (value, on_exit) = unsafe {
            (
                ManuallyDrop::take(&mut self.value),
                ManuallyDrop::take(&mut self.on_exit),
            )
        };
        on_exit(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// Tests: [G1] armed guard, [G2] runs on scope exit
    #[test]
    fn test_guard_runs_on_drop() {
        let fired = Cell::new(0);
        {
            let _g = ScopeGuard::new(5, |v| fired.set(v));
            assert_eq!(fired.get(), 0);
        }
        assert_eq!(fired.get(), 5);
    }

    /// Tests: [G2] runs on early error return
    #[test]
    fn test_guard_runs_on_early_return() {
        fn step(fired: &Cell<bool>, fail: bool) -> Result<u32, ()> {
            let g = ScopeGuard::new(1, |_| fired.set(true));
            if fail {
                return Err(());
            }
            Ok(ScopeGuard::dismiss(g))
        }

        let fired = Cell::new(false);
        assert_eq!(step(&fired, true), Err(()));
        assert!(fired.get());

        fired.set(false);
        assert_eq!(step(&fired, false), Ok(1));
        assert!(!fired.get());
    }

    /// Tests: [G3] dismiss returns the value, deref reaches it
    #[test]
    fn test_guard_dismiss_and_deref() {
        let fired = Cell::new(false);
        let mut g = ScopeGuard::new(std::vec![1, 2], |_| fired.set(true));
        g.push(3);
        assert_eq!(g.len(), 3);
        let v = ScopeGuard::dismiss(g);
        assert_eq!(v, std::vec![1, 2, 3]);
        assert!(!fired.get());
    }
}
