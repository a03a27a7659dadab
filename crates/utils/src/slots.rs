//! TEAM_470: Sparse slot table with reservation.
//!
//! Slots go Free -> Reserved -> Occupied. A reserved slot has a number but
//! no value yet, so callers can hand out the number, do fallible work, and
//! then either fill the slot or release it. Freed numbers are reused
//! lowest-first, like POSIX descriptors.

use alloc::vec::Vec;

enum Slot<T> {
    Free,
    Reserved,
    Occupied(T),
}

/// TEAM_470: Table of numbered slots, capped at `limit` entries.
pub struct SlotTable<T> {
    slots: Vec<Slot<T>>,
    limit: usize,
}

impl<T> SlotTable<T> {
    pub const fn new(limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// [T1] Reserves the lowest free slot, [T2] None when full
    pub fn reserve(&mut self) -> Option<usize> {
        if let Some(index) = self.slots.iter().position(|s| matches!(s, Slot::Free)) {
            self.slots[index] = Slot::Reserved;
            return Some(index);
        }
        if self.slots.len() >= self.limit {
            return None; // [T2]
        }
        self.slots.push(Slot::Reserved);
        Some(self.slots.len() - 1)
    }

    /// [T3] Fills a reserved slot. Returns the value back if the slot was not reserved.
    pub fn fill(&mut self, index: usize, value: T) -> Result<(), T> {
        match self.slots.get_mut(index) {
            Some(slot @ Slot::Reserved) => {
                *slot = Slot::Occupied(value);
                Ok(())
            }
            _ => Err(value),
        }
    }

    /// [T4] Stores `value` at `index`, returning the displaced value.
    /// Grows the table as needed; fails if `index` is past the limit or
    /// the slot is reserved by someone else.
    pub fn replace(&mut self, index: usize, value: T) -> Result<Option<T>, T> {
        if index >= self.limit || self.is_reserved(index) {
            return Err(value);
        }
        while self.slots.len() <= index {
            self.slots.push(Slot::Free);
        }
        match core::mem::replace(&mut self.slots[index], Slot::Occupied(value)) {
            Slot::Occupied(old) => Ok(Some(old)),
            Slot::Free | Slot::Reserved => Ok(None),
        }
    }

    /// [T5] Frees a slot (reserved or occupied), returning its value if any
    pub fn release(&mut self, index: usize) -> Option<T> {
        let slot = self.slots.get_mut(index)?;
        let old = core::mem::replace(slot, Slot::Free);
        while matches!(self.slots.last(), Some(Slot::Free)) {
            self.slots.pop();
        }
        match old {
            Slot::Occupied(value) => Some(value),
            Slot::Free | Slot::Reserved => None,
        }
    }

    /// [T6] Only occupied slots are visible
    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Occupied(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_reserved(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(Slot::Reserved))
    }

    /// Number of occupied slots
    pub fn occupied(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, Slot::Occupied(_)))
            .count()
    }

    /// Empties the table, returning every bound value
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        for slot in self.slots.drain(..) {
            if let Slot::Occupied(value) = slot {
                values.push(value);
            }
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Tests: [T1] lowest free, [T5] release makes the number reusable
    #[test]
    fn test_reserve_reuses_lowest() {
        let mut table = SlotTable::<u8>::new(8);
        assert_eq!(table.reserve(), Some(0));
        assert_eq!(table.reserve(), Some(1));
        assert_eq!(table.reserve(), Some(2));
        assert_eq!(table.release(1), None); // reserved, nothing bound
        assert_eq!(table.reserve(), Some(1)); // [T1]
        assert_eq!(table.reserve(), Some(3));
    }

    /// Tests: [T2] limit
    #[test]
    fn test_reserve_respects_limit() {
        let mut table: SlotTable<u8> = SlotTable::new(2);
        assert!(table.reserve().is_some());
        assert!(table.reserve().is_some());
        assert_eq!(table.reserve(), None);
    }

    /// Tests: [T3] fill, [T6] reserved slots are not visible
    #[test]
    fn test_fill_reserved_only() {
        let mut table = SlotTable::new(4);
        let n = table.reserve().unwrap();
        assert!(table.is_reserved(n));
        assert_eq!(table.get(n), None); // [T6]
        assert_eq!(table.fill(n, 'a'), Ok(()));
        assert_eq!(table.get(n), Some(&'a'));
        assert_eq!(table.fill(n, 'b'), Err('b')); // already occupied
        assert_eq!(table.fill(3, 'c'), Err('c')); // never reserved
        assert_eq!(table.occupied(), 1);
    }

    /// Tests: [T4] replace grows, displaces, and leaves reservations alone
    #[test]
    fn test_replace() {
        let mut table = SlotTable::new(4);
        assert_eq!(table.replace(2, 10), Ok(None));
        assert_eq!(table.replace(2, 11), Ok(Some(10)));
        assert_eq!(table.replace(4, 12), Err(12));
        assert_eq!(table.reserve(), Some(0)); // slots below 2 are still free
        assert_eq!(table.replace(0, 13), Err(13)); // reserved by someone else
        assert_eq!(table.release(2), Some(11));
        assert_eq!(table.drain(), std::vec::Vec::<i32>::new());
    }
}
