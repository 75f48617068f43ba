use bitvec::prelude::*;
use std::ops::{Index, IndexMut};

/// Slot storage with stable indices. Released slots are recycled by later
/// allocations, so an index stays valid until it is released or taken.
#[derive(Debug, Clone)]
pub struct FlaggedStorage<T: Default> {
    storage: Vec<T>,
    active: BitVec,
    empty_slots: Vec<usize>,
}

impl<T: Default> Default for FlaggedStorage<T> {
    fn default() -> Self {
        Self {
            storage: Vec::new(),
            active: BitVec::new(),
            empty_slots: Vec::new(),
        }
    }
}

impl<T: Default> FlaggedStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.active.get(index).map(|b| *b).unwrap_or(false)
    }

    fn allocate(&mut self) -> usize {
        while let Some(index) = self.empty_slots.pop() {
            if !self.active[index] {
                self.active.set(index, true);
                return index;
            }
        }

        let index = self.storage.len();
        self.storage.push(T::default());
        self.active.push(true);
        index
    }

    pub fn push(&mut self, val: T) -> usize {
        let index = self.allocate();
        self.storage[index] = val;
        index
    }

    /// Releases index but does not overwrite memory at index
    pub fn release(&mut self, index: usize) -> bool {
        if !self.contains(index) {
            return false;
        }

        self.active.set(index, false);
        self.empty_slots.push(index);
        true
    }

    /// Moves the value out of its slot and releases the slot.
    pub fn take(&mut self, index: usize) -> Option<T> {
        if !self.release(index) {
            return None;
        }

        Some(std::mem::take(&mut self.storage[index]))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        if self.contains(index) {
            Some(&self.storage[index])
        } else {
            None
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if self.contains(index) {
            Some(&mut self.storage[index])
        } else {
            None
        }
    }
}

impl<T: Default> Index<usize> for FlaggedStorage<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            Some(v) => v,
            None => panic!("index {} was not active", index),
        }
    }
}

impl<T: Default> IndexMut<usize> for FlaggedStorage<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("index {} was not active", index),
        }
    }
}

/// [`FlaggedStorage`] that additionally records which slots were touched
/// since the last call to [`TrackedStorage::reset_changed`].
#[derive(Debug, Clone)]
pub struct TrackedStorage<T: Default> {
    storage: FlaggedStorage<T>,
    changed: BitVec,
}

impl<T: Default> Default for TrackedStorage<T> {
    fn default() -> Self {
        Self {
            storage: FlaggedStorage::default(),
            changed: BitVec::new(),
        }
    }
}

impl<T: Default> TrackedStorage<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.storage.contains(index)
    }

    fn mark(&mut self, index: usize) {
        if self.changed.len() <= index {
            self.changed.resize(index + 1, false);
        }
        self.changed.set(index, true);
    }

    pub fn push(&mut self, val: T) -> usize {
        let index = self.storage.push(val);
        self.mark(index);
        index
    }

    pub fn take(&mut self, index: usize) -> Option<T> {
        let val = self.storage.take(index)?;
        self.mark(index);
        Some(val)
    }

    /// Return immutable reference to index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.storage.get(index)
    }

    /// Returns mutable reference to index.
    /// Sets changed flag to true.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        if !self.storage.contains(index) {
            return None;
        }

        self.mark(index);
        self.storage.get_mut(index)
    }

    /// Returns whether any changed flag is set.
    pub fn any_changed(&self) -> bool {
        self.changed.any()
    }

    pub fn reset_changed(&mut self) {
        self.changed.fill(false);
    }
}

impl<T: Default> Index<usize> for TrackedStorage<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.storage[index]
    }
}

impl<T: Default> IndexMut<usize> for TrackedStorage<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        self.mark(index);
        &mut self.storage[index]
    }
}
