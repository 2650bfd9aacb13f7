//! Two-slot arena with a toggled "current" index.
//!
//! Slots never move. `swap` flips an index, so it is O(1) and never touches
//! the slot contents. Each slot carries the generation (number of completed
//! updates) of the state it holds, which lets callers check that reads always
//! see the latest committed step.

/// Role of a slot at a given instant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Last fully written state; safe to read.
    Current,
    /// Target of the in-flight write.
    Next,
}

#[derive(Debug)]
pub struct PingPong<T> {
    slots: [T; 2],
    generations: [u64; 2],
    current: usize,
}

impl<T> PingPong<T> {
    /// Slot 0 starts as current at generation 0.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            generations: [0, 0],
            current: 0,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn next_index(&self) -> usize {
        1 - self.current
    }

    pub fn role_of(&self, slot: usize) -> Role {
        if slot == self.current {
            Role::Current
        } else {
            Role::Next
        }
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    /// Current slot for reading, next slot for writing, disjoint borrows.
    pub fn split(&mut self) -> (&T, &mut T) {
        let [a, b] = &mut self.slots;
        if self.current == 0 {
            (a, b)
        } else {
            (b, a)
        }
    }

    pub fn slot(&self, index: usize) -> &T {
        &self.slots[index]
    }

    pub fn slots(&self) -> &[T; 2] {
        &self.slots
    }

    /// Number of completed updates held by the current slot.
    pub fn generation(&self) -> u64 {
        self.generations[self.current]
    }

    pub fn slot_generation(&self, index: usize) -> u64 {
        self.generations[index]
    }

    /// Record that `next` now holds `current` advanced by one update, then
    /// swap roles. This is the only way the generation moves forward.
    pub fn commit(&mut self) {
        let next = self.next_index();
        self.generations[next] = self.generations[self.current] + 1;
        self.swap();
    }

    /// Exchange roles without touching slot contents.
    pub fn swap(&mut self) {
        self.current = self.next_index();
    }

    /// Reset both slots to hold generation 0 (after reseeding).
    pub fn reset_generations(&mut self) {
        self.generations = [0, 0];
    }

    pub fn into_slots(self) -> [T; 2] {
        self.slots
    }
}
