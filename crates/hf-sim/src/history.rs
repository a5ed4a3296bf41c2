//! Bounded history of accepted states.

use std::collections::VecDeque;

use crate::fracture::Fracture;

/// Ring of the most recent accepted generations.
///
/// States are moved in, so accepting a step never copies its arrays. The
/// latest generation is always present.
#[derive(Debug, Clone)]
pub struct FractureHistory {
    capacity: usize,
    ring: VecDeque<Fracture>,
    /// Generation number of the oldest entry
    first: usize,
}

impl FractureHistory {
    pub fn new(initial: Fracture, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut ring = VecDeque::with_capacity(capacity);
        ring.push_back(initial);
        Self {
            capacity,
            ring,
            first: 0,
        }
    }

    pub fn latest(&self) -> &Fracture {
        // never empty: constructed with one entry and `push` only evicts when full
        &self.ring[self.ring.len() - 1]
    }

    /// Generation number of the latest state.
    pub fn generation(&self) -> usize {
        self.first + self.ring.len() - 1
    }

    pub fn get(&self, generation: usize) -> Option<&Fracture> {
        generation
            .checked_sub(self.first)
            .and_then(|k| self.ring.get(k))
    }

    /// Append an accepted state, evicting the oldest when full.
    pub fn push(&mut self, next: Fracture) -> usize {
        if self.ring.len() == self.capacity {
            self.ring.pop_front();
            self.first += 1;
        }
        self.ring.push_back(next);
        self.generation()
    }

    /// Replace every stored state, e.g. after the mesh changed. Generation
    /// numbering continues.
    pub fn restart(&mut self, state: Fracture) -> usize {
        let next = self.generation() + 1;
        self.ring.clear();
        self.ring.push_back(state);
        self.first = next;
        next
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fracture> {
        self.ring.iter()
    }
}
