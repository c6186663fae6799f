//! Growable, ordered registry of discovered sinks.
//!
//! Capacity doubles from a small floor up to a hard limit supplied by the
//! caller; hitting the limit is a fatal error. Capacity bookkeeping is kept
//! explicit (rather than delegated to `Vec`) so the growth policy is
//! observable and the limit is enforced exactly.

use crate::models::error::ControlError;

/// Minimum capacity allocated on first growth.
const CAPACITY_FLOOR: usize = 8;

/// Ordered collection with doubling growth and a hard capacity limit.
#[derive(Debug)]
pub struct Registry<T> {
    items: Vec<T>,
    capacity: usize,
    limit: usize,
}

impl<T> Registry<T> {
    /// Empty registry that may grow up to `limit` elements.
    pub fn new(limit: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity: 0,
            limit,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append, growing the backing store if full.
    pub fn push(&mut self, item: T) -> Result<(), ControlError> {
        if self.items.len() == self.capacity {
            self.grow()?;
        }
        self.items.push(item);
        Ok(())
    }

    /// Stored element at `i`, or `None` past the end.
    pub fn get(&self, i: usize) -> Option<&T> {
        self.items.get(i)
    }

    /// Remove and return the last element.
    pub fn remove_last(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// Remove and return the element at `i`, shifting later elements down
    /// one slot. Order of the remaining elements is preserved.
    pub fn remove_at(&mut self, i: usize) -> Option<T> {
        if i >= self.items.len() {
            return None;
        }
        Some(self.items.remove(i))
    }

    /// Drop all elements. Capacity is retained.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    fn grow(&mut self) -> Result<(), ControlError> {
        if self.capacity >= self.limit {
            return Err(ControlError::RegistryLimit);
        }
        let next = if self.capacity == 0 {
            CAPACITY_FLOOR
        } else {
            self.capacity.saturating_mul(2)
        };
        self.capacity = next.min(self.limit);
        self.items.reserve(self.capacity - self.items.len());
        Ok(())
    }
}
