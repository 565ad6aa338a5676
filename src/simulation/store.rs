//! Growable particle storage
//!
//! `ParticleStore` owns the dense particle buffer and the counters that
//! describe it:
//! - `len`        : live particles, slots `[0, len)`
//! - `capacity`   : allocated slots, grown in steps of [`GROWTH_STEP`]
//! - `n_active`   : active/test boundary, `None` means every particle is active
//! - `n_diagnostic`: trailing MEGNO particles
//!
//! Slot indices are handles: the store never compacts or reuses them until
//! [`ParticleStore::reset`].

use thiserror::Error;

use crate::simulation::states::Particle;

/// Number of slots added every time the store runs out of room
pub const GROWTH_STEP: usize = 128;

#[derive(Debug, Error, PartialEq)]
pub enum StoreError {
    #[error("slot {index} is not live (store holds {len} particles)")]
    SlotOutOfRange { index: usize, len: usize },

    #[error("count {requested} exceeds capacity {capacity}")]
    CountExceedsCapacity { requested: usize, capacity: usize },

    #[error("capacity {requested} is below the live count {len}")]
    CapacityBelowCount { requested: usize, len: usize },
}

#[derive(Debug, Clone)]
pub struct ParticleStore {
    particles: Vec<Particle>,
    capacity: usize,
    n_active: Option<usize>,
    n_diagnostic: usize,
}

impl Default for ParticleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParticleStore {
    /// Empty store, nothing allocated
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            capacity: 0,
            n_active: None,
            n_diagnostic: 0,
        }
    }

    /// Append `p` and return its slot index.
    ///
    /// Capacity grows by whole [`GROWTH_STEP`] blocks until it is strictly
    /// larger than the current count. An allocation failure aborts the
    /// process.
    pub fn append(&mut self, p: Particle) -> usize {
        let index = self.particles.len();
        if self.capacity <= index {
            while self.capacity <= index {
                self.capacity += GROWTH_STEP;
            }
            self.particles
                .reserve_exact(self.capacity - self.particles.len());
            tracing::debug!(capacity = self.capacity, "particle store grown");
        }
        self.particles.push(p);
        index
    }

    /// Overwrite the live slot `index` in place
    pub fn write_at(&mut self, p: Particle, index: usize) -> Result<(), StoreError> {
        let len = self.particles.len();
        let slot = self
            .particles
            .get_mut(index)
            .ok_or(StoreError::SlotOutOfRange { index, len })?;
        *slot = p;
        Ok(())
    }

    /// Release the buffer and return every counter to its initial value
    pub fn reset(&mut self) {
        self.particles = Vec::new();
        self.capacity = 0;
        self.n_active = None;
        self.n_diagnostic = 0;
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn n_active(&self) -> Option<usize> {
        self.n_active
    }

    pub fn n_diagnostic(&self) -> usize {
        self.n_diagnostic
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    /// Set the live count.
    ///
    /// Shrinking truncates; growing (up to capacity) fills the new slots with
    /// zeroed particles for the caller to overwrite.
    pub fn set_len(&mut self, n: usize) -> Result<(), StoreError> {
        if n > self.capacity {
            return Err(StoreError::CountExceedsCapacity {
                requested: n,
                capacity: self.capacity,
            });
        }
        self.particles.resize(n, Particle::default());
        Ok(())
    }

    /// Set the slot capacity; it may not drop below the live count
    pub fn set_capacity(&mut self, n: usize) -> Result<(), StoreError> {
        let len = self.particles.len();
        if n < len {
            return Err(StoreError::CapacityBelowCount { requested: n, len });
        }
        if n > self.particles.capacity() {
            self.particles.reserve_exact(n - len);
        }
        self.capacity = n;
        Ok(())
    }

    pub fn set_n_active(&mut self, n: Option<usize>) {
        self.n_active = n;
    }

    pub fn set_n_diagnostic(&mut self, n: usize) {
        self.n_diagnostic = n;
    }
}
