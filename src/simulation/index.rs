//! Spatial index and approximate-solver hooks used by the registry
//!
//! The registry tells the spatial index about every slot it writes and lets
//! an approximate gravity solver track the smallest mass it has seen. Both
//! default to no-op implementations.

use crate::simulation::states::Particle;

pub trait SpatialIndex {
    /// Slot `index` of `particles` was just written
    fn notify_insert(&mut self, index: usize, particles: &[Particle]);

    /// Slot `index` no longer exists; no-op if it was never indexed
    fn remove(&mut self, index: usize);

    /// Forget every slot
    fn clear(&mut self);

    /// Number of slots currently indexed
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Used when no tree is configured
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIndex;

impl SpatialIndex for NoIndex {
    fn notify_insert(&mut self, _index: usize, _particles: &[Particle]) {}

    fn remove(&mut self, _index: usize) {}

    fn clear(&mut self) {}

    fn len(&self) -> usize {
        0
    }
}

/// Force solver whose error bound depends on the lightest particle
pub trait ApproximateSolver {
    /// Minimum-mass threshold, `None` if the solver does not keep one
    fn minimum_mass_mut(&mut self) -> Option<&mut f64>;

    fn minimum_mass(&self) -> Option<f64>;
}

/// Used when gravity is evaluated exactly
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSolver;

impl ApproximateSolver for NoSolver {
    fn minimum_mass_mut(&mut self) -> Option<&mut f64> {
        None
    }

    fn minimum_mass(&self) -> Option<f64> {
        None
    }
}

/// Approximate gravity settings carried by the registry
#[derive(Debug, Clone, Copy)]
pub struct ApproximateGravity {
    pub minimum_mass: f64,
}

impl Default for ApproximateGravity {
    fn default() -> Self {
        Self {
            minimum_mass: f64::MAX,
        }
    }
}

impl ApproximateSolver for ApproximateGravity {
    fn minimum_mass_mut(&mut self) -> Option<&mut f64> {
        Some(&mut self.minimum_mass)
    }

    fn minimum_mass(&self) -> Option<f64> {
        Some(self.minimum_mass)
    }
}
