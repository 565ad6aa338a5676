//! Containment filtering for the simulated volume
//!
//! Only an open box actually rejects anything; periodic and unbounded
//! configurations admit every particle. The filter remembers whether it has
//! already complained so the out-of-box warning is printed once.

use crate::simulation::domain::DomainGeometry;
use crate::simulation::states::{NVec3, Particle};

/// Geometric predicate over the simulated volume
pub trait Boundary {
    fn is_in_box(&self, p: &Particle) -> bool;
}

/// No walls: every particle is admitted
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Boundary for Unbounded {
    fn is_in_box(&self, _p: &Particle) -> bool {
        true
    }
}

/// Finite box centred on the origin; particles outside it are discarded
#[derive(Debug, Clone)]
pub struct OpenBox {
    half: NVec3,
}

impl OpenBox {
    pub fn new(geometry: &DomainGeometry) -> Self {
        Self {
            half: geometry.half_extent(),
        }
    }
}

impl Boundary for OpenBox {
    fn is_in_box(&self, p: &Particle) -> bool {
        p.x.x.abs() <= self.half.x && p.x.y.abs() <= self.half.y && p.x.z.abs() <= self.half.z
    }
}

pub struct ContainmentFilter {
    boundary: Box<dyn Boundary>,
    warned: bool,
}

impl Default for ContainmentFilter {
    fn default() -> Self {
        Self::new(Unbounded)
    }
}

impl ContainmentFilter {
    pub fn new(boundary: impl Boundary + 'static) -> Self {
        Self {
            boundary: Box::new(boundary),
            warned: false,
        }
    }

    /// Admit or reject `p`, warning on the first rejection only
    pub fn admit(&mut self, p: &Particle) -> bool {
        if self.boundary.is_in_box(p) {
            return true;
        }
        if !self.warned {
            self.warned = true;
            tracing::warn!(
                x = p.x.x,
                y = p.x.y,
                z = p.x.z,
                "trying to add particle which is outside box boundaries"
            );
        }
        false
    }

    /// Admit or reject `p` without ever warning
    pub fn admit_quietly(&self, p: &Particle) -> bool {
        self.boundary.is_in_box(p)
    }

    pub fn warned(&self) -> bool {
        self.warned
    }
}
