//! Core state types for the particle registry.
//!
//! Defines the 3D `Particle` value type. Particles are copied into the store
//! by value; nothing outside the store holds references into it, only slot
//! indices.

use nalgebra::Vector3;
pub type NVec3 = Vector3<f64>;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Particle {
    pub x: NVec3, // position
    pub v: NVec3, // velocity
    pub a: NVec3, // acceleration
    pub m: f64, // mass
    pub r: f64, // interaction radius
}

impl Particle {
    /// Particle at rest at `x` with mass `m` and radius `r`
    pub fn at(x: NVec3, m: f64, r: f64) -> Self {
        Self {
            x,
            v: NVec3::zeros(),
            a: NVec3::zeros(),
            m,
            r,
        }
    }

    /// Same particle with velocity `v`
    pub fn with_velocity(mut self, v: NVec3) -> Self {
        self.v = v;
        self
    }
}
