//! High-level runtime engine settings
//!
//! Selects which optional registry capabilities are switched on when a
//! `Scenario` is built

use crate::configuration::config::{BoundaryConfig, DiagnosticsConfig, EngineConfig};
use crate::simulation::registry::DiagnosticPolicy;

#[derive(Debug, Clone)]
pub struct Engine {
    pub open_boundary: bool, // true = discard particles outside the box
    pub tree: bool, // true = octree spatial index
    pub approximate_gravity: bool, // true = track minimum mass
    pub diagnostics: DiagnosticPolicy, // insertion after MEGNO particles
}

impl From<&EngineConfig> for Engine {
    fn from(cfg: &EngineConfig) -> Self {
        Self {
            open_boundary: cfg.boundary == BoundaryConfig::Open,
            tree: cfg.tree,
            approximate_gravity: cfg.approximate_gravity,
            diagnostics: match cfg.diagnostics {
                DiagnosticsConfig::Warn => DiagnosticPolicy::Warn,
                DiagnosticsConfig::Reject => DiagnosticPolicy::Reject,
            },
        }
    }
}
