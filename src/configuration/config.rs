//! Configuration types for loading registry scenarios from YAML.
//!
//! A scenario consists of:
//!
//! - [`EngineConfig`]     – which optional capabilities are switched on
//! - [`DomainConfig`]     – root box geometry and process layout
//! - [`ParametersConfig`] – registry counters set before any insertion
//! - [`BodyConfig`]       – initial state for each body
//! - [`ScenarioConfig`]   – top-level wrapper used to load a scenario from YAML
//!
//! # YAML format
//!
//! ```yaml
//! engine:
//!   boundary: "open"          # "open", "periodic" or "none"
//!   tree: true                # maintain an octree spatial index
//!   approximate_gravity: true # track the minimum mass
//!   diagnostics: "warn"       # or "reject"
//!
//! domain:
//!   boxsize: 1.0              # root cell edge
//!   root: [2, 2, 1]           # root cells per axis
//!   processes: 2
//!   rank: 0
//!
//! parameters:
//!   n_active: 1
//!
//! bodies:
//!   - x: [ 0.0, 0.0, 0.0 ]
//!     v: [ 0.0, 0.0, 0.0 ]
//!     m: 1.0
//!     radius: 0.02
//! ```

use serde::Deserialize;

/// How the edges of the simulated box behave
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryConfig {
    #[serde(rename = "open")] // particles outside the box are discarded
    Open,

    #[serde(rename = "periodic")] // particles wrap; nothing is discarded
    Periodic,

    #[serde(rename = "none")] // no box at all
    Unbounded,
}

/// Behaviour of ordinary insertion after diagnostic particles exist
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticsConfig {
    #[default]
    #[serde(rename = "warn")]
    Warn,

    #[serde(rename = "reject")]
    Reject,
}

/// Optional capabilities of the registry
#[derive(Deserialize, Debug, Clone)]
pub struct EngineConfig {
    pub boundary: BoundaryConfig,
    #[serde(default)]
    pub tree: bool, // keep an octree over the store
    #[serde(default)]
    pub approximate_gravity: bool, // track the minimum mass for an approximate solver
    #[serde(default)]
    pub diagnostics: DiagnosticsConfig,
}

/// Root box geometry and process layout
#[derive(Deserialize, Debug, Clone)]
pub struct DomainConfig {
    pub boxsize: f64, // root cell edge
    pub root: [usize; 3], // root cells per axis
    #[serde(default = "default_processes")]
    pub processes: usize,
    #[serde(default)]
    pub rank: usize,
}

fn default_processes() -> usize {
    1
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ParametersConfig {
    pub n_active: Option<usize>, // active/test particle boundary, unset = all active
}

/// Configuration for a single body's initial state
#[derive(Deserialize, Debug, Clone)]
pub struct BodyConfig {
    pub x: Vec<f64>, // position
    pub v: Vec<f64>, // velocity
    pub m: f64,      // mass
    pub radius: f64, // interaction radius
}

/// Top-level scenario configuration loaded from YAML.
#[derive(Deserialize, Debug, Clone)]
pub struct ScenarioConfig {
    pub engine: EngineConfig,
    pub domain: DomainConfig,
    #[serde(default)]
    pub parameters: ParametersConfig,
    #[serde(default)]
    pub bodies: Vec<BodyConfig>,
}
