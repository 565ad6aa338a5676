pub mod simulation;
pub mod configuration;

pub use simulation::states::{Particle, NVec3};
pub use simulation::store::{ParticleStore, StoreError, GROWTH_STEP};
pub use simulation::boundary::{Boundary, ContainmentFilter, OpenBox, Unbounded};
pub use simulation::domain::{Decomposition, DomainError, DomainGeometry};
pub use simulation::index::{ApproximateGravity, ApproximateSolver, NoIndex, NoSolver, SpatialIndex};
pub use simulation::transport::{SendQueue, Transport};
pub use simulation::barnes_hut::Octree;
pub use simulation::registry::{DiagnosticPolicy, InsertOutcome, RadiusExtrema, Registry};
pub use simulation::scenario::{InsertReport, Scenario, ScenarioError};

pub use configuration::config::{BodyConfig, BoundaryConfig, DiagnosticsConfig, DomainConfig, EngineConfig, ParametersConfig, ScenarioConfig};
