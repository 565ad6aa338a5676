//! Build a populated registry from configuration
//!
//! Takes a `ScenarioConfig` (YAML-facing) and produces a `Scenario` holding:
//! - engine settings (`Engine`)
//! - box geometry (`DomainGeometry`)
//! - a `Registry` with every configured body pushed through `insert`
//! - a tally of what happened to those bodies (`InsertReport`)

use thiserror::Error;

use crate::configuration::config::{BodyConfig, ScenarioConfig};
use crate::simulation::barnes_hut::Octree;
use crate::simulation::boundary::OpenBox;
use crate::simulation::domain::{Decomposition, DomainError, DomainGeometry};
use crate::simulation::engine::Engine;
use crate::simulation::index::ApproximateGravity;
use crate::simulation::registry::{InsertOutcome, Registry};
use crate::simulation::states::{NVec3, Particle};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("body {body}: `{field}` needs 3 components, got {got}")]
    BadVector {
        body: usize,
        field: &'static str,
        got: usize,
    },
}

/// Counts of insertion outcomes while building a scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    pub sent: usize,
    pub dropped: usize,
    pub rejected: usize,
}

impl InsertReport {
    pub fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted(_) | InsertOutcome::InsertedAfterDiagnostics(_) => {
                self.inserted += 1
            }
            InsertOutcome::Sent { .. } => self.sent += 1,
            InsertOutcome::DroppedOutOfBox => self.dropped += 1,
            InsertOutcome::RejectedAfterDiagnostics => self.rejected += 1,
        }
    }
}

pub struct Scenario {
    pub engine: Engine,
    pub geometry: DomainGeometry,
    pub registry: Registry,
    pub report: InsertReport,
}

impl Scenario {
    pub fn build_scenario(cfg: ScenarioConfig) -> Result<Self, ScenarioError> {
        let engine = Engine::from(&cfg.engine);
        let geometry = DomainGeometry::new(cfg.domain.boxsize, cfg.domain.root)?;

        // Registry: switch on the configured capabilities
        let mut registry = Registry::new().with_diagnostics(engine.diagnostics);
        if engine.open_boundary {
            registry = registry.with_boundary(OpenBox::new(&geometry));
        }
        if engine.tree {
            registry = registry.with_index(Octree::from_geometry(&geometry));
        }
        if engine.approximate_gravity {
            registry = registry.with_solver(ApproximateGravity::default());
        }
        // the layout is checked even for a single process
        let decomposition =
            Decomposition::new(geometry.clone(), cfg.domain.rank, cfg.domain.processes)?;
        if decomposition.processes() > 1 {
            registry = registry.with_decomposition(decomposition);
        }
        registry.set_n_active(cfg.parameters.n_active);

        // Bodies: map `BodyConfig` -> `Particle` and insert in file order
        let mut report = InsertReport::default();
        for (i, bc) in cfg.bodies.iter().enumerate() {
            let p = body_to_particle(i, bc)?;
            report.record(registry.insert(p));
        }

        tracing::info!(
            inserted = report.inserted,
            sent = report.sent,
            dropped = report.dropped,
            rejected = report.rejected,
            "scenario built"
        );

        Ok(Self {
            engine,
            geometry,
            registry,
            report,
        })
    }
}

fn body_to_particle(body: usize, bc: &BodyConfig) -> Result<Particle, ScenarioError> {
    let x = vec3(body, "x", &bc.x)?;
    let v = vec3(body, "v", &bc.v)?;
    Ok(Particle::at(x, bc.m, bc.radius).with_velocity(v))
}

fn vec3(body: usize, field: &'static str, xs: &[f64]) -> Result<NVec3, ScenarioError> {
    match xs {
        [x, y, z] => Ok(NVec3::new(*x, *y, *z)),
        _ => Err(ScenarioError::BadVector {
            body,
            field,
            got: xs.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> ScenarioConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn open_box_scenario_drops_outsiders() {
        let cfg = config(
            r#"
engine:
  boundary: "open"
  tree: true
  approximate_gravity: true
domain:
  boxsize: 1.0
  root: [2, 2, 2]
bodies:
  - { x: [0.0, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0, radius: 0.1 }
  - { x: [0.5, 0.5, 0.5], v: [0.0, 1.0, 0.0], m: 0.001, radius: 0.01 }
  - { x: [5.0, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 0.0001, radius: 0.5 }
"#,
        );
        let s = Scenario::build_scenario(cfg).unwrap();

        assert_eq!(s.report, InsertReport { inserted: 2, dropped: 1, ..Default::default() });
        assert_eq!(s.registry.len(), 2);
        assert_eq!(s.registry.index().len(), 2);
        assert_eq!(s.registry.particles()[1].v, NVec3::new(0.0, 1.0, 0.0));
        // bookkeeping ran before the box check
        assert_eq!(s.registry.max_r(), 0.5);
        assert_eq!(s.registry.minimum_mass(), Some(0.0001));
    }

    #[test]
    fn decomposed_scenario_forwards_remote_bodies() {
        let cfg = config(
            r#"
engine:
  boundary: "periodic"
domain:
  boxsize: 1.0
  root: [2, 1, 1]
  processes: 2
  rank: 0
parameters:
  n_active: 1
bodies:
  - { x: [0.5, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0, radius: 0.0 }
  - { x: [-0.5, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0, radius: 0.0 }
  - { x: [0.5, 0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0, radius: 0.0 }
"#,
        );
        let s = Scenario::build_scenario(cfg).unwrap();

        // the first body is active and pinned, the third goes to rank 1
        assert_eq!(s.report, InsertReport { inserted: 2, sent: 1, ..Default::default() });
        assert_eq!(s.registry.transport().outbound(1).len(), 1);
    }

    #[test]
    fn malformed_vector_is_an_error() {
        let cfg = config(
            r#"
engine:
  boundary: "none"
domain:
  boxsize: 1.0
  root: [1, 1, 1]
bodies:
  - { x: [0.0, 0.0], v: [0.0, 0.0, 0.0], m: 1.0, radius: 0.0 }
"#,
        );
        let err = Scenario::build_scenario(cfg).err().unwrap();
        assert!(matches!(err, ScenarioError::BadVector { body: 0, field: "x", got: 2 }));
    }

    #[test]
    fn process_layout_is_checked_without_routing() {
        let no_processes = config(
            r#"
engine:
  boundary: "none"
domain:
  boxsize: 1.0
  root: [1, 1, 1]
  processes: 0
"#,
        );
        let err = Scenario::build_scenario(no_processes).err().unwrap();
        assert!(matches!(err, ScenarioError::Domain(DomainError::NoProcesses)));

        let bad_rank = config(
            r#"
engine:
  boundary: "none"
domain:
  boxsize: 1.0
  root: [1, 1, 1]
  processes: 1
  rank: 3
"#,
        );
        let err = Scenario::build_scenario(bad_rank).err().unwrap();
        assert!(matches!(err, ScenarioError::Domain(DomainError::RankOutOfRange { .. })));
    }

    #[test]
    fn uneven_partition_is_an_error() {
        let cfg = config(
            r#"
engine:
  boundary: "none"
domain:
  boxsize: 1.0
  root: [3, 1, 1]
  processes: 2
"#,
        );
        let err = Scenario::build_scenario(cfg).err().unwrap();
        assert!(matches!(
            err,
            ScenarioError::Domain(DomainError::UnevenPartition { cells: 3, processes: 2 })
        ));
    }
}
