//! Particle registry: storage plus the insertion pipeline
//!
//! `Registry` is the one owner of the particle store and of the bookkeeping
//! other subsystems read:
//! - radius extrema, for sizing collision search neighbourhoods
//! - the minimum-mass threshold of an approximate gravity solver
//!
//! Optional capabilities are injected with the `with_*` builders and default
//! to no-ops: no walls, no tree, no approximate solver, single process.
//!
//! Every insertion reports what happened to the particle as an
//! [`InsertOutcome`].

use crate::simulation::boundary::{Boundary, ContainmentFilter};
use crate::simulation::domain::Decomposition;
use crate::simulation::index::{ApproximateSolver, NoIndex, NoSolver, SpatialIndex};
use crate::simulation::states::Particle;
use crate::simulation::store::{ParticleStore, StoreError};
use crate::simulation::transport::{SendQueue, Transport};

/// What the registry did with a candidate particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Stored locally in this slot
    Inserted(usize),
    /// Stored locally although diagnostic particles were already present
    InsertedAfterDiagnostics(usize),
    /// Handed to the transport for another process
    Sent { rank: usize },
    /// Outside the open box; discarded
    DroppedOutOfBox,
    /// Refused because diagnostic particles were already present
    RejectedAfterDiagnostics,
}

impl InsertOutcome {
    /// Slot index, if the particle was stored locally
    pub fn index(&self) -> Option<usize> {
        match *self {
            InsertOutcome::Inserted(i) | InsertOutcome::InsertedAfterDiagnostics(i) => Some(i),
            _ => None,
        }
    }
}

/// How ordinary insertion behaves once diagnostic particles exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticPolicy {
    /// Log a warning and insert anyway
    #[default]
    Warn,
    /// Log a warning and refuse the particle
    Reject,
}

/// Largest and second-largest interaction radius ever inserted
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RadiusExtrema {
    pub max_r: f64,
    pub second_max_r: f64,
}

impl RadiusExtrema {
    /// Ties promote into the top slot, so `max_r >= second_max_r` always holds
    pub fn observe(&mut self, r: f64) {
        if r >= self.max_r {
            self.second_max_r = self.max_r;
            self.max_r = r;
        } else if r >= self.second_max_r {
            self.second_max_r = r;
        }
    }
}

pub struct Registry {
    store: ParticleStore,
    extrema: RadiusExtrema,
    filter: ContainmentFilter,
    router: Option<Decomposition>,
    index: Box<dyn SpatialIndex>,
    solver: Box<dyn ApproximateSolver>,
    transport: Box<dyn Transport>,
    diagnostics: DiagnosticPolicy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Empty single-process registry with every capability switched off
    pub fn new() -> Self {
        Self {
            store: ParticleStore::new(),
            extrema: RadiusExtrema::default(),
            filter: ContainmentFilter::default(),
            router: None,
            index: Box::new(NoIndex),
            solver: Box::new(NoSolver),
            transport: Box::new(SendQueue::default()),
            diagnostics: DiagnosticPolicy::default(),
        }
    }

    /// Filter insertions through `boundary`
    pub fn with_boundary(mut self, boundary: impl Boundary + 'static) -> Self {
        self.filter = ContainmentFilter::new(boundary);
        self
    }

    /// Notify `index` of every slot written
    pub fn with_index(mut self, index: impl SpatialIndex + 'static) -> Self {
        self.index = Box::new(index);
        self
    }

    /// Track the minimum mass for `solver`
    pub fn with_solver(mut self, solver: impl ApproximateSolver + 'static) -> Self {
        self.solver = Box::new(solver);
        self
    }

    /// Route insertions across processes through the current transport
    pub fn with_decomposition(mut self, decomposition: Decomposition) -> Self {
        self.router = Some(decomposition);
        self
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Box::new(transport);
        self
    }

    pub fn with_diagnostics(mut self, policy: DiagnosticPolicy) -> Self {
        self.diagnostics = policy;
        self
    }

    // pipeline =============================================================================

    /// Add a new particle to the simulation.
    ///
    /// Radius and mass bookkeeping happen before routing and filtering, and
    /// are kept even if the particle ends up on another process or outside
    /// the box.
    pub fn insert(&mut self, p: Particle) -> InsertOutcome {
        let after_diagnostics = self.store.n_diagnostic() > 0;
        if after_diagnostics {
            tracing::warn!(
                n_diagnostic = self.store.n_diagnostic(),
                "trying to add particle after diagnostic particles were appended"
            );
            if self.diagnostics == DiagnosticPolicy::Reject {
                return InsertOutcome::RejectedAfterDiagnostics;
            }
        }

        self.extrema.observe(p.r);
        if let Some(minimum_mass) = self.solver.minimum_mass_mut() {
            if p.m < *minimum_mass {
                *minimum_mass = p.m;
            }
        }

        if let Some(router) = &self.router {
            let owner = router.owning_rank(&p);
            if !router.keeps(owner, self.store.len(), self.store.n_active()) {
                tracing::debug!(rank = owner, "particle queued for another process");
                self.transport.enqueue_outbound(p, owner);
                return InsertOutcome::Sent { rank: owner };
            }
        }

        match self.insert_local(p) {
            InsertOutcome::Inserted(i) if after_diagnostics => {
                InsertOutcome::InsertedAfterDiagnostics(i)
            }
            outcome => outcome,
        }
    }

    /// Store `p` on this process: containment check, append, tree update
    pub fn insert_local(&mut self, p: Particle) -> InsertOutcome {
        if !self.filter.admit(&p) {
            return InsertOutcome::DroppedOutOfBox;
        }
        let index = self.store.append(p);
        self.index.notify_insert(index, self.store.particles());
        InsertOutcome::Inserted(index)
    }

    /// Put `p` back into an existing slot.
    ///
    /// Used after a transform that cannot move the particle to another
    /// process; no routing and no bookkeeping. Out-of-box particles are
    /// dropped without a warning.
    pub fn insert_at_fixed_position(&mut self, p: Particle, index: usize) -> Result<InsertOutcome, StoreError> {
        if !self.filter.admit_quietly(&p) {
            return Ok(InsertOutcome::DroppedOutOfBox);
        }
        self.store.write_at(p, index)?;
        self.index.notify_insert(index, self.store.particles());
        Ok(InsertOutcome::Inserted(index))
    }

    /// Store particles delivered by the transport from other processes
    pub fn receive(&mut self, particles: impl IntoIterator<Item = Particle>) -> Vec<InsertOutcome> {
        particles.into_iter().map(|p| self.insert_local(p)).collect()
    }

    /// Append a chaos-indicator particle behind everything else.
    ///
    /// Skips routing, filtering, bookkeeping and the tree.
    pub fn append_diagnostic(&mut self, p: Particle) -> usize {
        let index = self.store.append(p);
        self.store.set_n_diagnostic(self.store.n_diagnostic() + 1);
        index
    }

    /// Remove every particle and release storage.
    ///
    /// Radius extrema and the minimum mass are left alone.
    pub fn reset_all(&mut self) {
        self.store.reset();
        self.index.clear();
    }

    // accessors ============================================================================

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn n_active(&self) -> Option<usize> {
        self.store.n_active()
    }

    pub fn n_diagnostic(&self) -> usize {
        self.store.n_diagnostic()
    }

    /// Change the particle count. Slots cut off by a shrink leave the
    /// spatial index.
    pub fn set_len(&mut self, n: usize) -> Result<(), StoreError> {
        let old = self.store.len();
        self.store.set_len(n)?;
        for index in n..old {
            self.index.remove(index);
        }
        Ok(())
    }

    pub fn set_capacity(&mut self, n: usize) -> Result<(), StoreError> {
        self.store.set_capacity(n)
    }

    pub fn set_n_active(&mut self, n: Option<usize>) {
        self.store.set_n_active(n);
    }

    pub fn set_n_diagnostic(&mut self, n: usize) {
        self.store.set_n_diagnostic(n);
    }

    pub fn particles(&self) -> &[Particle] {
        self.store.particles()
    }

    pub fn extrema(&self) -> RadiusExtrema {
        self.extrema
    }

    pub fn max_r(&self) -> f64 {
        self.extrema.max_r
    }

    pub fn second_max_r(&self) -> f64 {
        self.extrema.second_max_r
    }

    pub fn minimum_mass(&self) -> Option<f64> {
        self.solver.minimum_mass()
    }

    /// Whether the one-time out-of-box warning has fired
    pub fn warned_out_of_box(&self) -> bool {
        self.filter.warned()
    }

    pub fn decomposition(&self) -> Option<&Decomposition> {
        self.router.as_ref()
    }

    pub fn index(&self) -> &dyn SpatialIndex {
        self.index.as_ref()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn transport_mut(&mut self) -> &mut dyn Transport {
        self.transport.as_mut()
    }
}
