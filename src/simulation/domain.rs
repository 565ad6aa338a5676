//! Domain geometry and process ownership
//!
//! The simulated volume is a block of `nx * ny * nz` cubic root cells of edge
//! `boxsize`, centred on the origin. In a decomposed run the root cells are
//! split into equal contiguous ranges of cell ids, one range per process.

use thiserror::Error;

use crate::simulation::states::{NVec3, Particle};

#[derive(Debug, Error, PartialEq)]
pub enum DomainError {
    #[error("root cell size must be positive, got {0}")]
    NonPositiveCellSize(f64),

    #[error("every axis needs at least one root cell, got {0:?}")]
    EmptyRootGrid([usize; 3]),

    #[error("process count must be at least 1")]
    NoProcesses,

    #[error("rank {rank} is out of range for {processes} processes")]
    RankOutOfRange { rank: usize, processes: usize },

    #[error("{cells} root cells cannot be split evenly across {processes} processes")]
    UnevenPartition { cells: usize, processes: usize },
}

/// Box geometry shared by the router, the containment filter and the tree
#[derive(Debug, Clone, PartialEq)]
pub struct DomainGeometry {
    pub boxsize: f64, // root cell edge
    pub root: [usize; 3], // root cells per axis
}

impl DomainGeometry {
    pub fn new(boxsize: f64, root: [usize; 3]) -> Result<Self, DomainError> {
        if !(boxsize > 0.0) {
            return Err(DomainError::NonPositiveCellSize(boxsize));
        }
        if root.iter().any(|&n| n == 0) {
            return Err(DomainError::EmptyRootGrid(root));
        }
        Ok(Self { boxsize, root })
    }

    /// Full box extent per axis
    pub fn extent(&self) -> NVec3 {
        NVec3::new(
            self.boxsize * self.root[0] as f64,
            self.boxsize * self.root[1] as f64,
            self.boxsize * self.root[2] as f64,
        )
    }

    pub fn half_extent(&self) -> NVec3 {
        self.extent() * 0.5
    }

    pub fn total_cells(&self) -> usize {
        self.root[0] * self.root[1] * self.root[2]
    }

    /// Linear id of the root cell containing `p`.
    ///
    /// Each axis index wraps periodically, then cells are numbered with x
    /// fastest, then y, then z.
    pub fn root_box_for(&self, p: &Particle) -> usize {
        let half = self.half_extent();
        let i = self.wrap_axis(p.x.x + half.x, self.root[0]);
        let j = self.wrap_axis(p.x.y + half.y, self.root[1]);
        let k = self.wrap_axis(p.x.z + half.z, self.root[2]);
        (k * self.root[1] + j) * self.root[0] + i
    }

    fn wrap_axis(&self, offset: f64, n: usize) -> usize {
        let cell = (offset / self.boxsize).floor() as i64;
        cell.rem_euclid(n as i64) as usize
    }
}

/// Fixed mapping from root cells to processes
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    geometry: DomainGeometry,
    rank: usize,
    processes: usize,
    cells_per_process: usize,
}

impl Decomposition {
    /// Uneven partitions are rejected rather than guessed at.
    pub fn new(geometry: DomainGeometry, rank: usize, processes: usize) -> Result<Self, DomainError> {
        if processes == 0 {
            return Err(DomainError::NoProcesses);
        }
        if rank >= processes {
            return Err(DomainError::RankOutOfRange { rank, processes });
        }
        let cells = geometry.total_cells();
        if cells % processes != 0 {
            return Err(DomainError::UnevenPartition { cells, processes });
        }
        Ok(Self {
            geometry,
            rank,
            processes,
            cells_per_process: cells / processes,
        })
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn processes(&self) -> usize {
        self.processes
    }

    pub fn geometry(&self) -> &DomainGeometry {
        &self.geometry
    }

    /// Process owning root cell `cell`
    pub fn rank_for_cell(&self, cell: usize) -> usize {
        cell / self.cells_per_process
    }

    /// Process owning the region containing `p`
    pub fn owning_rank(&self, p: &Particle) -> usize {
        self.rank_for_cell(self.geometry.root_box_for(p))
    }

    /// Whether a particle bound for slot `target` stays on this process.
    ///
    /// Slots below the active cutoff are pinned here regardless of position.
    pub fn keeps(&self, owner: usize, target: usize, n_active: Option<usize>) -> bool {
        owner == self.rank || n_active.is_some_and(|n| target < n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f64, y: f64, z: f64) -> Particle {
        Particle::at(NVec3::new(x, y, z), 1.0, 0.0)
    }

    #[test]
    fn root_box_linearises_x_fastest() {
        let g = DomainGeometry::new(1.0, [4, 4, 4]).unwrap();
        // box spans [-2, 2) per axis
        assert_eq!(g.root_box_for(&at(-1.5, -1.5, -1.5)), 0);
        assert_eq!(g.root_box_for(&at(-0.5, -1.5, -1.5)), 1);
        assert_eq!(g.root_box_for(&at(-1.5, -0.5, -1.5)), 4);
        assert_eq!(g.root_box_for(&at(-1.5, -1.5, -0.5)), 16);
        assert_eq!(g.root_box_for(&at(1.5, 1.5, 1.5)), 63);
    }

    #[test]
    fn root_box_wraps_periodically() {
        let g = DomainGeometry::new(1.0, [4, 1, 1]).unwrap();
        assert_eq!(g.root_box_for(&at(2.5, 0.0, 0.0)), 0);
        assert_eq!(g.root_box_for(&at(-2.5, 0.0, 0.0)), 3);
        assert_eq!(g.root_box_for(&at(-11.5, 0.0, 0.0)), 2);
    }

    #[test]
    fn cell_seventeen_of_sixty_four_belongs_to_rank_one() {
        let g = DomainGeometry::new(1.0, [4, 4, 4]).unwrap();
        let d = Decomposition::new(g, 0, 4).unwrap();
        assert_eq!(d.rank_for_cell(17), 1);
        assert_eq!(d.rank_for_cell(15), 0);
        assert_eq!(d.rank_for_cell(63), 3);
        // cell 17: i = 1, j = 0, k = 1
        assert_eq!(d.owning_rank(&at(-0.5, -1.5, -0.5)), 1);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        assert_eq!(
            DomainGeometry::new(0.0, [1, 1, 1]),
            Err(DomainError::NonPositiveCellSize(0.0))
        );
        assert!(DomainGeometry::new(f64::NAN, [1, 1, 1]).is_err());
        assert_eq!(
            DomainGeometry::new(1.0, [2, 0, 1]),
            Err(DomainError::EmptyRootGrid([2, 0, 1]))
        );

        let g = DomainGeometry::new(1.0, [3, 1, 1]).unwrap();
        assert_eq!(
            Decomposition::new(g.clone(), 0, 2),
            Err(DomainError::UnevenPartition { cells: 3, processes: 2 })
        );
        assert_eq!(Decomposition::new(g.clone(), 0, 0), Err(DomainError::NoProcesses));
        assert_eq!(
            Decomposition::new(g, 3, 3),
            Err(DomainError::RankOutOfRange { rank: 3, processes: 3 })
        );
    }

    #[test]
    fn active_slots_are_kept_locally() {
        let g = DomainGeometry::new(1.0, [2, 1, 1]).unwrap();
        let d = Decomposition::new(g, 0, 2).unwrap();
        assert!(d.keeps(0, 10, None));
        assert!(!d.keeps(1, 10, None));
        assert!(d.keeps(1, 2, Some(5)));
        assert!(!d.keeps(1, 5, Some(5)));
    }
}
