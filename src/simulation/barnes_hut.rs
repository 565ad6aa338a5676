//! # Barnes–Hut Octree (3D spatial index)
//!
//! This module implements an **incrementally built 3D octree** over the
//! particle store. The registry notifies the tree every time a slot is
//! written, and the tree files that slot index into the leaf whose octant
//! contains the particle.
//!
//! ## Core Concepts
//!
//! - The root node covers the whole simulated box.
//! - Space is recursively subdivided into 8 regions (octants).
//! - A leaf holds at most one slot index, except at [`MAX_DEPTH`] where
//!   coincident particles share a leaf instead of splitting forever.
//! - Each node stores:
//!   - total mass of its subtree
//!   - center of mass (COM)
//!   - bounding box (for computing size and subdivision)
//!
//! Mass and COM are not maintained on insertion; a force solver calls
//! [`Octree::update_mass_and_com`] once the store is settled.
//!
//! Re-notifying a slot that is already in the tree moves it: the old leaf
//! entry is removed before the new position is inserted.

use crate::simulation::domain::DomainGeometry;
use crate::simulation::index::SpatialIndex;
use crate::simulation::states::{NVec3, Particle};

/// Deepest level at which a leaf is still subdivided
pub const MAX_DEPTH: usize = 32;

/// A single octree node.
///
/// Each node represents a box-shaped region of space that may contain:
/// - zero slots (empty)
/// - exactly one slot (leaf node)
/// - several slots (leaf at [`MAX_DEPTH`] only)
/// - children (internal node, `bodies` is then empty)
#[derive(Debug, Clone)]
pub struct OctreeNode {
    pub mass: f64,
    pub com: NVec3,
    pub bbox_min: NVec3,
    pub bbox_max: NVec3,
    pub depth: usize,
    pub children: [Option<usize>; 8], // indices into Octree::nodes
    pub bodies: Vec<usize>,           // slot indices stored in this leaf
}

impl OctreeNode {
    fn empty(bbox_min: NVec3, bbox_max: NVec3, depth: usize) -> Self {
        Self {
            mass: 0.0,
            com: NVec3::zeros(),
            bbox_min,
            bbox_max,
            depth,
            children: [None; 8],
            bodies: Vec::new(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.iter().all(|c| c.is_none())
    }
}

/// Octree over the slots of a particle store.
///
/// This structure owns:
/// - a vector of all octree nodes (`nodes`)
/// - an index into that list representing the root (`root`)
/// - a reverse map from slot index to the leaf holding it (`leaf_of`)
#[derive(Debug, Clone)]
pub struct Octree {
    nodes: Vec<OctreeNode>,
    root: usize,
    leaf_of: Vec<Option<usize>>,
    len: usize,
}

impl Octree {
    /// Empty tree whose root covers `[bbox_min, bbox_max]`
    pub fn new(bbox_min: NVec3, bbox_max: NVec3) -> Self {
        Self {
            nodes: vec![OctreeNode::empty(bbox_min, bbox_max, 0)],
            root: 0,
            leaf_of: Vec::new(),
            len: 0,
        }
    }

    /// Empty tree covering the simulated box of `geometry`
    pub fn from_geometry(geometry: &DomainGeometry) -> Self {
        let half = geometry.half_extent();
        Self::new(-half, half)
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn nodes(&self) -> &[OctreeNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &OctreeNode {
        &self.nodes[idx]
    }

    /// Leaf currently holding slot `index`
    pub fn leaf_of(&self, index: usize) -> Option<usize> {
        self.leaf_of.get(index).copied().flatten()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.leaf_of(index).is_some()
    }

    /// Recompute total mass and center of mass for every node.
    ///
    /// Slots missing from `particles` contribute nothing.
    pub fn update_mass_and_com(&mut self, particles: &[Particle]) {
        self.compute_mass_and_com(particles, self.root);
    }

    // helpers ==============================================================================

    /// Insert a single slot into the octree, starting from the given node.
    ///
    /// - If the target node is an empty leaf, it stores this slot.
    /// - If the target node is an occupied leaf above [`MAX_DEPTH`], the node
    ///   is subdivided into 8 children and the existing slot is reinserted
    ///   before the new one is forwarded down.
    /// - If the target node is an occupied leaf at [`MAX_DEPTH`], the slot is
    ///   stored alongside the existing ones.
    /// - If the target node already has children, the slot is forwarded into
    ///   the child whose octant contains the particle.
    fn insert_body(&mut self, node_idx: usize, body_idx: usize, particles: &[Particle]) {
        // Copy the bbox out by value (NVec3 is Copy)
        let bbox_min = self.nodes[node_idx].bbox_min;
        let bbox_max = self.nodes[node_idx].bbox_max;
        let depth = self.nodes[node_idx].depth;
        let pos = particles[body_idx].x;

        if self.nodes[node_idx].is_leaf() {
            // Case 1: empty leaf, or a leaf too deep to split -> store here
            if self.nodes[node_idx].bodies.is_empty() || depth >= MAX_DEPTH {
                self.nodes[node_idx].bodies.push(body_idx);
                self.leaf_of[body_idx] = Some(node_idx);
                return;
            }

            // Case 2: occupied leaf -> subdivide and reinsert what it held
            let existing = std::mem::take(&mut self.nodes[node_idx].bodies);
            self.subdivide(node_idx, bbox_min, bbox_max, depth);
            for existing_idx in existing {
                self.insert_body(node_idx, existing_idx, particles);
            }
        }

        // Case 3: node has (or now has) children -> descend into the right child
        let child_idx = child_index_for_point(&pos, &bbox_min, &bbox_max);
        let child_node_idx = match self.nodes[node_idx].children[child_idx] {
            Some(idx) => idx,
            None => {
                let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, child_idx);
                let new_idx = self.nodes.len();
                self.nodes.push(OctreeNode::empty(cmin, cmax, depth + 1));
                self.nodes[node_idx].children[child_idx] = Some(new_idx);
                new_idx
            }
        };

        self.insert_body(child_node_idx, body_idx, particles);
    }

    /// Split a leaf into 8 empty child octants covering its bounding box.
    fn subdivide(&mut self, node_idx: usize, bbox_min: NVec3, bbox_max: NVec3, depth: usize) {
        for child_idx in 0..8 {
            let (cmin, cmax) = child_bbox(&bbox_min, &bbox_max, child_idx);
            let new_node_idx = self.nodes.len();
            self.nodes.push(OctreeNode::empty(cmin, cmax, depth + 1));
            self.nodes[node_idx].children[child_idx] = Some(new_node_idx);
        }
    }

    /// Recursively compute total mass and center-of-mass for a subtree.
    ///
    /// Bottom-up: children first, then the slots held directly by this node.
    /// Every node's `mass` ends up as the sum over its subtree and `com` as
    /// the mass-weighted centre of that subtree.
    fn compute_mass_and_com(&mut self, particles: &[Particle], node_idx: usize) {
        let mut mass = 0.0;
        let mut com = NVec3::zeros();

        let children = self.nodes[node_idx].children; // [Option<usize>; 8] is Copy

        // Leaf contributions
        for &bidx in &self.nodes[node_idx].bodies {
            if let Some(b) = particles.get(bidx) {
                mass += b.m;
                com += b.x * b.m;
            }
        }

        // Children contributions
        for child_idx in children.iter().flatten().copied() {
            self.compute_mass_and_com(particles, child_idx);
            let cn = &self.nodes[child_idx];
            if cn.mass > 0.0 {
                mass += cn.mass;
                com += cn.com * cn.mass;
            }
        }

        if mass > 0.0 {
            com /= mass;
        }

        let node = &mut self.nodes[node_idx];
        node.mass = mass;
        node.com = com;
    }
}

impl SpatialIndex for Octree {
    fn notify_insert(&mut self, index: usize, particles: &[Particle]) {
        if self.leaf_of.len() <= index {
            self.leaf_of.resize(index + 1, None);
        }
        self.remove(index);
        self.insert_body(self.root, index, particles);
        self.len += 1;
    }

    fn remove(&mut self, index: usize) {
        if let Some(leaf) = self.leaf_of(index) {
            self.nodes[leaf].bodies.retain(|&b| b != index);
            self.leaf_of[index] = None;
            self.len -= 1;
        }
    }

    fn clear(&mut self) {
        let root = &self.nodes[self.root];
        let (bbox_min, bbox_max) = (root.bbox_min, root.bbox_max);
        self.nodes = vec![OctreeNode::empty(bbox_min, bbox_max, 0)];
        self.root = 0;
        self.leaf_of.clear();
        self.len = 0;
    }

    fn len(&self) -> usize {
        self.len
    }
}

// helpers ===========================================================================

/// Compute the octant index for a point within a node's bounding box.
///
/// The index is encoded using 3 bits:
///
/// - Bit 0 (value 1): X axis: 0 for left (x < center.x), 1 for right (x >= center.x)
/// - Bit 1 (value 2): Y axis: 0 for bottom (y < center.y), 1 for top (y >= center.y)
/// - Bit 2 (value 4): Z axis: 0 for back (z < center.z), 1 for front (z >= center.z)
///
/// Points outside the box land in the nearest octant.
fn child_index_for_point(p: &NVec3, bbox_min: &NVec3, bbox_max: &NVec3) -> usize {
    let center = (bbox_min + bbox_max) * 0.5;
    let mut idx = 0;

    if p.x >= center.x { idx |= 1; } // bit 0
    if p.y >= center.y { idx |= 2; } // bit 1
    if p.z >= center.z { idx |= 4; } // bit 2

    idx
}

/// Bounding box of child octant `child_idx`, same bit layout as
/// [`child_index_for_point`].
fn child_bbox(parent_min: &NVec3, parent_max: &NVec3, child_idx: usize) -> (NVec3, NVec3) {
    let center = (parent_min + parent_max) * 0.5;

    let mut min = *parent_min;
    let mut max = *parent_max;

    if (child_idx & 1) == 0 { max.x = center.x; } else { min.x = center.x; }
    if (child_idx & 2) == 0 { max.y = center.y; } else { min.y = center.y; }
    if (child_idx & 4) == 0 { max.z = center.z; } else { min.z = center.z; }

    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_tree() -> Octree {
        Octree::new(NVec3::new(-1.0, -1.0, -1.0), NVec3::new(1.0, 1.0, 1.0))
    }

    fn at(x: f64, y: f64, z: f64, m: f64) -> Particle {
        Particle::at(NVec3::new(x, y, z), m, 0.0)
    }

    #[test]
    fn octant_bits_follow_axes() {
        let min = NVec3::new(-1.0, -1.0, -1.0);
        let max = NVec3::new(1.0, 1.0, 1.0);
        assert_eq!(child_index_for_point(&NVec3::new(-0.5, -0.5, -0.5), &min, &max), 0);
        assert_eq!(child_index_for_point(&NVec3::new(0.5, -0.5, -0.5), &min, &max), 1);
        assert_eq!(child_index_for_point(&NVec3::new(-0.5, 0.5, -0.5), &min, &max), 2);
        assert_eq!(child_index_for_point(&NVec3::new(0.5, 0.5, 0.5), &min, &max), 7);

        let (cmin, cmax) = child_bbox(&min, &max, 5);
        assert_eq!(cmin, NVec3::new(0.0, -1.0, 0.0));
        assert_eq!(cmax, NVec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn first_slot_sits_in_root() {
        let particles = vec![at(0.5, 0.5, 0.5, 1.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.leaf_of(0), Some(tree.root()));
    }

    #[test]
    fn second_slot_splits_leaf() {
        let particles = vec![at(0.5, 0.5, 0.5, 1.0), at(-0.5, -0.5, -0.5, 1.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);

        assert_eq!(tree.len(), 2);
        assert!(!tree.node(tree.root()).is_leaf());
        let a = tree.leaf_of(0).unwrap();
        let b = tree.leaf_of(1).unwrap();
        assert_ne!(a, b);
        assert_eq!(tree.node(a).depth, 1);
        assert_eq!(tree.node(a).bodies, vec![0]);
        assert_eq!(tree.node(b).bodies, vec![1]);
    }

    #[test]
    fn coincident_particles_stop_at_max_depth() {
        let particles = vec![at(0.1, 0.1, 0.1, 1.0), at(0.1, 0.1, 0.1, 2.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);

        let leaf = tree.leaf_of(0).unwrap();
        assert_eq!(tree.leaf_of(1), Some(leaf));
        assert_eq!(tree.node(leaf).depth, MAX_DEPTH);
        assert_eq!(tree.node(leaf).bodies.len(), 2);
    }

    #[test]
    fn renotify_moves_slot() {
        let mut particles = vec![at(0.5, 0.5, 0.5, 1.0), at(-0.5, -0.5, -0.5, 1.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);
        let before = tree.leaf_of(1).unwrap();

        particles[1] = at(0.5, -0.5, 0.5, 1.0);
        tree.notify_insert(1, &particles);

        assert_eq!(tree.len(), 2);
        let after = tree.leaf_of(1).unwrap();
        assert_ne!(before, after);
        assert!(tree.node(before).bodies.is_empty());
    }

    #[test]
    fn mass_and_com_aggregate_bottom_up() {
        let particles = vec![at(0.5, 0.0, 0.0, 1.0), at(-0.5, 0.0, 0.0, 3.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);
        tree.update_mass_and_com(&particles);

        let root = tree.node(tree.root());
        assert!((root.mass - 4.0).abs() < 1e-12);
        assert!((root.com.x - (-0.25)).abs() < 1e-12);
        assert!(root.com.y.abs() < 1e-12);
    }

    #[test]
    fn removed_slot_frees_its_leaf() {
        let particles = vec![at(0.5, 0.5, 0.5, 1.0), at(-0.5, -0.5, -0.5, 1.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);
        let leaf = tree.leaf_of(1).unwrap();

        tree.remove(1);
        tree.remove(5);

        assert_eq!(tree.len(), 1);
        assert!(!tree.contains(1));
        assert!(tree.node(leaf).bodies.is_empty());

        // a shorter store no longer reaches the removed slot
        let shorter = vec![particles[0], at(-0.4, -0.4, -0.4, 1.0)];
        tree.notify_insert(1, &shorter);
        assert_eq!(tree.leaf_of(1), Some(leaf));
    }

    #[test]
    fn clear_keeps_root_box() {
        let particles = vec![at(0.5, 0.5, 0.5, 1.0), at(-0.5, -0.5, -0.5, 1.0)];
        let mut tree = unit_tree();
        tree.notify_insert(0, &particles);
        tree.notify_insert(1, &particles);

        tree.clear();

        assert_eq!(tree.len(), 0);
        assert_eq!(tree.nodes().len(), 1);
        assert!(!tree.contains(0));
        assert_eq!(tree.node(tree.root()).bbox_max, NVec3::new(1.0, 1.0, 1.0));
    }
}
