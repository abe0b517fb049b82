//! Tree Traits
use std::ops::Range;

use crate::traits::general::FmmScalar;
use crate::tree::types::{Bounds, Domain, Node, NodeIndex};

/// Read-only navigation over a built spatial tree.
///
/// This is the whole interface an FMM needs from a spatial search backend. Nodes are addressed
/// by stable integer ids, valid until the tree is rebuilt. Ids are assigned breadth first, so
/// that all nodes at a given level occupy one contiguous id range, and ranges increase with level.
pub trait SpatialTree<const D: usize>: Sync {
    /// Scalar type
    type Scalar: FmmScalar;

    /// The computational domain defining the tree.
    fn domain(&self) -> &Domain<Self::Scalar, D>;

    /// Root node
    fn root(&self) -> NodeIndex;

    /// Total number of node slots, including empty ones.
    fn n_nodes(&self) -> usize;

    /// Get depth of tree.
    fn depth(&self) -> usize;

    /// Ids of all node slots at a given level, the root is at level 0.
    ///
    /// # Arguments
    /// * `level` - level being queried, must be at most `depth()`.
    fn level_range(&self, level: usize) -> Range<NodeIndex>;

    /// The kind of a node.
    fn node(&self, index: NodeIndex) -> Node;

    /// Parent of a node, `None` for the root.
    fn parent(&self, index: NodeIndex) -> Option<NodeIndex>;

    /// Bounding box of a node, recomputed from the root box and the sequence of half-space
    /// choices leading to the node.
    fn bounds(&self, index: NodeIndex) -> Bounds<Self::Scalar, D>;

    /// Lazily iterate over the non-empty children of a node. Leaves have no children.
    fn children(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_;

    /// The range of (tag sorted) particles contained in a leaf, `None` if the node is not a leaf.
    fn leaf_particles(&self, index: NodeIndex) -> Option<Range<usize>>;

    /// Particle positions in tree order.
    fn points(&self) -> &[[Self::Scalar; D]];

    /// Depth first iteration over all leaves beneath a node, including the node itself if it is
    /// a leaf.
    fn subtree(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_;

    /// Descend from the root to the deepest non-empty node containing a point, returning it and
    /// its bounds. For points in occupied regions this is always a leaf.
    ///
    /// # Panics
    /// If the point is outside of the domain.
    fn locate(&self, point: &[Self::Scalar; D]) -> (NodeIndex, Bounds<Self::Scalar, D>);

    /// Whether a node is a leaf.
    fn is_leaf(&self, index: NodeIndex) -> bool {
        matches!(self.node(index), Node::Leaf(_))
    }
}

/// A reorderable container of particles, the tree's view of the particle storage.
///
/// Trees sort particles by their spatial tag, the permutation is handed back to the container
/// which must apply it identically to positions and to every attached per-particle value.
pub trait ParticleContainer<T, const D: usize> {
    /// Particle positions in container order.
    fn positions(&self) -> &[[T; D]];

    /// Reorder all particle data such that `new[i] = old[permutation[i]]`.
    ///
    /// # Arguments
    /// * `permutation` - A permutation of `0..n_particles`.
    fn permute(&mut self, permutation: &[usize]);
}
