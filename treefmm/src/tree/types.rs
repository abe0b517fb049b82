//! Data structures for octrees.

/// Stable integer id of a node slot, valid until the tree is rebuilt.
pub type NodeIndex = usize;

/// The contents of a node slot.
///
/// Internal nodes own a contiguous block of `2^D` child slots, some of which may be empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    /// A child slot containing no particles.
    Empty,

    /// A leaf, holding the offset of its particle range in the tree's leaf array.
    Leaf(usize),

    /// An internal node, holding the id of the first slot of its child block.
    Internal(NodeIndex),
}

/// An axis aligned box, `[min, max]` along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<T, const D: usize> {
    /// Lower corner.
    pub min: [T; D],

    /// Upper corner.
    pub max: [T; D],
}

/// The computational domain of a particle set: a bounding box with per axis periodicity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Domain<T, const D: usize> {
    /// The box containing every particle.
    pub bounds: Bounds<T, D>,

    /// Whether each axis wraps around.
    pub periodic: [bool; D],
}

/// A `2^D`-tree over a particle set, stored as flat node and leaf arrays.
///
/// # Fields
///
/// - `domain` - The spatial domain the tree subdivides.
///
/// - `n_crit` - Maximum number of particles in a leaf, unless the leaf is at `max_level`.
///
/// - `max_level` - Deepest level a tag can encode for this dimension.
///
/// - `depth` - Deepest level actually reached.
///
/// - `nodes` - All node slots in breadth first order, the root at id 0.
///
/// - `node_tags` - The tag of the lower corner cell of each node slot, its bits spell out the
///   half-space choices from the root.
///
/// - `parents` - Parent of each node slot.
///
/// - `levels` - Half open id range `(start, end)` of the node slots at each level.
///
/// - `leaves` - Half open particle range `(start, end)` of each leaf, leaves partition the
///   particles.
///
/// - `leaf_nodes` - The node id of each leaf.
///
/// - `tags` - Tag of each particle, sorted ascending.
///
/// - `points` - Particle positions in tag sorted order.
///
/// - `global_indices` - Insertion index of each particle in tag sorted order, for mapping back
///   to the order particles were first supplied in.
#[derive(Debug, Clone)]
pub struct Octree<T, const D: usize> {
    /// Spatial domain
    pub domain: Domain<T, D>,

    /// Maximum particles per leaf
    pub n_crit: usize,

    /// Deepest representable level
    pub max_level: usize,

    /// Depth of the tree
    pub depth: usize,

    /// Node slots
    pub nodes: Vec<Node>,

    /// Tag prefix of each node slot
    pub node_tags: Vec<u64>,

    /// Parent of each node slot
    pub parents: Vec<Option<NodeIndex>>,

    /// Node id range of each level
    pub levels: Vec<(usize, usize)>,

    /// Particle range of each leaf
    pub leaves: Vec<(usize, usize)>,

    /// Node id of each leaf
    pub leaf_nodes: Vec<NodeIndex>,

    /// Sorted particle tags
    pub tags: Vec<u64>,

    /// Particle positions in tag order
    pub points: Vec<[T; D]>,

    /// Insertion index of each particle in tag order
    pub global_indices: Vec<usize>,

    /// Insertion index handed to the next appended particle
    pub next_global_index: usize,
}
