//! Data structures for tree based fast multipole methods.
use crate::fmm::admissibility::ThetaCondition;
use crate::traits::{fmm::Expansions, tree::SpatialTree};
use crate::tree::types::NodeIndex;

/// A fast multipole method over a spatial tree, with a pluggable expansion basis.
///
/// All per node data are stored in flat buffers indexed by node id, multipole and local
/// coefficients with a stride of `n_coeffs`. They are sized at the start of every evaluation,
/// and are not valid across a rebuild of the tree.
///
/// # Fields
///
/// - `tree` - The spatial tree, whose particle order defines the order of source and target
///   vectors.
///
/// - `expansions` - The expansion basis, defining all field translations.
///
/// - `theta` - The admissibility criterion for multipole to local translations.
///
/// - `n_coeffs` - Number of coefficients in each multipole and local expansion.
///
/// - `charges` - The source vector of the last evaluation, in tree order.
///
/// - `multipoles` - Multipole expansion of every node.
///
/// - `locals` - Local expansion of every node.
///
/// - `connectivity` - Nodes left unresolved by the downward pass for every node, whose
///   particles interact with it directly.
///
/// - `potentials` - Buffer for evaluated potentials, in tree order.
///
/// - `expansions_valid` - Whether the buffers hold the expansions of the current tree.
pub struct TreeFmm<Tree, E, const D: usize>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    /// Spatial tree
    pub tree: Tree,

    /// Expansion basis
    pub expansions: E,

    /// Admissibility criterion
    pub theta: ThetaCondition<Tree::Scalar>,

    /// Coefficients per expansion
    pub n_coeffs: usize,

    /// Source vector, in tree order
    pub charges: Vec<Tree::Scalar>,

    /// Multipole expansions
    pub multipoles: Vec<Tree::Scalar>,

    /// Local expansions
    pub locals: Vec<Tree::Scalar>,

    /// Unresolved nodes of each node
    pub connectivity: Vec<Vec<NodeIndex>>,

    /// Evaluated potentials
    pub potentials: Vec<Tree::Scalar>,

    /// Whether expansions have been calculated for the current tree
    pub expansions_valid: bool,
}

/// Builder for [`TreeFmm`].
pub struct FmmBuilder<Tree, E, const D: usize>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    /// Spatial tree
    pub tree: Option<Tree>,

    /// Expansion basis
    pub expansions: Option<E>,

    /// Admissibility criterion
    pub theta: Option<ThetaCondition<Tree::Scalar>>,
}
