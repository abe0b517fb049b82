//! FMM traits
use crate::traits::{general::FmmScalar, tree::SpatialTree, types::FmmError};
use crate::tree::types::{Bounds, NodeIndex};

/// A pairwise interaction kernel `K(x, y)`.
pub trait Kernel<const D: usize>: Send + Sync {
    /// Scalar type
    type Scalar: FmmScalar;

    /// Evaluate the kernel between a target and a source position.
    fn evaluate(&self, target: &[Self::Scalar; D], source: &[Self::Scalar; D]) -> Self::Scalar;

    /// Whether `K(x, y)` depends on `x - y` alone. Expansions may then reuse translation
    /// operators between box pairs with the same size and relative position.
    fn is_translation_invariant(&self) -> bool {
        false
    }
}

/// The numerical operations of an expansion basis.
///
/// Coefficient slices all have length `n_coeffs()`, results are accumulated into the
/// output slice so that callers control initialisation. Operators are called concurrently
/// from many threads. Implementations may cache them, provided the result of every call is
/// independent of the calls made before it.
pub trait Expansions<const D: usize>: Send + Sync {
    /// Scalar type
    type Scalar: FmmScalar;

    /// Number of coefficients in a multipole or local expansion.
    fn n_coeffs(&self) -> usize;

    /// Particle to multipole, accumulate the multipole expansion of a set of sources in a box.
    ///
    /// # Arguments
    /// * `bounds` - Box the expansion is centred on.
    /// * `points` - Source positions.
    /// * `charges` - Source values, one per position.
    /// * `multipole` - Output expansion.
    fn p2m(
        &self,
        bounds: &Bounds<Self::Scalar, D>,
        points: &[[Self::Scalar; D]],
        charges: &[Self::Scalar],
        multipole: &mut [Self::Scalar],
    );

    /// Multipole to multipole, accumulate a child's multipole expansion into its parent's.
    fn m2m(
        &self,
        parent: &Bounds<Self::Scalar, D>,
        child: &Bounds<Self::Scalar, D>,
        child_multipole: &[Self::Scalar],
        parent_multipole: &mut [Self::Scalar],
    );

    /// Multipole to local, accumulate the field of a source box into a target's local expansion.
    fn m2l(
        &self,
        target: &Bounds<Self::Scalar, D>,
        source: &Bounds<Self::Scalar, D>,
        multipole: &[Self::Scalar],
        local: &mut [Self::Scalar],
    );

    /// Local to local, accumulate a parent's local expansion into its child's.
    fn l2l(
        &self,
        child: &Bounds<Self::Scalar, D>,
        parent: &Bounds<Self::Scalar, D>,
        parent_local: &[Self::Scalar],
        child_local: &mut [Self::Scalar],
    );

    /// Local to particle, evaluate a local expansion at a point inside its box.
    fn l2p(
        &self,
        point: &[Self::Scalar; D],
        bounds: &Bounds<Self::Scalar, D>,
        local: &[Self::Scalar],
    ) -> Self::Scalar;

    /// Direct particle to particle interaction, `result[i] += sum_j K(targets[i], sources[j]) charges[j]`.
    fn p2p(
        &self,
        targets: &[[Self::Scalar; D]],
        sources: &[[Self::Scalar; D]],
        charges: &[Self::Scalar],
        result: &mut [Self::Scalar],
    );
}

/// Interface for source field translations.
pub trait SourceTranslation {
    /// Particle to multipole translations, applied to every leaf box.
    fn p2m(&mut self) -> Result<(), FmmError>;

    /// Multipole to multipole translations, applied during upward pass. Defined over each level of a tree.
    ///
    /// # Arguments
    /// * `level` - The child level at which this translation is being applied.
    fn m2m(&mut self, level: usize) -> Result<(), FmmError>;
}

/// Interface for target field translations.
pub trait TargetTranslation {
    /// Local to local translations, applied during downward pass. Defined over each level of a tree.
    ///
    /// # Arguments
    /// * `level` - The child level at which this translation is being applied.
    fn l2l(&mut self, level: usize) -> Result<(), FmmError>;

    /// Local to particle translations, applies the local expansion accumulated at each leaf box to the
    /// target particles it contains.
    fn l2p(&mut self) -> Result<(), FmmError>;

    /// Near field particle to particle (direct) contributions from every leaf left in a target
    /// leaf's connectivity list, or beneath a connected node.
    fn p2p(&mut self) -> Result<(), FmmError>;
}

/// Interface for the source to target (multipole to local / M2L) field translations.
pub trait SourceToTargetTranslation {
    /// Refine each node's inherited candidate list, translating the multipoles of admissible
    /// sources into local expansions and storing the rest as the node's connectivity list.
    ///
    /// # Arguments
    /// * `level` - The level of the tree at which this translation is being applied.
    fn m2l(&mut self, level: usize) -> Result<(), FmmError>;
}

/// Interface for a fast multipole method over a spatial tree.
pub trait Fmm<const D: usize> {
    /// Scalar type
    type Scalar: FmmScalar;

    /// Tree type
    type Tree: SpatialTree<D, Scalar = Self::Scalar>;

    /// Expansion basis
    type Expansions: Expansions<D, Scalar = Self::Scalar>;

    /// Get the multipole expansion data associated with a node as a slice.
    fn multipole(&self, index: NodeIndex) -> Option<&[Self::Scalar]>;

    /// Get the local expansion data associated with a node as a slice.
    fn local(&self, index: NodeIndex) -> Option<&[Self::Scalar]>;

    /// Nodes left unresolved for a node after the downward pass, settled by direct summation.
    fn connectivity(&self, index: NodeIndex) -> Option<&[NodeIndex]>;

    /// Get the number of multipole/local coefficients associated with this FMM
    fn n_coeffs(&self) -> usize;

    /// Get the tree associated with this FMM
    fn tree(&self) -> &Self::Tree;

    /// Get the expansions associated with this FMM
    fn expansions(&self) -> &Self::Expansions;

    /// Get the dimension of the data in this FMM
    fn dim(&self) -> usize {
        D
    }

    /// Run the upward and downward passes for a source vector without evaluating at particles.
    ///
    /// # Arguments
    /// * `sources` - One value per particle, in tree order.
    fn calculate_expansions(&mut self, sources: &[Self::Scalar]) -> Result<(), FmmError>;

    /// Accumulate the approximate product of the dense kernel matrix with `sources` into `targets`.
    fn gemv_into(
        &mut self,
        sources: &[Self::Scalar],
        targets: &mut [Self::Scalar],
    ) -> Result<(), FmmError>;

    /// Approximate product of the dense kernel matrix with `sources`.
    fn gemv(&mut self, sources: &[Self::Scalar]) -> Result<Vec<Self::Scalar>, FmmError>;

    /// Evaluate the field at an arbitrary point in the domain, from the expansions of the last
    /// `calculate_expansions` call, which must have used the same `sources`.
    ///
    /// The far field comes from the stored expansions and `sources` only supplies the near
    /// field. Sources that differ from the stored ones in the near field of `point` are
    /// rejected with [`FmmError::Failed`], so a changed source vector always needs a new
    /// `calculate_expansions` call.
    fn evaluate(
        &self,
        point: &[Self::Scalar; D],
        sources: &[Self::Scalar],
    ) -> Result<Self::Scalar, FmmError>;
}
