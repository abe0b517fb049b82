//! Builder objects to construct FMMs
use num::{One, Zero};

use crate::fmm::{
    admissibility::ThetaCondition,
    constants::DEFAULT_THETA,
    types::{FmmBuilder, TreeFmm},
};
use crate::traits::{
    fmm::Expansions,
    general::FmmScalar,
    tree::{ParticleContainer, SpatialTree},
    types::FmmError,
};
use crate::tree::types::{Domain, Octree};

impl<Tree, E, const D: usize> FmmBuilder<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    /// Initialise an empty FMM builder
    pub fn new() -> Self {
        Self {
            tree: None,
            expansions: None,
            theta: None,
        }
    }

    /// Associate FMM builder with an already constructed tree
    ///
    /// # Arguments
    /// * `tree` - A spatial tree over the particles, whose order defines the order of source and
    ///   target vectors.
    pub fn tree(mut self, tree: Tree) -> Self {
        self.tree = Some(tree);
        self
    }

    /// For an FMM builder with an associated tree, specify the expansion basis and admissibility
    ///
    /// # Arguments
    /// * `expansions` - The expansion basis, defining the kernel and the field translations.
    /// * `theta` - Separation ratio of the θ-criterion in `(0, 1)`, defaults to `DEFAULT_THETA`.
    pub fn parameters(mut self, expansions: E, theta: Option<Tree::Scalar>) -> Result<Self, FmmError> {
        if self.tree.is_none() {
            return Err(FmmError::Failed(
                "Must build tree before specifying FMM parameters".to_string(),
            ));
        }

        let theta = theta.unwrap_or_else(|| Tree::Scalar::from_f64(DEFAULT_THETA));

        if !(theta > Tree::Scalar::zero() && theta < Tree::Scalar::one()) {
            return Err(FmmError::Failed(format!(
                "Theta must lie in (0, 1), found {theta:?}"
            )));
        }

        self.expansions = Some(expansions);
        self.theta = Some(ThetaCondition::new(theta));
        Ok(self)
    }

    /// Finalize and build the FMM
    pub fn build(self) -> Result<TreeFmm<Tree, E, D>, FmmError> {
        let (Some(tree), Some(expansions), Some(theta)) = (self.tree, self.expansions, self.theta)
        else {
            return Err(FmmError::Failed(
                "Must create a tree, and FMM parameters before building".to_string(),
            ));
        };

        if tree.domain().is_periodic() {
            return Err(FmmError::Unimplemented(
                "Periodic domains are not supported by the FMM".to_string(),
            ));
        }

        let n_coeffs = expansions.n_coeffs();

        Ok(TreeFmm {
            tree,
            expansions,
            theta,
            n_coeffs,
            charges: Vec::new(),
            multipoles: Vec::new(),
            locals: Vec::new(),
            connectivity: Vec::new(),
            potentials: Vec::new(),
            expansions_valid: false,
        })
    }
}

impl<T, E, const D: usize> FmmBuilder<Octree<T, D>, E, D>
where
    T: FmmScalar,
    E: Expansions<D, Scalar = T>,
{
    /// Associate FMM builder with an octree built over a particle container, which is permuted
    /// into tree order.
    ///
    /// # Arguments
    /// * `particles` - Particle container.
    /// * `domain` - Optionally specify the domain, otherwise a padded cube around the particles.
    /// * `n_crit` - Maximum number of particles per leaf box, defaults to `DEFAULT_NCRIT`.
    pub fn particles<P>(
        self,
        particles: &mut P,
        domain: Option<Domain<T, D>>,
        n_crit: Option<usize>,
    ) -> Result<Self, FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let tree = Octree::new(particles, domain, n_crit)?;
        Ok(self.tree(tree))
    }
}

impl<Tree, E, const D: usize> Default for FmmBuilder<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    fn default() -> Self {
        Self::new()
    }
}
