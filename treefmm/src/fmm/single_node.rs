//! Implementation of Fmm Trait.
use log::debug;
use num::Zero;

use crate::fmm::types::TreeFmm;
use crate::traits::{
    fmm::{Expansions, Fmm, SourceToTargetTranslation, SourceTranslation, TargetTranslation},
    tree::SpatialTree,
    types::FmmError,
};
use crate::tree::types::NodeIndex;

impl<Tree, E, const D: usize> TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    /// Mutable access to the tree, for example to insert or remove particles. All expansions
    /// are discarded, and are recalculated on the next evaluation.
    pub fn tree_mut(&mut self) -> &mut Tree {
        self.clear();
        &mut self.tree
    }

    /// Discard all expansion data.
    pub fn clear(&mut self) {
        self.charges.clear();
        self.multipoles.clear();
        self.locals.clear();
        self.connectivity.clear();
        self.potentials.clear();
        self.expansions_valid = false;
    }

    /// Size all buffers for the current tree and set new charges.
    fn reset(&mut self, sources: &[Tree::Scalar]) {
        let n_nodes = self.tree.n_nodes();
        let zero = Tree::Scalar::zero();

        self.charges = sources.to_vec();
        self.multipoles = vec![zero; n_nodes * self.n_coeffs];
        self.locals = vec![zero; n_nodes * self.n_coeffs];
        self.connectivity = vec![Vec::new(); n_nodes];
        self.potentials = vec![zero; sources.len()];
    }

    fn check_sources(&self, sources: &[Tree::Scalar]) -> Result<(), FmmError> {
        let n_points = self.tree.points().len();
        if sources.len() != n_points {
            return Err(FmmError::LengthMismatch {
                expected: n_points,
                found: sources.len(),
            });
        }
        Ok(())
    }

    fn node_data<'a, V>(&'a self, data: &'a [V], index: NodeIndex, stride: usize) -> Option<&'a [V]> {
        if self.expansions_valid && index < self.tree.n_nodes() {
            Some(&data[index * stride..(index + 1) * stride])
        } else {
            None
        }
    }
}

impl<Tree, E, const D: usize> Fmm<D> for TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    type Scalar = Tree::Scalar;
    type Tree = Tree;
    type Expansions = E;

    fn multipole(&self, index: NodeIndex) -> Option<&[Self::Scalar]> {
        self.node_data(&self.multipoles, index, self.n_coeffs)
    }

    fn local(&self, index: NodeIndex) -> Option<&[Self::Scalar]> {
        self.node_data(&self.locals, index, self.n_coeffs)
    }

    fn connectivity(&self, index: NodeIndex) -> Option<&[NodeIndex]> {
        self.node_data(&self.connectivity, index, 1)
            .map(|connected| connected[0].as_slice())
    }

    fn n_coeffs(&self) -> usize {
        self.n_coeffs
    }

    fn tree(&self) -> &Self::Tree {
        &self.tree
    }

    fn expansions(&self) -> &Self::Expansions {
        &self.expansions
    }

    fn calculate_expansions(&mut self, sources: &[Self::Scalar]) -> Result<(), FmmError> {
        self.check_sources(sources)?;
        self.reset(sources);

        let depth = self.tree.depth();

        // Upward pass
        {
            self.p2m()?;
            for level in (1..=depth).rev() {
                self.m2m(level)?;
            }
        }

        // Downward pass
        {
            for level in 0..=depth {
                if level > 0 {
                    self.l2l(level)?;
                }
                self.m2l(level)?;
            }
        }

        self.expansions_valid = true;

        debug!(
            "Calculated expansions over {} nodes, depth {depth}, {} unresolved pairs",
            self.tree.n_nodes(),
            self.connectivity.iter().map(Vec::len).sum::<usize>()
        );

        Ok(())
    }

    fn gemv_into(
        &mut self,
        sources: &[Self::Scalar],
        targets: &mut [Self::Scalar],
    ) -> Result<(), FmmError> {
        if targets.len() != sources.len() {
            return Err(FmmError::LengthMismatch {
                expected: sources.len(),
                found: targets.len(),
            });
        }

        self.calculate_expansions(sources)?;

        // Leaf level computations
        self.l2p()?;
        self.p2p()?;

        for (target, &potential) in targets.iter_mut().zip(self.potentials.iter()) {
            *target = *target + potential;
        }

        Ok(())
    }

    fn gemv(&mut self, sources: &[Self::Scalar]) -> Result<Vec<Self::Scalar>, FmmError> {
        let mut targets = vec![Self::Scalar::zero(); sources.len()];
        self.gemv_into(sources, &mut targets)?;
        Ok(targets)
    }

    fn evaluate(
        &self,
        point: &[Self::Scalar; D],
        sources: &[Self::Scalar],
    ) -> Result<Self::Scalar, FmmError> {
        if !self.expansions_valid {
            return Err(FmmError::Failed(
                "Expansions must be calculated before evaluation".to_string(),
            ));
        }

        self.check_sources(sources)?;

        let (index, bounds) = self.tree.locate(point);
        let points = self.tree.points();
        let local = &self.locals[index * self.n_coeffs..(index + 1) * self.n_coeffs];

        let mut result = [self.expansions.l2p(point, &bounds, local)];

        for &connected in self.connectivity[index].iter() {
            for leaf in self.tree.subtree(connected) {
                if let Some(range) = self.tree.leaf_particles(leaf) {
                    if sources[range.clone()] != self.charges[range.clone()] {
                        return Err(FmmError::Failed(
                            "Sources differ from those the expansions were calculated with"
                                .to_string(),
                        ));
                    }
                    self.expansions.p2p(
                        std::slice::from_ref(point),
                        &points[range.clone()],
                        &sources[range],
                        &mut result,
                    );
                }
            }
        }

        Ok(result[0])
    }
}
