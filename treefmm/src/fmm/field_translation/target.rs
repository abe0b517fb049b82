//! Local expansion translations, and evaluation of potentials at particles.
use std::ops::Range;

use num::Zero;
use rayon::prelude::*;

use crate::fmm::types::TreeFmm;
use crate::traits::{
    fmm::{Expansions, TargetTranslation},
    tree::SpatialTree,
    types::FmmError,
};
use crate::tree::types::Node;

impl<Tree, E, const D: usize> TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    /// Add per leaf results to the potentials buffer.
    fn scatter_potentials(&mut self, results: Vec<(Range<usize>, Vec<Tree::Scalar>)>) {
        for (range, values) in results {
            for (potential, value) in self.potentials[range].iter_mut().zip(values) {
                *potential = *potential + value;
            }
        }
    }
}

impl<Tree, E, const D: usize> TargetTranslation for TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    fn l2l(&mut self, level: usize) -> Result<(), FmmError> {
        if level == 0 || level > self.tree.depth() {
            return Err(FmmError::Failed(format!(
                "L2L failed, no parent level for level {level}"
            )));
        }

        let tree = &self.tree;
        let expansions = &self.expansions;
        let n_coeffs = self.n_coeffs;

        let range = tree.level_range(level);
        let start = range.start;
        let n_nodes = range.len();

        let (parent_locals, locals) = self.locals.split_at_mut(start * n_coeffs);
        let parent_locals = &*parent_locals;

        locals[..n_nodes * n_coeffs]
            .par_chunks_exact_mut(n_coeffs)
            .enumerate()
            .for_each(|(i, local)| {
                let child = start + i;

                if matches!(tree.node(child), Node::Empty) {
                    return;
                }

                if let Some(parent) = tree.parent(child) {
                    let offset = parent * n_coeffs;
                    expansions.l2l(
                        &tree.bounds(child),
                        &tree.bounds(parent),
                        &parent_locals[offset..offset + n_coeffs],
                        local,
                    );
                }
            });

        Ok(())
    }

    fn l2p(&mut self) -> Result<(), FmmError> {
        let tree = &self.tree;
        let expansions = &self.expansions;
        let locals = &self.locals;
        let n_coeffs = self.n_coeffs;
        let points = tree.points();

        let results = (0..tree.n_nodes())
            .into_par_iter()
            .filter_map(|leaf| {
                let range = tree.leaf_particles(leaf)?;
                let bounds = tree.bounds(leaf);
                let local = &locals[leaf * n_coeffs..(leaf + 1) * n_coeffs];

                let values = points[range.clone()]
                    .iter()
                    .map(|point| expansions.l2p(point, &bounds, local))
                    .collect::<Vec<_>>();

                Some((range, values))
            })
            .collect::<Vec<_>>();

        self.scatter_potentials(results);
        Ok(())
    }

    fn p2p(&mut self) -> Result<(), FmmError> {
        let tree = &self.tree;
        let expansions = &self.expansions;
        let connectivity = &self.connectivity;
        let charges = &self.charges;
        let points = tree.points();

        let results = (0..tree.n_nodes())
            .into_par_iter()
            .filter_map(|leaf| {
                let range = tree.leaf_particles(leaf)?;
                let targets = &points[range.clone()];
                let mut values = vec![Tree::Scalar::zero(); targets.len()];

                for &connected in connectivity[leaf].iter() {
                    for source in tree.subtree(connected) {
                        if let Some(sources) = tree.leaf_particles(source) {
                            expansions.p2p(
                                targets,
                                &points[sources.clone()],
                                &charges[sources],
                                &mut values,
                            );
                        }
                    }
                }

                Some((range, values))
            })
            .collect::<Vec<_>>();

        self.scatter_potentials(results);
        Ok(())
    }
}
