//! Multipole expansion translations
use rayon::prelude::*;

use crate::fmm::types::TreeFmm;
use crate::traits::{
    fmm::{Expansions, SourceTranslation},
    tree::SpatialTree,
    types::FmmError,
};

impl<Tree, E, const D: usize> SourceTranslation for TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    fn p2m(&mut self) -> Result<(), FmmError> {
        let tree = &self.tree;
        let expansions = &self.expansions;
        let charges = &self.charges;
        let points = tree.points();

        self.multipoles
            .par_chunks_exact_mut(self.n_coeffs)
            .enumerate()
            .for_each(|(index, multipole)| {
                if let Some(range) = tree.leaf_particles(index) {
                    expansions.p2m(
                        &tree.bounds(index),
                        &points[range.clone()],
                        &charges[range],
                        multipole,
                    );
                }
            });

        Ok(())
    }

    fn m2m(&mut self, level: usize) -> Result<(), FmmError> {
        if level == 0 || level > self.tree.depth() {
            return Err(FmmError::Failed(format!(
                "M2M failed, no parent level for level {level}"
            )));
        }

        let tree = &self.tree;
        let expansions = &self.expansions;
        let n_coeffs = self.n_coeffs;

        let parent_start = tree.level_range(level - 1).start;
        let child_start = tree.level_range(level).start;

        // Parents precede their children, so the two levels are disjoint slices
        let (parent_multipoles, child_multipoles) =
            self.multipoles.split_at_mut(child_start * n_coeffs);
        let child_multipoles = &*child_multipoles;

        parent_multipoles[parent_start * n_coeffs..]
            .par_chunks_exact_mut(n_coeffs)
            .enumerate()
            .for_each(|(i, parent_multipole)| {
                let parent = parent_start + i;
                let mut children = tree.children(parent).peekable();

                if children.peek().is_some() {
                    let parent_bounds = tree.bounds(parent);
                    for child in children {
                        let offset = (child - child_start) * n_coeffs;
                        expansions.m2m(
                            &parent_bounds,
                            &tree.bounds(child),
                            &child_multipoles[offset..offset + n_coeffs],
                            parent_multipole,
                        );
                    }
                }
            });

        Ok(())
    }
}
