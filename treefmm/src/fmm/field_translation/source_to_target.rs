//! Multipole to local field translations, and the refinement of each node's unresolved list.
use rayon::prelude::*;

use crate::fmm::types::TreeFmm;
use crate::traits::{
    fmm::{Expansions, SourceToTargetTranslation},
    tree::SpatialTree,
    types::FmmError,
};
use crate::tree::types::Node;

impl<Tree, E, const D: usize> SourceToTargetTranslation for TreeFmm<Tree, E, D>
where
    Tree: SpatialTree<D>,
    E: Expansions<D, Scalar = Tree::Scalar>,
{
    fn m2l(&mut self, level: usize) -> Result<(), FmmError> {
        if level > self.tree.depth() {
            return Err(FmmError::Failed(format!(
                "M2L failed, level {level} is deeper than the tree"
            )));
        }

        let tree = &self.tree;

        // The root is unresolved with itself
        if level == 0 {
            let root = tree.root();
            self.connectivity[root] = vec![root];
            return Ok(());
        }

        let expansions = &self.expansions;
        let theta = &self.theta;
        let multipoles = &self.multipoles;
        let n_coeffs = self.n_coeffs;

        let range = tree.level_range(level);
        let start = range.start;
        let n_nodes = range.len();

        let (parent_connectivity, connectivity) = self.connectivity.split_at_mut(start);
        let parent_connectivity = &*parent_connectivity;
        let locals = &mut self.locals[start * n_coeffs..(start + n_nodes) * n_coeffs];

        locals
            .par_chunks_exact_mut(n_coeffs)
            .zip(connectivity[..n_nodes].par_iter_mut())
            .enumerate()
            .for_each(|(i, (local, connected))| {
                let target = start + i;
                connected.clear();

                if matches!(tree.node(target), Node::Empty) {
                    return;
                }

                let Some(parent) = tree.parent(target) else {
                    return;
                };

                let target_bounds = tree.bounds(target);

                for &candidate in parent_connectivity[parent].iter() {
                    // Leaves are settled directly once the target is a leaf
                    if tree.is_leaf(candidate) {
                        connected.push(candidate);
                        continue;
                    }

                    for source in tree.children(candidate) {
                        let source_bounds = tree.bounds(source);

                        if theta.is_admissible(&target_bounds, &source_bounds) {
                            let offset = source * n_coeffs;
                            expansions.m2l(
                                &target_bounds,
                                &source_bounds,
                                &multipoles[offset..offset + n_coeffs],
                                local,
                            );
                        } else {
                            connected.push(source);
                        }
                    }
                }
            });

        Ok(())
    }
}
