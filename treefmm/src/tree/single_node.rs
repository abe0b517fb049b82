//! Implementation of constructors for octrees.
use itertools::Itertools;
use log::{debug, trace};
use rayon::prelude::*;

use crate::traits::{general::FmmScalar, tree::ParticleContainer, types::FmmError};
use crate::tree::{
    constants::DEFAULT_NCRIT,
    morton::{child_tag, max_level_for_dimension, n_children, point_to_tag, tag_span},
    types::{Domain, Node, NodeIndex, Octree},
};

/// Exclusive prefix sum, `out[i] = sum(values[..i])`.
fn exclusive_scan(values: &[usize]) -> Vec<usize> {
    values
        .iter()
        .scan(0, |acc, &v| {
            let current = *acc;
            *acc += v;
            Some(current)
        })
        .collect()
}

impl<T, const D: usize> Octree<T, D>
where
    T: FmmScalar,
{
    /// Constructor for octrees, adaptively refined until each leaf holds at most `n_crit`
    /// particles.
    ///
    /// Particles are sorted by spatial tag, and the sorting permutation is applied to the
    /// container so that container order and tree order coincide on return.
    ///
    /// # Arguments
    /// * `particles` - Particle container, permuted in place.
    /// * `domain` - Optionally specify the domain, otherwise a padded cube around the points.
    /// * `n_crit` - Maximum particles per leaf, defaults to `DEFAULT_NCRIT`.
    pub fn new<P>(
        particles: &mut P,
        domain: Option<Domain<T, D>>,
        n_crit: Option<usize>,
    ) -> Result<Self, FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let positions = particles.positions();

        if positions.is_empty() {
            return Err(FmmError::Failed("Cannot build a tree over no particles".to_string()));
        }

        let n_crit = n_crit.unwrap_or(DEFAULT_NCRIT);
        if n_crit == 0 {
            return Err(FmmError::Failed("n_crit must be at least 1".to_string()));
        }

        let domain = domain.unwrap_or_else(|| Domain::from_local_points(positions));
        let max_level = max_level_for_dimension(D);

        let mut tree = Octree {
            domain,
            n_crit,
            max_level,
            depth: 0,
            nodes: Vec::new(),
            node_tags: Vec::new(),
            parents: Vec::new(),
            levels: Vec::new(),
            leaves: Vec::new(),
            leaf_nodes: Vec::new(),
            tags: Vec::new(),
            points: Vec::new(),
            global_indices: Vec::new(),
            next_global_index: positions.len(),
        };

        let tags = tree.classify(positions, 0)?;
        let global_indices = (0..positions.len()).collect_vec();
        tree.sort_and_build(particles, tags, global_indices)?;

        Ok(tree)
    }

    /// Insert the particles added to the end of the container since the last build, and rebuild.
    ///
    /// # Arguments
    /// * `particles` - Particle container, whose leading particles are those already in the
    ///   tree, in tree order.
    pub fn append<P>(&mut self, particles: &mut P) -> Result<(), FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let n_old = self.tags.len();
        let positions = particles.positions();

        if positions.len() < n_old {
            return Err(FmmError::LengthMismatch {
                expected: n_old,
                found: positions.len(),
            });
        }

        let n_new = positions.len() - n_old;
        let new_tags = self.classify(&positions[n_old..], n_old)?;

        let mut tags = std::mem::take(&mut self.tags);
        tags.extend(new_tags);

        let mut global_indices = std::mem::take(&mut self.global_indices);
        global_indices.extend(self.next_global_index..self.next_global_index + n_new);
        self.next_global_index += n_new;

        debug!("Appending {n_new} particles to a tree of {n_old}");
        self.sort_and_build(particles, tags, global_indices)
    }

    /// Drop the particles removed from the end of the container since the last build, and
    /// rebuild. The remaining tags are still sorted, so no particles are moved.
    ///
    /// # Arguments
    /// * `particles` - Particle container, truncated from the end.
    pub fn truncate<P>(&mut self, particles: &mut P) -> Result<(), FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let n = particles.positions().len();

        if n > self.tags.len() {
            return Err(FmmError::LengthMismatch {
                expected: self.tags.len(),
                found: n,
            });
        }

        if n == 0 {
            return Err(FmmError::Failed("Cannot build a tree over no particles".to_string()));
        }

        debug!("Truncating tree from {} to {n} particles", self.tags.len());
        self.tags.truncate(n);
        self.global_indices.truncate(n);
        self.points = particles.positions().to_vec();
        self.build()
    }

    /// Reclassify a single particle whose position has changed in the container, and rebuild.
    ///
    /// # Arguments
    /// * `particles` - Particle container, in tree order.
    /// * `index` - Position of the moved particle in the container.
    pub fn replace<P>(&mut self, particles: &mut P, index: usize) -> Result<(), FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let positions = particles.positions();

        if positions.len() != self.tags.len() {
            return Err(FmmError::LengthMismatch {
                expected: self.tags.len(),
                found: positions.len(),
            });
        }

        if index >= positions.len() {
            return Err(FmmError::Failed(format!(
                "Particle {index} is not in a tree of {} particles",
                positions.len()
            )));
        }

        let new_tag = self.classify(&positions[index..=index], index)?;

        let mut tags = std::mem::take(&mut self.tags);
        tags[index] = new_tag[0];
        let global_indices = std::mem::take(&mut self.global_indices);

        self.sort_and_build(particles, tags, global_indices)
    }

    /// Tag each position, checking that it lies in the domain.
    ///
    /// # Arguments
    /// * `positions` - Positions being classified.
    /// * `offset` - Container index of the first position, used to report out of domain points.
    fn classify(&self, positions: &[[T; D]], offset: usize) -> Result<Vec<u64>, FmmError> {
        let bounds = &self.domain.bounds;

        if let Some(i) = positions.iter().position(|p| !bounds.contains(p)) {
            return Err(FmmError::OutOfDomain { index: offset + i });
        }

        Ok(positions
            .par_iter()
            .map(|p| point_to_tag(p, bounds, self.max_level))
            .collect())
    }

    /// Stable sort particles by tag, mirror the permutation onto the container and rebuild.
    fn sort_and_build<P>(
        &mut self,
        particles: &mut P,
        tags: Vec<u64>,
        global_indices: Vec<usize>,
    ) -> Result<(), FmmError>
    where
        P: ParticleContainer<T, D>,
    {
        let mut permutation = (0..tags.len()).collect_vec();
        permutation.par_sort_by_key(|&i| tags[i]);

        self.tags = permutation.iter().map(|&i| tags[i]).collect();
        self.global_indices = permutation.iter().map(|&i| global_indices[i]).collect();

        particles.permute(&permutation);
        self.points = particles.positions().to_vec();

        self.build()
    }

    /// Level synchronous construction of the node and leaf arrays from the sorted tags.
    ///
    /// At each level the children of every active internal node are generated, and the
    /// particles under each child are found by binary searching the sorted tags. Children are
    /// then classified, and exclusive scans over the classification assign each new internal
    /// node its child block and each new leaf its leaf offset.
    fn build(&mut self) -> Result<(), FmmError> {
        let n_points = self.tags.len();
        let n_children = n_children(D);
        let max_level = self.max_level;
        let n_crit = self.n_crit;

        let mut nodes = Vec::new();
        let mut node_tags = vec![0u64];
        let mut parents = vec![None];
        let mut levels = vec![(0, 1)];
        let mut leaves = Vec::new();
        let mut leaf_nodes = Vec::new();

        let mut active: Vec<NodeIndex> = Vec::new();
        if n_points <= n_crit {
            nodes.push(Node::Leaf(0));
            leaves.push((0, n_points));
            leaf_nodes.push(0);
        } else {
            nodes.push(Node::Internal(1));
            active.push(0);
        }

        let mut level = 0;
        while !active.is_empty() {
            level += 1;

            if level > max_level {
                return Err(FmmError::DepthExceeded { max_level });
            }

            let tags = &self.tags;
            let span = tag_span(level, max_level, D);

            // Particle range of each child of each active node
            let children: Vec<(u64, usize, usize)> = active
                .par_iter()
                .flat_map_iter(|&parent| {
                    let parent_tag = node_tags[parent];
                    (0..n_children).map(move |which_child| {
                        let tag = child_tag(parent_tag, which_child, level, max_level, D);
                        let lower = tags.partition_point(|&t| t < tag);
                        let upper = tags.partition_point(|&t| t < tag + span);
                        (tag, lower, upper)
                    })
                })
                .collect();

            let is_internal = children
                .iter()
                .map(|&(_, lower, upper)| usize::from(upper - lower > n_crit && level < max_level))
                .collect_vec();

            let is_leaf = children
                .iter()
                .zip(is_internal.iter())
                .map(|(&(_, lower, upper), &internal)| usize::from(upper > lower && internal == 0))
                .collect_vec();

            let internal_offsets = exclusive_scan(&is_internal);
            let leaf_offsets = exclusive_scan(&is_leaf);

            let level_begin = nodes.len();
            let next_level_begin = level_begin + children.len();
            let leaf_begin = leaves.len();

            let mut next_active = Vec::new();

            for (k, &(tag, lower, upper)) in children.iter().enumerate() {
                let index = level_begin + k;

                let node = if is_internal[k] == 1 {
                    next_active.push(index);
                    Node::Internal(next_level_begin + n_children * internal_offsets[k])
                } else if is_leaf[k] == 1 {
                    leaves.push((lower, upper));
                    leaf_nodes.push(index);
                    Node::Leaf(leaf_begin + leaf_offsets[k])
                } else {
                    Node::Empty
                };

                nodes.push(node);
                node_tags.push(tag);
                parents.push(Some(active[k / n_children]));
            }

            levels.push((level_begin, nodes.len()));
            active = next_active;
        }

        self.depth = levels.len() - 1;
        self.nodes = nodes;
        self.node_tags = node_tags;
        self.parents = parents;
        self.levels = levels;
        self.leaves = leaves;
        self.leaf_nodes = leaf_nodes;

        debug!(
            "Built tree over {n_points} particles: {} nodes, {} leaves, depth {}",
            self.nodes.len(),
            self.leaves.len(),
            self.depth
        );

        trace!("Nodes: {:?}", self.nodes);
        trace!("Leaves: {:?}", self.leaves);

        Ok(())
    }

    /// Level of a node slot.
    pub fn node_level(&self, index: NodeIndex) -> usize {
        self.levels.partition_point(|&(_, end)| end <= index)
    }

    /// Number of particles in the tree.
    pub fn n_points(&self) -> usize {
        self.points.len()
    }
}
