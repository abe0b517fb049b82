//! Read-only traversal of octrees.
use std::ops::Range;

use crate::traits::{general::FmmScalar, tree::SpatialTree};
use crate::tree::{
    morton::{n_children, tag_to_bounds},
    types::{Bounds, Domain, Node, NodeIndex, Octree},
};

/// Iterator over the non-empty children of a node.
pub struct Children<'a> {
    nodes: &'a [Node],
    slots: Range<NodeIndex>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .by_ref()
            .find(|&index| !matches!(self.nodes[index], Node::Empty))
    }
}

/// Depth first iterator over the leaves beneath a node.
pub struct Subtree<'a> {
    nodes: &'a [Node],
    stack: Vec<NodeIndex>,
    n_children: usize,
}

impl<'a> Iterator for Subtree<'a> {
    type Item = NodeIndex;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(index) = self.stack.pop() {
            match self.nodes[index] {
                Node::Leaf(_) => return Some(index),
                Node::Internal(first) => {
                    // Reversed, so that children are visited in slot order
                    self.stack.extend((first..first + self.n_children).rev());
                }
                Node::Empty => {}
            }
        }
        None
    }
}

/// Depth first iterator over the leaves whose box lies within an L-infinity distance of a
/// point, pruning subtrees whose box is further away.
pub struct LeavesNearPoint<'a, T, const D: usize> {
    nodes: &'a [Node],
    stack: Vec<(NodeIndex, Bounds<T, D>)>,
    point: [T; D],
    max_distance: T,
}

impl<'a, T, const D: usize> Iterator for LeavesNearPoint<'a, T, D>
where
    T: FmmScalar,
{
    type Item = (NodeIndex, Bounds<T, D>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((index, bounds)) = self.stack.pop() {
            if bounds.distance_to_point(&self.point) > self.max_distance {
                continue;
            }

            match self.nodes[index] {
                Node::Leaf(_) => return Some((index, bounds)),
                Node::Internal(first) => {
                    for which_child in (0..n_children(D)).rev() {
                        self.stack.push((first + which_child, bounds.child(which_child)));
                    }
                }
                Node::Empty => {}
            }
        }
        None
    }
}

impl<T, const D: usize> Octree<T, D>
where
    T: FmmScalar,
{
    /// Iterate over the leaves whose box is within `max_distance` of a point, measured as the
    /// largest per axis gap. Each leaf is returned with its bounds.
    ///
    /// # Arguments
    /// * `point` - The query point, need not be inside the domain.
    /// * `max_distance` - Search radius.
    pub fn leaves_near_point(&self, point: &[T; D], max_distance: T) -> LeavesNearPoint<'_, T, D> {
        LeavesNearPoint {
            nodes: &self.nodes,
            stack: vec![(0, self.domain.bounds)],
            point: *point,
            max_distance,
        }
    }
}

impl<T, const D: usize> SpatialTree<D> for Octree<T, D>
where
    T: FmmScalar,
{
    type Scalar = T;

    fn domain(&self) -> &Domain<T, D> {
        &self.domain
    }

    fn root(&self) -> NodeIndex {
        0
    }

    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn depth(&self) -> usize {
        self.depth
    }

    fn level_range(&self, level: usize) -> Range<NodeIndex> {
        let (start, end) = self.levels[level];
        start..end
    }

    fn node(&self, index: NodeIndex) -> Node {
        self.nodes[index]
    }

    fn parent(&self, index: NodeIndex) -> Option<NodeIndex> {
        self.parents[index]
    }

    fn bounds(&self, index: NodeIndex) -> Bounds<T, D> {
        let level = self.node_level(index);
        tag_to_bounds(self.node_tags[index], level, self.max_level, &self.domain.bounds)
    }

    fn children(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let slots = match self.nodes[index] {
            Node::Internal(first) => first..first + n_children(D),
            _ => 0..0,
        };

        Children {
            nodes: &self.nodes,
            slots,
        }
    }

    fn leaf_particles(&self, index: NodeIndex) -> Option<Range<usize>> {
        match self.nodes[index] {
            Node::Leaf(offset) => {
                let (start, end) = self.leaves[offset];
                Some(start..end)
            }
            _ => None,
        }
    }

    fn points(&self) -> &[[T; D]] {
        &self.points
    }

    fn subtree(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        Subtree {
            nodes: &self.nodes,
            stack: vec![index],
            n_children: n_children(D),
        }
    }

    fn locate(&self, point: &[T; D]) -> (NodeIndex, Bounds<T, D>) {
        let mut bounds = self.domain.bounds;
        assert!(
            bounds.contains(point),
            "Point {point:?} is outside of the domain {bounds:?}"
        );

        let mut index = 0;
        while let Node::Internal(first) = self.nodes[index] {
            let which_child = bounds.child_index(point);
            let child = first + which_child;

            if matches!(self.nodes[child], Node::Empty) {
                break;
            }

            index = child;
            bounds = bounds.child(which_child);
        }

        (index, bounds)
    }
}
