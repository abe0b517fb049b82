//! Spatial tags: Morton style codes interleaving the per axis bisection bits of a point.
//!
//! A tag describes one cell at the deepest level of refinement. Reading its bits from the most
//! significant end, each group of `D` bits selects a child at one level, the bit for axis `i`
//! sitting at position `D - 1 - i` of the group, matching [`Bounds::child_index`]. A node at a
//! coarser level is identified by the tag of its lowest cell, whose trailing groups are zero.
use crate::traits::general::FmmScalar;
use crate::tree::{
    constants::{TAG_BITS, TAG_HEADROOM_LEVELS},
    types::Bounds,
};

/// Deepest level a tag can encode in a given dimension.
///
/// # Arguments
/// * `dim` - Spatial dimension.
pub fn max_level_for_dimension(dim: usize) -> usize {
    (TAG_BITS / dim.max(1))
        .saturating_sub(TAG_HEADROOM_LEVELS)
        .max(1)
}

/// Number of children of an internal node in a given dimension.
pub fn n_children(dim: usize) -> usize {
    1 << dim
}

/// Map a point to the tag of the cell containing it at `max_level`.
///
/// The box is split recursively along each axis at its midpoint, points on a splitting plane
/// belong to the upper half. Points on the upper face of the box map to the highest cell.
///
/// # Arguments
/// * `point` - The point being classified, expected to lie in `bounds`.
/// * `bounds` - The box being subdivided.
/// * `max_level` - Number of bisections along each axis.
pub fn point_to_tag<T, const D: usize>(point: &[T; D], bounds: &Bounds<T, D>, max_level: usize) -> u64
where
    T: FmmScalar,
{
    let mut cell = *bounds;
    let mut tag = 0u64;

    for _ in 0..max_level {
        let which_child = cell.child_index(point);
        tag = (tag << D) | which_child as u64;
        cell = cell.child(which_child);
    }

    tag
}

/// Number of deepest level cells beneath a node at `level`.
pub fn tag_span(level: usize, max_level: usize, dim: usize) -> u64 {
    1u64 << ((max_level - level) * dim)
}

/// Tag of a child of a node at `level - 1`.
///
/// # Arguments
/// * `tag` - Tag of the parent.
/// * `which_child` - Child index in `0..2^D`.
/// * `level` - Level of the child.
/// * `max_level` - Deepest level of the tags.
/// * `dim` - Spatial dimension.
pub fn child_tag(tag: u64, which_child: usize, level: usize, max_level: usize, dim: usize) -> u64 {
    tag | ((which_child as u64) << ((max_level - level) * dim))
}

/// Child index chosen at `level` on the path to a tag.
pub fn tag_child_index(tag: u64, level: usize, max_level: usize, dim: usize) -> usize {
    let mask = (n_children(dim) - 1) as u64;
    ((tag >> ((max_level - level) * dim)) & mask) as usize
}

/// Recompute the bounds of the node at `level` identified by `tag`, by replaying its half-space
/// choices from the root box.
///
/// # Arguments
/// * `tag` - Tag of the node.
/// * `level` - Level of the node.
/// * `max_level` - Deepest level of the tags.
/// * `root` - Bounds of the root.
pub fn tag_to_bounds<T, const D: usize>(
    tag: u64,
    level: usize,
    max_level: usize,
    root: &Bounds<T, D>,
) -> Bounds<T, D>
where
    T: FmmScalar,
{
    (1..=level).fold(*root, |bounds, l| {
        bounds.child(tag_child_index(tag, l, max_level, D))
    })
}
