//! Crate wide constants for trees

/// Number of bits available to a spatial tag.
pub const TAG_BITS: usize = 64;

/// Levels held back from the tag budget.
pub const TAG_HEADROOM_LEVELS: usize = 2;

/// Default value chosen for maximum number of particles per leaf.
pub const DEFAULT_NCRIT: usize = 10;

/// Fraction of the largest extent of a point cloud added on each side of its bounding box,
/// such that no points lie on the actual edge of the domain.
pub const DOMAIN_PADDING: f64 = 0.005;
