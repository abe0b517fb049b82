//! Crate wide constants

/// Default separation ratio of the θ-criterion.
pub const DEFAULT_THETA: f64 = 0.5;

/// Default number of interpolation nodes along each axis of an expansion.
pub const DEFAULT_EXPANSION_ORDER: usize = 3;

/// Memory budget of the cached multipole to local operators of an expansion, in bytes.
pub const M2L_CACHE_BYTES: usize = 1 << 28;
