//! Traits that are useful across modules
use std::fmt::Debug;

use num::Float;

/// Floating point types that trees and FMMs can be built over.
///
/// Conversions from `f64` and `usize` are infallible for the implementing types, which lets
/// numerical constants be written without unwrapping a `NumCast`.
pub trait FmmScalar: Float + Default + Debug + Send + Sync + 'static {
    /// Convert a double precision constant into this type.
    fn from_f64(value: f64) -> Self;

    /// Convert a count or index into this type.
    fn from_usize(value: usize) -> Self;
}

impl FmmScalar for f32 {
    fn from_f64(value: f64) -> Self {
        value as f32
    }

    fn from_usize(value: usize) -> Self {
        value as f32
    }
}

impl FmmScalar for f64 {
    fn from_f64(value: f64) -> Self {
        value
    }

    fn from_usize(value: usize) -> Self {
        value as f64
    }
}
