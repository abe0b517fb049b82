//! Helper functions used in testing tree implementations, specifically test point generators.

use rand::prelude::*;

use crate::traits::general::FmmScalar;

/// Points fixture for testing, uniformly samples in each axis from min to max.
///
/// # Arguments
/// * `n_points` - The number of points to sample.
/// * `min` - The minimum coordinate value along each axis, defaults to 0.
/// * `max` - The maximum coordinate value along each axis, defaults to 1.
/// * `seed` - Random seed, defaults to 0.
pub fn points_fixture<T: FmmScalar, const D: usize>(
    n_points: usize,
    min: Option<T>,
    max: Option<T>,
    seed: Option<u64>,
) -> Vec<[T; D]> {
    // Generate a set of randomly distributed points
    let seed = seed.unwrap_or(0);
    let mut range = StdRng::seed_from_u64(seed);

    let min = min.unwrap_or_else(T::zero);
    let max = max.unwrap_or_else(T::one);
    let between = rand::distributions::Uniform::from(0.0f64..1.0f64);

    (0..n_points)
        .map(|_| std::array::from_fn(|_| min + (max - min) * T::from_f64(between.sample(&mut range))))
        .collect()
}
