//! Helper Functions
use num::Zero;
use rayon::prelude::*;

use crate::traits::{fmm::Kernel, general::FmmScalar};

/// Evaluate the potential at every particle by direct summation over all particles, including
/// each particle's interaction with itself. Intended as an O(N^2) reference for testing.
///
/// # Arguments
/// * `kernel` - The interaction kernel.
/// * `points` - Particle positions.
/// * `charges` - One source value per particle.
pub fn direct_evaluation<K, const D: usize>(
    kernel: &K,
    points: &[[K::Scalar; D]],
    charges: &[K::Scalar],
) -> Vec<K::Scalar>
where
    K: Kernel<D>,
{
    points
        .par_iter()
        .map(|target| {
            points
                .iter()
                .zip(charges)
                .fold(K::Scalar::zero(), |acc, (source, &charge)| {
                    acc + kernel.evaluate(target, source) * charge
                })
        })
        .collect()
}

/// Relative error in the L2 norm, `|approx - exact| / |exact|`.
///
/// # Arguments
/// * `approx` - Approximate values.
/// * `exact` - Reference values.
pub fn relative_l2_error<T: FmmScalar>(approx: &[T], exact: &[T]) -> T {
    let (error, scale) = approx
        .iter()
        .zip(exact)
        .fold((T::zero(), T::zero()), |(error, scale), (&a, &e)| {
            (error + (a - e) * (a - e), scale + e * e)
        });

    (error / scale).sqrt()
}
