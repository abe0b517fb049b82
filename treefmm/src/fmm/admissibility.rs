//! Geometric admissibility of box pairs for far field approximation.
use crate::traits::general::FmmScalar;
use crate::tree::types::Bounds;

/// The θ-criterion deciding whether a source box is well separated from a target box.
///
/// With `r_t` and `r_s` the half diagonals of the target and source boxes, `d` the distance
/// between their centres, and `r_big`, `r_small` the larger and smaller of the two radii, the
/// pair is admissible when the spheres circumscribing the boxes are disjoint and
/// `r_big <= θ (d - r_small)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaCondition<T> {
    /// Separation ratio, smaller values demand wider separation.
    pub theta: T,
}

impl<T> ThetaCondition<T>
where
    T: FmmScalar,
{
    /// Constructor
    pub fn new(theta: T) -> Self {
        Self { theta }
    }

    /// Whether the multipole expansion of `source` may be translated into the local expansion of
    /// `target`.
    ///
    /// # Arguments
    /// * `target` - Box receiving the local expansion.
    /// * `source` - Box whose multipole expansion is translated.
    pub fn is_admissible<const D: usize>(&self, target: &Bounds<T, D>, source: &Bounds<T, D>) -> bool {
        let r_target = target.half_diagonal();
        let r_source = source.half_diagonal();

        let target_centre = target.centre();
        let source_centre = source.centre();
        let distance = (0..D)
            .fold(T::zero(), |acc, i| {
                let dx = target_centre[i] - source_centre[i];
                acc + dx * dx
            })
            .sqrt();

        let r_big = r_target.max(r_source);
        let r_small = r_target.min(r_source);

        distance > r_target + r_source && r_big <= self.theta * (distance - r_small)
    }
}
