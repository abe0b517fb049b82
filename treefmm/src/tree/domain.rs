//! Constructors and geometric queries for bounding boxes and domains.
use std::array;

use itertools::izip;

use crate::traits::general::FmmScalar;
use crate::tree::{
    constants::DOMAIN_PADDING,
    types::{Bounds, Domain},
};

impl<T, const D: usize> Bounds<T, D>
where
    T: FmmScalar,
{
    /// Construct a box from its lower and upper corners.
    pub fn new(min: [T; D], max: [T; D]) -> Self {
        Bounds { min, max }
    }

    /// Midpoint of the box along one axis, the plane it is split at.
    pub fn midpoint(&self, axis: usize) -> T {
        T::from_f64(0.5) * (self.min[axis] + self.max[axis])
    }

    /// Centre of the box.
    pub fn centre(&self) -> [T; D] {
        array::from_fn(|i| self.midpoint(i))
    }

    /// Extent of the box along each axis.
    pub fn side_lengths(&self) -> [T; D] {
        array::from_fn(|i| self.max[i] - self.min[i])
    }

    /// Half the length of the box diagonal, the radius of its circumscribing sphere.
    pub fn half_diagonal(&self) -> T {
        let squared = self
            .side_lengths()
            .iter()
            .fold(T::zero(), |acc, &s| acc + s * s);
        T::from_f64(0.5) * squared.sqrt()
    }

    /// Whether a point lies in the closed box.
    pub fn contains(&self, point: &[T; D]) -> bool {
        izip!(point, &self.min, &self.max).all(|(&p, &lo, &hi)| lo <= p && p <= hi)
    }

    /// Index of the child whose half-space contains a point. Bit `D - 1 - i` of the index is set
    /// when the point is in the upper half of axis `i`.
    pub fn child_index(&self, point: &[T; D]) -> usize {
        (0..D).fold(0, |which, i| {
            (which << 1) | usize::from(point[i] >= self.midpoint(i))
        })
    }

    /// Bounds of a child, obtained by halving every axis.
    ///
    /// # Arguments
    /// * `which_child` - Child index in `0..2^D`, see [`Bounds::child_index`].
    pub fn child(&self, which_child: usize) -> Self {
        let mut child = *self;
        for i in 0..D {
            let mid = self.midpoint(i);
            if which_child & (1 << (D - 1 - i)) != 0 {
                child.min[i] = mid;
            } else {
                child.max[i] = mid;
            }
        }
        child
    }

    /// Largest per axis gap between the box and a point, zero if the point is inside.
    pub fn distance_to_point(&self, point: &[T; D]) -> T {
        izip!(point, &self.min, &self.max).fold(T::zero(), |acc, (&p, &lo, &hi)| {
            acc.max(lo - p).max(p - hi)
        })
    }
}

impl<T, const D: usize> Domain<T, D>
where
    T: FmmScalar,
{
    /// Construct a domain from its corners and periodicity.
    ///
    /// # Arguments
    /// * `min` - Lower corner of the domain.
    /// * `max` - Upper corner of the domain.
    /// * `periodic` - Whether each axis wraps around.
    pub fn new(min: [T; D], max: [T; D], periodic: [bool; D]) -> Self {
        Domain {
            bounds: Bounds::new(min, max),
            periodic,
        }
    }

    /// Compute the non-periodic, cubic domain defined by a set of points. The domain adds a small
    /// threshold such that no points lie on the actual edge of the domain.
    ///
    /// # Arguments
    /// * `points` - A slice of point coordinates.
    pub fn from_local_points(points: &[[T; D]]) -> Domain<T, D> {
        let mut min = [T::infinity(); D];
        let mut max = [T::neg_infinity(); D];

        for point in points {
            for i in 0..D {
                min[i] = min[i].min(point[i]);
                max[i] = max[i].max(point[i]);
            }
        }

        if points.is_empty() {
            min = [T::zero(); D];
            max = [T::zero(); D];
        }

        // Want a cubic box to place everything in
        let mut side_length = (0..D).fold(T::zero(), |acc, i| acc.max(max[i] - min[i]));
        if side_length <= T::zero() {
            side_length = T::one();
        }

        let err = side_length * T::from_f64(DOMAIN_PADDING);
        let two = T::from_f64(2.0);

        let min: [T; D] = array::from_fn(|i| min[i] - err);
        let max: [T; D] = array::from_fn(|i| min[i] + side_length + two * err);

        Domain::new(min, max, [false; D])
    }

    /// Whether any axis is periodic.
    pub fn is_periodic(&self) -> bool {
        self.periodic.iter().any(|&p| p)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::helpers::points_fixture;

    #[test]
    fn test_compute_bounds() {
        let npoints = 1000;
        let points = points_fixture::<f64, 3>(npoints, Some(-1.0), Some(1.0), None);
        let domain = Domain::from_local_points(&points);

        // Test that the domain contains all the points
        for point in points.iter() {
            assert!(domain.bounds.contains(point));
            assert!(domain.bounds.distance_to_point(point) == 0.0);
        }

        // Test that the domain is cubic
        let sides = domain.bounds.side_lengths();
        assert!((sides[0] - sides[1]).abs() < 1e-12);
        assert!((sides[0] - sides[2]).abs() < 1e-12);
        assert!(!domain.is_periodic());
    }

    #[test]
    fn test_degenerate_points() {
        let points = vec![[0.5f64, 0.5]; 4];
        let domain = Domain::from_local_points(&points);
        let sides = domain.bounds.side_lengths();
        assert!(sides.iter().all(|&s| s > 0.0));
        assert!(domain.bounds.contains(&points[0]));
    }

    #[test]
    fn test_contains_closed_faces() {
        let parent = Bounds::new([0.0f64, 0.0], [2.0, 2.0]);

        // Both faces of the box are inside
        assert!(parent.contains(&[0.0, 2.0]));
        assert!(parent.contains(&[2.0, 2.0]));
        assert!(!parent.contains(&[2.0 + 1e-12, 1.0]));

        // A point on the face shared by two children is in both, and is assigned to the upper
        let point = [1.0, 0.5];
        assert!(parent.child(0b00).contains(&point));
        assert!(parent.child(0b10).contains(&point));
        assert_eq!(parent.child_index(&point), 0b10);
    }

    #[test]
    fn test_children_partition_parent() {
        let parent = Bounds::new([0.0f64, -1.0, 2.0], [1.0, 1.0, 4.0]);
        let points = points_fixture::<f64, 3>(200, Some(0.0), Some(1.0), Some(3));

        for point in points.iter() {
            // Map into the parent box
            let p = [point[0], 2.0 * point[1] - 1.0, 2.0 + 2.0 * point[2]];
            let which = parent.child_index(&p);
            assert!(parent.child(which).contains(&p));

            let inside = (0..8).filter(|&c| {
                let child = parent.child(c);
                (0..3).all(|i| child.min[i] <= p[i] && p[i] < child.max[i])
            });
            assert!(inside.count() <= 1);
        }

        // Child volumes sum to the parent's
        let volume = |b: &Bounds<f64, 3>| b.side_lengths().iter().product::<f64>();
        let total: f64 = (0..8).map(|c| volume(&parent.child(c))).sum();
        assert!((total - volume(&parent)).abs() < 1e-12);
    }

    #[test]
    fn test_half_diagonal() {
        let b = Bounds::new([0.0f64, 0.0], [3.0, 4.0]);
        assert!((b.half_diagonal() - 2.5).abs() < 1e-12);
        assert_eq!(b.centre(), [1.5, 2.0]);
        assert_eq!(b.distance_to_point(&[5.0, 1.0]), 2.0);
    }
}
