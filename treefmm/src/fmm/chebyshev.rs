//! Black box expansions by tensor product Chebyshev interpolation.
//!
//! A multipole expansion stores the source weights lumped onto the `n^D` Chebyshev nodes of a
//! box, a local expansion stores the field sampled at those nodes. Every translation is then a
//! dense operator between node sets, an interpolation matrix or a matrix of kernel values, so
//! that any smooth kernel is supported without kernel specific expansions.
//!
//! The `2^D` transfer matrices between a box and its children are computed once, in reference
//! coordinates. Multipole to local operators of translation invariant kernels are cached by
//! the size and relative position of the box pair, up to `M2L_CACHE_BYTES`.
//!
//! # References
//! W. Fong, E. Darve, The black-box fast multipole method, Journal of Computational Physics 228
//! (23) (2009) 8712-8725.
use std::array;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use faer::{linalg::matmul, Accum, Mat, MatMut, MatRef, Par};
use faer_traits::RealField;
use num::{Float, One, ToPrimitive, Zero};

use crate::fmm::constants::{DEFAULT_EXPANSION_ORDER, M2L_CACHE_BYTES};
use crate::traits::{
    fmm::{Expansions, Kernel},
    general::FmmScalar,
    types::FmmError,
};
use crate::tree::types::Bounds;

/// Generates the Chebyshev nodes of `T_n` in `[-1, 1]`, in ascending order.
fn chebyshev_nodes<T: FmmScalar>(order: usize) -> Vec<T> {
    (0..order)
        .rev()
        .map(|i| {
            let theta = std::f64::consts::PI * (i as f64 + 0.5) / order as f64;
            T::from_f64(theta.cos())
        })
        .collect()
}

/// Evaluates `T_k(x)` for `k < order` with the recurrence `T_{k+1}(x) = 2x T_k(x) - T_{k-1}(x)`.
fn chebyshev_polynomials<T: FmmScalar>(x: T, order: usize) -> Vec<T> {
    let two = T::from_f64(2.0);
    let mut tn = Vec::with_capacity(order);

    for k in 0..order {
        let value = match k {
            0 => T::one(),
            1 => x,
            _ => two * x * tn[k - 1] - tn[k - 2],
        };
        tn.push(value);
    }

    tn
}

/// `T_k(x_j)` for `k < order`, one column per coordinate.
fn polynomial_matrix<T: FmmScalar + RealField>(xs: &[T], order: usize) -> Mat<T> {
    let mut polynomials = Mat::zeros(order, xs.len());
    for (j, &x) in xs.iter().enumerate() {
        for (k, value) in chebyshev_polynomials(x, order).into_iter().enumerate() {
            polynomials[(k, j)] = value;
        }
    }
    polynomials
}

/// Coordinate of `x` in the interval `[lo, hi]` mapped onto `[-1, 1]`, zero for an empty
/// interval.
fn reference_coordinate<T: FmmScalar>(x: T, lo: T, hi: T) -> T {
    let width = hi - lo;
    if width > T::zero() {
        (T::from_f64(2.0) * x - (lo + hi)) / width
    } else {
        T::zero()
    }
}

/// Accumulate `operator * input` into `output`.
fn accumulate<T: FmmScalar + RealField>(operator: MatRef<'_, T>, input: &[T], output: &mut [T]) {
    let (nrows, ncols) = (operator.nrows(), operator.ncols());
    matmul::matmul(
        MatMut::from_column_major_slice_mut(output, nrows, 1),
        Accum::Add,
        operator,
        MatRef::from_column_major_slice(input, ncols, 1),
        T::one(),
        Par::Seq,
    );
}

/// Geometry of a pair of equally sized boxes: the side lengths, and the offset of the source
/// centre from the target centre in side lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TransferKey<const D: usize> {
    sides: [u64; D],
    offsets: [i64; D],
}

/// Chebyshev interpolation expansions of a kernel.
pub struct ChebyshevExpansions<K, const D: usize>
where
    K: Kernel<D>,
{
    kernel: K,
    order: usize,
    n_coeffs: usize,
    nodes: Vec<K::Scalar>,
    /// `node_polynomials[(k, m)] = T_k(nodes[m])`.
    node_polynomials: Mat<K::Scalar>,
    /// Anterpolation from the nodes of each child onto the nodes of its parent, indexed by
    /// child. The transpose interpolates from the parent onto the child.
    child_transfers: Vec<Mat<K::Scalar>>,
    m2l_cache: RwLock<HashMap<TransferKey<D>, Arc<Mat<K::Scalar>>>>,
    m2l_cache_capacity: usize,
}

impl<K, const D: usize> ChebyshevExpansions<K, D>
where
    K: Kernel<D>,
    K::Scalar: RealField,
{
    /// Constructor
    ///
    /// # Arguments
    /// * `kernel` - The interaction kernel.
    /// * `order` - Number of interpolation nodes along each axis, defaults to
    ///   `DEFAULT_EXPANSION_ORDER`.
    pub fn new(kernel: K, order: Option<usize>) -> Result<Self, FmmError> {
        let order = order.unwrap_or(DEFAULT_EXPANSION_ORDER);

        if order == 0 {
            return Err(FmmError::Failed(
                "Expansion order must be at least 1".to_string(),
            ));
        }

        let n_coeffs = order.pow(D as u32);
        let nodes = chebyshev_nodes(order);
        let node_polynomials = polynomial_matrix(&nodes, order);
        let operator_bytes = n_coeffs * n_coeffs * std::mem::size_of::<K::Scalar>();

        let mut expansions = Self {
            kernel,
            order,
            n_coeffs,
            nodes,
            node_polynomials,
            child_transfers: Vec::new(),
            m2l_cache: RwLock::new(HashMap::new()),
            m2l_cache_capacity: (M2L_CACHE_BYTES / operator_bytes).max(1),
        };

        expansions.child_transfers = (0..1 << D)
            .map(|which| expansions.child_transfer(which))
            .collect();

        Ok(expansions)
    }

    /// Number of interpolation nodes along each axis.
    pub fn order(&self) -> usize {
        self.order
    }

    /// The interaction kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Interpolation weights `S_n(x_j, y_m)` of reference coordinates against every node, one
    /// row per node and one column per coordinate.
    fn weight_matrix(&self, xs: &[K::Scalar]) -> Mat<K::Scalar> {
        let n = self.order;
        let scale = K::Scalar::one() / K::Scalar::from_usize(n);
        let polynomials = polynomial_matrix(xs, n);

        // S_n(x, y) = (2 sum_k T_k(x) T_k(y) - 1) / n
        let mut weights = Mat::zeros(n, xs.len());
        matmul::matmul(
            weights.as_mut(),
            Accum::Replace,
            self.node_polynomials.as_ref().transpose(),
            polynomials.as_ref(),
            K::Scalar::from_f64(2.0) * scale,
            Par::Seq,
        );

        for j in 0..xs.len() {
            for m in 0..n {
                weights[(m, j)] = weights[(m, j)] - scale;
            }
        }

        weights
    }

    /// Per axis node indices of a coefficient, the last axis varying fastest.
    fn multi_index(&self, index: usize) -> [usize; D] {
        let mut remainder = index;
        let mut multi_index = [0; D];
        for axis in (0..D).rev() {
            multi_index[axis] = remainder % self.order;
            remainder /= self.order;
        }
        multi_index
    }

    /// Tensor product of per axis weights, for coefficient `index` against the per axis
    /// columns `columns`.
    fn tensor_entry(
        &self,
        axis_weights: &[Mat<K::Scalar>; D],
        index: usize,
        columns: [usize; D],
    ) -> K::Scalar {
        let rows = self.multi_index(index);
        (0..D).fold(K::Scalar::one(), |weight, axis| {
            weight * axis_weights[axis][(rows[axis], columns[axis])]
        })
    }

    /// Interpolation weights of every particle against the nodes of a box, one row per
    /// coefficient and one column per particle.
    fn particle_weights(
        &self,
        bounds: &Bounds<K::Scalar, D>,
        points: &[[K::Scalar; D]],
    ) -> Mat<K::Scalar> {
        let axis_weights: [Mat<K::Scalar>; D] = array::from_fn(|i| {
            let xs = points
                .iter()
                .map(|p| reference_coordinate(p[i], bounds.min[i], bounds.max[i]))
                .collect::<Vec<_>>();
            self.weight_matrix(&xs)
        });

        Mat::from_fn(self.n_coeffs, points.len(), |index, j| {
            self.tensor_entry(&axis_weights, index, [j; D])
        })
    }

    /// Transfer matrix from a tensor grid of child nodes onto the parent nodes, given the per
    /// axis child node coordinates in the parent's reference box.
    fn tensor_transfer(&self, child_coordinates: &[Vec<K::Scalar>; D]) -> Mat<K::Scalar> {
        let axis_weights: [Mat<K::Scalar>; D] =
            array::from_fn(|i| self.weight_matrix(&child_coordinates[i]));

        Mat::from_fn(self.n_coeffs, self.n_coeffs, |m, k| {
            self.tensor_entry(&axis_weights, m, self.multi_index(k))
        })
    }

    /// Transfer matrix of a child of the reference box `[-1, 1]^D`.
    fn child_transfer(&self, which_child: usize) -> Mat<K::Scalar> {
        let half = K::Scalar::from_f64(0.5);
        let coordinates = array::from_fn(|i| {
            let shift = if which_child & (1 << (D - 1 - i)) != 0 {
                K::Scalar::one()
            } else {
                -K::Scalar::one()
            };
            self.nodes.iter().map(|&y| half * (y + shift)).collect()
        });
        self.tensor_transfer(&coordinates)
    }

    /// Transfer matrix between arbitrary nested boxes.
    fn transfer(
        &self,
        parent: &Bounds<K::Scalar, D>,
        child: &Bounds<K::Scalar, D>,
    ) -> Mat<K::Scalar> {
        let half = K::Scalar::from_f64(0.5);
        let coordinates = array::from_fn(|i| {
            let centre = child.midpoint(i);
            let half_width = half * (child.max[i] - child.min[i]);
            self.nodes
                .iter()
                .map(|&y| {
                    reference_coordinate(centre + half_width * y, parent.min[i], parent.max[i])
                })
                .collect()
        });
        self.tensor_transfer(&coordinates)
    }

    /// Index of `child` among the children of `parent`, if it is one of them.
    fn child_position(
        &self,
        parent: &Bounds<K::Scalar, D>,
        child: &Bounds<K::Scalar, D>,
    ) -> Option<usize> {
        (0..D).try_fold(0, |which, i| {
            let mid = parent.midpoint(i);
            if parent.min[i] >= parent.max[i] {
                None
            } else if child.min[i] == parent.min[i] && child.max[i] == mid {
                Some(which << 1)
            } else if child.min[i] == mid && child.max[i] == parent.max[i] {
                Some((which << 1) | 1)
            } else {
                None
            }
        })
    }

    /// Kernel values between the nodes of two boxes.
    fn kernel_matrix(
        &self,
        target: &Bounds<K::Scalar, D>,
        source: &Bounds<K::Scalar, D>,
    ) -> Mat<K::Scalar> {
        let target_nodes = self.node_positions(target);
        let source_nodes = self.node_positions(source);
        Mat::from_fn(self.n_coeffs, self.n_coeffs, |i, j| {
            self.kernel.evaluate(&target_nodes[i], &source_nodes[j])
        })
    }

    /// Cache key of a box pair, with the pair translated so that the target is centred on the
    /// origin. Only pairs of equally sized boxes at whole multiples of the side length apart
    /// have a key.
    fn m2l_key(
        &self,
        target: &Bounds<K::Scalar, D>,
        source: &Bounds<K::Scalar, D>,
    ) -> Option<(TransferKey<D>, Bounds<K::Scalar, D>, Bounds<K::Scalar, D>)> {
        if !self.kernel.is_translation_invariant() {
            return None;
        }

        let half = K::Scalar::from_f64(0.5);
        let tolerance = K::Scalar::from_f64(1e-6);
        let sides = target.side_lengths();
        let source_sides = source.side_lengths();
        let target_centre = target.centre();
        let source_centre = source.centre();

        let mut key = TransferKey {
            sides: [0; D],
            offsets: [0; D],
        };
        let mut canonical_target = *target;
        let mut canonical_source = *source;

        for i in 0..D {
            if sides[i] <= K::Scalar::zero() || sides[i] != source_sides[i] {
                return None;
            }

            let offset = (source_centre[i] - target_centre[i]) / sides[i];
            let rounded = offset.round();
            if (offset - rounded).abs() > tolerance {
                return None;
            }

            key.sides[i] = sides[i].to_f64()?.to_bits();
            key.offsets[i] = rounded.to_i64()?;

            let half_side = half * sides[i];
            let centre = rounded * sides[i];
            canonical_target.min[i] = -half_side;
            canonical_target.max[i] = half_side;
            canonical_source.min[i] = centre - half_side;
            canonical_source.max[i] = centre + half_side;
        }

        Some((key, canonical_target, canonical_source))
    }

    /// The multipole to local operator of a box pair, shared with every pair of the same
    /// geometry when the kernel is translation invariant.
    fn m2l_operator(
        &self,
        target: &Bounds<K::Scalar, D>,
        source: &Bounds<K::Scalar, D>,
    ) -> Arc<Mat<K::Scalar>> {
        let Some((key, target, source)) = self.m2l_key(target, source) else {
            return Arc::new(self.kernel_matrix(target, source));
        };

        let cached = self
            .m2l_cache
            .read()
            .ok()
            .and_then(|cache| cache.get(&key).cloned());
        if let Some(operator) = cached {
            return operator;
        }

        let operator = Arc::new(self.kernel_matrix(&target, &source));
        if let Ok(mut cache) = self.m2l_cache.write() {
            if cache.len() < self.m2l_cache_capacity {
                cache.entry(key).or_insert_with(|| Arc::clone(&operator));
            }
        }
        operator
    }

    /// Physical positions of the interpolation nodes of a box, in coefficient order.
    pub fn node_positions(&self, bounds: &Bounds<K::Scalar, D>) -> Vec<[K::Scalar; D]> {
        let half = K::Scalar::from_f64(0.5);
        let centre = bounds.centre();
        let half_widths: [K::Scalar; D] =
            array::from_fn(|i| half * (bounds.max[i] - bounds.min[i]));

        (0..self.n_coeffs)
            .map(|index| {
                let multi_index = self.multi_index(index);
                array::from_fn(|axis| {
                    centre[axis] + half_widths[axis] * self.nodes[multi_index[axis]]
                })
            })
            .collect()
    }
}

impl<K, const D: usize> Expansions<D> for ChebyshevExpansions<K, D>
where
    K: Kernel<D>,
    K::Scalar: RealField,
{
    type Scalar = K::Scalar;

    fn n_coeffs(&self) -> usize {
        self.n_coeffs
    }

    fn p2m(
        &self,
        bounds: &Bounds<Self::Scalar, D>,
        points: &[[Self::Scalar; D]],
        charges: &[Self::Scalar],
        multipole: &mut [Self::Scalar],
    ) {
        if points.is_empty() {
            return;
        }
        let weights = self.particle_weights(bounds, points);
        accumulate(weights.as_ref(), charges, multipole);
    }

    fn m2m(
        &self,
        parent: &Bounds<Self::Scalar, D>,
        child: &Bounds<Self::Scalar, D>,
        child_multipole: &[Self::Scalar],
        parent_multipole: &mut [Self::Scalar],
    ) {
        match self.child_position(parent, child) {
            Some(which) => accumulate(
                self.child_transfers[which].as_ref(),
                child_multipole,
                parent_multipole,
            ),
            None => accumulate(
                self.transfer(parent, child).as_ref(),
                child_multipole,
                parent_multipole,
            ),
        }
    }

    fn m2l(
        &self,
        target: &Bounds<Self::Scalar, D>,
        source: &Bounds<Self::Scalar, D>,
        multipole: &[Self::Scalar],
        local: &mut [Self::Scalar],
    ) {
        let operator = self.m2l_operator(target, source);
        let operator: &Mat<Self::Scalar> = &operator;
        accumulate(operator.as_ref(), multipole, local);
    }

    fn l2l(
        &self,
        child: &Bounds<Self::Scalar, D>,
        parent: &Bounds<Self::Scalar, D>,
        parent_local: &[Self::Scalar],
        child_local: &mut [Self::Scalar],
    ) {
        match self.child_position(parent, child) {
            Some(which) => accumulate(
                self.child_transfers[which].as_ref().transpose(),
                parent_local,
                child_local,
            ),
            None => accumulate(
                self.transfer(parent, child).as_ref().transpose(),
                parent_local,
                child_local,
            ),
        }
    }

    fn l2p(
        &self,
        point: &[Self::Scalar; D],
        bounds: &Bounds<Self::Scalar, D>,
        local: &[Self::Scalar],
    ) -> Self::Scalar {
        let weights = self.particle_weights(bounds, std::slice::from_ref(point));
        let mut value = [Self::Scalar::zero()];
        accumulate(weights.as_ref().transpose(), local, &mut value);
        value[0]
    }

    fn p2p(
        &self,
        targets: &[[Self::Scalar; D]],
        sources: &[[Self::Scalar; D]],
        charges: &[Self::Scalar],
        result: &mut [Self::Scalar],
    ) {
        for (target, value) in targets.iter().zip(result.iter_mut()) {
            *value = sources
                .iter()
                .zip(charges)
                .fold(*value, |acc, (source, &charge)| {
                    acc + self.kernel.evaluate(target, source) * charge
                });
        }
    }
}

#[cfg(test)]
mod test {
    use approx::assert_relative_eq;
    use rand::prelude::*;

    use super::*;
    use crate::fmm::helpers::relative_l2_error;
    use crate::fmm::kernel::{FnKernel, Multiquadric};

    fn direct<const D: usize>(
        kernel: &Multiquadric<f64>,
        targets: &[[f64; D]],
        sources: &[[f64; D]],
        charges: &[f64],
    ) -> Vec<f64> {
        targets
            .iter()
            .map(|t| {
                sources
                    .iter()
                    .zip(charges)
                    .map(|(s, &q)| kernel.evaluate(t, s) * q)
                    .sum()
            })
            .collect()
    }

    fn cached_operators<K: Kernel<D>, const D: usize>(
        expansions: &ChebyshevExpansions<K, D>,
    ) -> usize
    where
        K::Scalar: RealField,
    {
        expansions.m2l_cache.read().unwrap().len()
    }

    #[test]
    fn test_nodes_and_polynomials() {
        let nodes = chebyshev_nodes::<f64>(3);
        assert_relative_eq!(nodes[0], -(3.0f64).sqrt() / 2.0, epsilon = 1e-14);
        assert_relative_eq!(nodes[1], 0.0, epsilon = 1e-14);
        assert_relative_eq!(nodes[2], (3.0f64).sqrt() / 2.0, epsilon = 1e-14);

        // T_3 vanishes at its own nodes
        for &x in nodes.iter() {
            let tn = chebyshev_polynomials(x, 4);
            assert_relative_eq!(tn[3], 0.0, epsilon = 1e-14);
            assert_relative_eq!(tn[2], 2.0 * x * x - 1.0, epsilon = 1e-14);
        }

        let polynomials = polynomial_matrix(&nodes, 4);
        assert_eq!((polynomials.nrows(), polynomials.ncols()), (4, 3));
        assert_relative_eq!(polynomials[(1, 2)], nodes[2], epsilon = 1e-14);
    }

    #[test]
    fn test_weights_are_cardinal() {
        let expansions = ChebyshevExpansions::<_, 1>::new(Multiquadric::new(0.1f64), Some(5)).unwrap();

        // S_n(y_i, y_m) is one on the diagonal and zero elsewhere
        let weights = expansions.weight_matrix(&expansions.nodes);
        for i in 0..5 {
            for m in 0..5 {
                let expected = if i == m { 1.0 } else { 0.0 };
                assert_relative_eq!(weights[(m, i)], expected, epsilon = 1e-12);
            }
        }

        // Weights reproduce constants
        let weights = expansions.weight_matrix(&[0.37]);
        let sum: f64 = (0..5).map(|m| weights[(m, 0)]).sum();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_order() {
        assert!(ChebyshevExpansions::<_, 2>::new(Multiquadric::new(0.1f64), Some(0)).is_err());
        let expansions =
            ChebyshevExpansions::<_, 3>::new(Multiquadric::new(0.1f64), None).unwrap();
        assert_eq!(expansions.n_coeffs(), 27);
        assert_eq!(expansions.child_transfers.len(), 8);
    }

    #[test]
    fn test_child_transfers_match_nested_boxes() {
        let expansions =
            ChebyshevExpansions::<_, 2>::new(Multiquadric::new(0.1f64), Some(4)).unwrap();
        let parent = Bounds::new([0.25, -3.0], [1.75, -1.5]);

        for which in 0..4 {
            let child = parent.child(which);
            assert_eq!(expansions.child_position(&parent, &child), Some(which));

            let precomputed = &expansions.child_transfers[which];
            let general = expansions.transfer(&parent, &child);
            for m in 0..expansions.n_coeffs() {
                for k in 0..expansions.n_coeffs() {
                    assert_relative_eq!(precomputed[(m, k)], general[(m, k)], epsilon = 1e-12);
                }
            }
        }

        // Halving only one axis is not a child
        let half = Bounds::new([0.25, -3.0], [1.0, -1.5]);
        assert_eq!(expansions.child_position(&parent, &half), None);
    }

    #[test]
    fn test_m2m_matches_p2m_at_child_nodes() {
        // Anterpolating a child's weights is the same as P2M of its nodes onto the parent
        let expansions =
            ChebyshevExpansions::<_, 3>::new(Multiquadric::new(0.1f64), Some(3)).unwrap();
        let parent = Bounds::new([0.0; 3], [2.0; 3]);
        let child = parent.child(0b101);
        let mut rng = StdRng::seed_from_u64(2);
        let weights: Vec<f64> = (0..expansions.n_coeffs()).map(|_| rng.gen()).collect();

        let mut translated = vec![0.0; expansions.n_coeffs()];
        expansions.m2m(&parent, &child, &weights, &mut translated);

        let mut expected = vec![0.0; expansions.n_coeffs()];
        expansions.p2m(&parent, &expansions.node_positions(&child), &weights, &mut expected);

        assert!(relative_l2_error(&translated, &expected) < 1e-12);
    }

    #[test]
    fn test_m2l_operators_are_shared() {
        let kernel = Multiquadric::new(0.01f64);
        let expansions = ChebyshevExpansions::<_, 2>::new(kernel, Some(5)).unwrap();
        let multipole: Vec<f64> = (0..expansions.n_coeffs()).map(|i| i as f64).collect();

        let target = Bounds::new([0.0, 0.0], [0.25, 0.25]);
        let source = Bounds::new([0.5, -0.25], [0.75, 0.0]);
        let mut local = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&target, &source, &multipole, &mut local);
        assert_eq!(cached_operators(&expansions), 1);

        // The same pair translated reuses the operator
        let shift = [3.0, -1.25];
        let moved = |b: &Bounds<f64, 2>| {
            Bounds::new(
                [b.min[0] + shift[0], b.min[1] + shift[1]],
                [b.max[0] + shift[0], b.max[1] + shift[1]],
            )
        };
        let mut moved_local = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&moved(&target), &moved(&source), &multipole, &mut moved_local);
        assert_eq!(cached_operators(&expansions), 1);
        assert!(relative_l2_error(&moved_local, &local) < 1e-12);

        // Cached operators match the kernel values of the pair itself
        let mut expected = vec![0.0; expansions.n_coeffs()];
        let targets = expansions.node_positions(&target);
        let sources = expansions.node_positions(&source);
        expansions.p2p(&targets, &sources, &multipole, &mut expected);
        assert!(relative_l2_error(&local, &expected) < 1e-12);

        // Boxes of different size are not cached
        let larger = Bounds::new([0.5, 0.0], [1.0, 0.5]);
        expansions.m2l(&target, &larger, &multipole, &mut local);
        assert_eq!(cached_operators(&expansions), 1);
    }

    #[test]
    fn test_m2l_without_translation_invariance() {
        let kernel: FnKernel<f64, _> =
            FnKernel::new(|x: &[f64; 1], y: &[f64; 1]| 1.0 / (1.0 + x[0] * x[0] + y[0] * y[0]));
        let expansions = ChebyshevExpansions::<_, 1>::new(kernel, Some(6)).unwrap();
        let multipole: Vec<f64> = (0..6).map(|i| 1.0 + i as f64).collect();

        let target = Bounds::new([0.0], [1.0]);
        let source = Bounds::new([2.0], [3.0]);
        let mut local = vec![0.0; 6];
        expansions.m2l(&target, &source, &multipole, &mut local);
        assert_eq!(cached_operators(&expansions), 0);

        let mut expected = vec![0.0; 6];
        let targets = expansions.node_positions(&target);
        let sources = expansions.node_positions(&source);
        expansions.p2p(&targets, &sources, &multipole, &mut expected);
        assert!(relative_l2_error(&local, &expected) < 1e-12);
    }

    #[test]
    fn test_far_field() {
        let kernel = Multiquadric::new(0.01f64);
        let expansions = ChebyshevExpansions::<_, 3>::new(kernel, Some(6)).unwrap();
        let mut rng = StdRng::seed_from_u64(0);

        let source = Bounds::new([0.0; 3], [1.0; 3]);
        let target = Bounds::new([4.0, 0.0, 0.0], [5.0, 1.0, 1.0]);

        let sources: Vec<[f64; 3]> = (0..50).map(|_| rng.gen()).collect();
        let targets: Vec<[f64; 3]> = (0..50)
            .map(|_| {
                let p: [f64; 3] = rng.gen();
                [p[0] + 4.0, p[1], p[2]]
            })
            .collect();
        let charges: Vec<f64> = (0..50).map(|_| rng.gen::<f64>()).collect();

        let mut multipole = vec![0.0; expansions.n_coeffs()];
        expansions.p2m(&source, &sources, &charges, &mut multipole);

        let mut local = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&target, &source, &multipole, &mut local);

        let approx = targets
            .iter()
            .map(|t| expansions.l2p(t, &target, &local))
            .collect::<Vec<_>>();
        let exact = direct(&kernel, &targets, &sources, &charges);

        assert!(relative_l2_error(&approx, &exact) < 1e-5);
    }

    #[test]
    fn test_operators_on_split_box() {
        // Two leaves splitting the unit square along the first axis
        let kernel = Multiquadric::new(0.1f64);
        let expansions = ChebyshevExpansions::<_, 2>::new(kernel, Some(12)).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let n = 10;

        let parent = Bounds::new([0.0, 0.0], [1.0, 1.0]);
        let leaf1 = Bounds::new([0.0, 0.0], [0.5, 1.0]);
        let leaf2 = Bounds::new([0.5, 0.0], [1.0, 1.0]);

        let particles1: Vec<[f64; 2]> = (0..n).map(|_| [0.5 * rng.gen::<f64>(), rng.gen()]).collect();
        let particles2: Vec<[f64; 2]> = (0..n)
            .map(|_| [0.5 * rng.gen::<f64>() + 0.5, rng.gen()])
            .collect();
        let source1 = particles1.iter().map(|p| p[0]).collect::<Vec<_>>();
        let source2 = particles2.iter().map(|p| p[0]).collect::<Vec<_>>();

        let self1 = direct(&kernel, &particles1, &particles1, &source1);
        let self2 = direct(&kernel, &particles2, &particles2, &source2);
        let all1 = self1
            .iter()
            .zip(direct(&kernel, &particles1, &particles2, &source2))
            .map(|(a, b)| a + b)
            .collect::<Vec<_>>();

        // P2M, M2L onto itself, L2P recovers each leaf's self interaction
        let mut multipole1 = vec![0.0; expansions.n_coeffs()];
        expansions.p2m(&leaf1, &particles1, &source1, &mut multipole1);
        let mut local1 = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&leaf1, &leaf1, &multipole1, &mut local1);
        let check1 = particles1
            .iter()
            .map(|p| expansions.l2p(p, &leaf1, &local1))
            .collect::<Vec<_>>();
        assert!(relative_l2_error(&check1, &self1) < 1e-4);

        let mut multipole2 = vec![0.0; expansions.n_coeffs()];
        expansions.p2m(&leaf2, &particles2, &source2, &mut multipole2);
        let mut local2 = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&leaf2, &leaf2, &multipole2, &mut local2);
        let check2 = particles2
            .iter()
            .map(|p| expansions.l2p(p, &leaf2, &local2))
            .collect::<Vec<_>>();
        assert!(relative_l2_error(&check2, &self2) < 1e-4);

        // M2M, M2L on the parent, L2L back to the first leaf
        let mut multipole_parent = vec![0.0; expansions.n_coeffs()];
        expansions.m2m(&parent, &leaf1, &multipole1, &mut multipole_parent);
        expansions.m2m(&parent, &leaf2, &multipole2, &mut multipole_parent);
        let mut local_parent = vec![0.0; expansions.n_coeffs()];
        expansions.m2l(&parent, &parent, &multipole_parent, &mut local_parent);
        let mut relocal1 = vec![0.0; expansions.n_coeffs()];
        expansions.l2l(&leaf1, &parent, &local_parent, &mut relocal1);

        let check_all = particles1
            .iter()
            .map(|p| expansions.l2p(p, &leaf1, &relocal1))
            .collect::<Vec<_>>();
        assert!(relative_l2_error(&check_all, &all1) < 1e-4);
    }

    #[test]
    fn test_node_positions() {
        let expansions = ChebyshevExpansions::<_, 2>::new(Multiquadric::new(0.1f64), Some(2)).unwrap();
        let bounds = Bounds::new([0.0, 2.0], [2.0, 4.0]);
        let nodes = expansions.node_positions(&bounds);
        let y = (0.5f64).sqrt();

        assert_eq!(nodes.len(), 4);
        assert_relative_eq!(nodes[0][0], 1.0 - y, epsilon = 1e-14);
        assert_relative_eq!(nodes[0][1], 3.0 - y, epsilon = 1e-14);
        assert_relative_eq!(nodes[1][0], 1.0 - y, epsilon = 1e-14);
        assert_relative_eq!(nodes[1][1], 3.0 + y, epsilon = 1e-14);
        assert_relative_eq!(nodes[2][0], 1.0 + y, epsilon = 1e-14);

        // A local expansion sampled from a linear field reproduces it
        let local = nodes.iter().map(|p| p[0] + 2.0 * p[1]).collect::<Vec<_>>();
        let value = expansions.l2p(&[0.3, 3.7], &bounds, &local);
        assert_relative_eq!(value, 0.3 + 7.4, epsilon = 1e-12);
    }
}
