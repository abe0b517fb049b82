//! Pairwise interaction kernels.
use std::marker::PhantomData;

use crate::traits::{fmm::Kernel, general::FmmScalar};

fn squared_distance<T: FmmScalar, const D: usize>(a: &[T; D], b: &[T; D]) -> T {
    a.iter().zip(b.iter()).fold(T::zero(), |acc, (&x, &y)| {
        let dx = x - y;
        acc + dx * dx
    })
}

/// The multiquadric kernel `sqrt(|x - y|^2 + c)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiquadric<T> {
    /// Shape parameter
    pub c: T,
}

impl<T> Multiquadric<T> {
    /// Constructor
    pub fn new(c: T) -> Self {
        Self { c }
    }
}

impl<T, const D: usize> Kernel<D> for Multiquadric<T>
where
    T: FmmScalar,
{
    type Scalar = T;

    fn evaluate(&self, target: &[T; D], source: &[T; D]) -> T {
        (squared_distance(target, source) + self.c).sqrt()
    }

    fn is_translation_invariant(&self) -> bool {
        true
    }
}

/// The Gaussian kernel `exp(-epsilon^2 |x - y|^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian<T> {
    /// Inverse length scale
    pub epsilon: T,
}

impl<T> Gaussian<T> {
    /// Constructor
    pub fn new(epsilon: T) -> Self {
        Self { epsilon }
    }
}

impl<T, const D: usize> Kernel<D> for Gaussian<T>
where
    T: FmmScalar,
{
    type Scalar = T;

    fn evaluate(&self, target: &[T; D], source: &[T; D]) -> T {
        (-self.epsilon * self.epsilon * squared_distance(target, source)).exp()
    }

    fn is_translation_invariant(&self) -> bool {
        true
    }
}

/// A kernel defined by a user supplied function of target and source positions.
pub struct FnKernel<T, F> {
    function: F,
    translation_invariant: bool,
    _scalar: PhantomData<T>,
}

impl<T, F> FnKernel<T, F> {
    /// Wrap a function `f(target, source)` as a kernel.
    pub fn new(function: F) -> Self {
        Self {
            function,
            translation_invariant: false,
            _scalar: PhantomData,
        }
    }

    /// Wrap a function of `target - source` alone, whose translation operators can be reused.
    pub fn translation_invariant(function: F) -> Self {
        Self {
            translation_invariant: true,
            ..Self::new(function)
        }
    }
}

impl<T, F> Clone for FnKernel<T, F>
where
    F: Clone,
{
    fn clone(&self) -> Self {
        Self {
            function: self.function.clone(),
            translation_invariant: self.translation_invariant,
            _scalar: PhantomData,
        }
    }
}

impl<T, F, const D: usize> Kernel<D> for FnKernel<T, F>
where
    T: FmmScalar,
    F: Fn(&[T; D], &[T; D]) -> T + Send + Sync,
{
    type Scalar = T;

    fn evaluate(&self, target: &[T; D], source: &[T; D]) -> T {
        (self.function)(target, source)
    }

    fn is_translation_invariant(&self) -> bool {
        self.translation_invariant
    }
}
