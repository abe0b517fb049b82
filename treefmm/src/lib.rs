//! # Tree Fast Multipole Method
//!
//! An adaptive `2^D`-tree over particles in one, two or three dimensions, and a fast multipole
//! method over it approximating all pairwise kernel weighted sums in close to linear time.
//!
//! Notable features of this library are:
//! * Trees built in bulk by sorting spatial tags, and rebuilt after insertion, deletion or
//!   movement of particles, with the sorting permutation mirrored onto the particle storage.
//! * A narrow tree navigation trait, keeping the FMM independent of the spatial search backend.
//! * A trait based expansion contract, with black box Chebyshev expansions supporting any
//!   smooth kernel.
//!
//! ## References
//! \[1\] W. Fong, E. Darve, The black-box fast multipole method, Journal of Computational
//! Physics 228 (23) (2009) 8712-8725.
#![cfg_attr(feature = "strict", deny(warnings))]
#![warn(missing_docs)]

pub mod fmm;
pub mod particles;
pub mod traits;
pub mod tree;

// Public API
#[doc(inline)]
pub use fmm::types::FmmBuilder;
#[doc(inline)]
pub use fmm::types::TreeFmm;
#[doc(inline)]
pub use particles::Particles;
#[doc(inline)]
pub use traits::types::FmmError;
#[doc(inline)]
pub use tree::types::Octree;
