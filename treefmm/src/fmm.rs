//! Fast multipole methods over spatial trees, with pluggable expansions.
//!
//! # Example Usage
//! ```
//! use treefmm::fmm::{chebyshev::ChebyshevExpansions, kernel::Multiquadric, FmmBuilder};
//! use treefmm::traits::fmm::Fmm;
//! use treefmm::tree::helpers::points_fixture;
//!
//! let mut points = points_fixture::<f64, 2>(1000, None, None, Some(0));
//! let expansions = ChebyshevExpansions::new(Multiquadric::new(0.01), Some(4)).unwrap();
//!
//! let mut fmm = FmmBuilder::new()
//!     .particles(&mut points, None, Some(10))
//!     .unwrap()
//!     .parameters(expansions, None)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! // Particles are now in tree order, as are source and target vectors
//! let sources = vec![1.0 / 1000.0; 1000];
//! let targets = fmm.gemv(&sources).unwrap();
//! let value = fmm.evaluate(&points[0], &sources).unwrap();
//! assert!((value - targets[0]).abs() < 1e-10);
//! ```
pub mod admissibility;
mod builder;
pub mod chebyshev;
pub mod constants;
pub mod helpers;
pub mod kernel;
mod single_node;
pub mod types;

mod field_translation {
    pub mod source;
    pub mod source_to_target;
    pub mod target;
}

pub use types::{FmmBuilder, TreeFmm};
