//! # Octrees
//!
//! Trees are built in bulk from a set of particles. Each particle is classified by a spatial tag
//! at the deepest representable level, particles are sorted by tag, and the tree is then built
//! one level at a time by binary searching the sorted tags for the particles under each child.
//!
//! # Example Usage
//! ```
//! use treefmm::traits::tree::SpatialTree;
//! use treefmm::tree::helpers::points_fixture;
//! use treefmm::tree::types::Octree;
//!
//! let mut points = points_fixture::<f64, 3>(1000, None, None, Some(0));
//! let tree = Octree::new(&mut points, None, Some(10)).unwrap();
//!
//! let (leaf, bounds) = tree.locate(&points[0]);
//! assert!(tree.is_leaf(leaf));
//! assert!(bounds.contains(&points[0]));
//! ```
pub mod constants;
pub mod types;

mod domain;
pub mod helpers;
pub mod morton;
mod navigation;
mod single_node;

pub use navigation::{Children, LeavesNearPoint, Subtree};
