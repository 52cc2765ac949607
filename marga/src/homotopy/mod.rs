//! Homotopy classes for distinguishing routes around obstacles.
//!
//! - [`ObstacleModel`]: obstacle centroids extracted from the grid, with
//!   per-obstacle complex weights
//! - [`ObstacleModel::class_of`]: complex signature of a path
//! - [`same_class`]: relative comparison of two signatures

mod obstacles;
mod signature;

pub use obstacles::ObstacleModel;
pub use signature::same_class;
