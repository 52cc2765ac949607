//! Core types shared by the roadmap builder and the planners.
//!
//! - [`GraphNode`]: point in grid-pixel coordinates
//! - [`GridSnapshot`]: immutable occupancy grid
//! - [`CollisionChecker`]: sampled segment checks against a grid

mod collision;
mod grid;
mod node;

pub use collision::CollisionChecker;
pub use grid::GridSnapshot;
pub use node::GraphNode;
