//! Route planning on the roadmap.
//!
//! This module provides:
//! - A* shortest paths and nearest reachable node lookup
//! - Homotopy-distinct alternate routes (Yen's algorithm with a class filter)
//! - Bezier smoothing of raw routes

mod alternates;
mod astar;
mod smoother;

pub use alternates::{AlternateRoutes, find_alternates};
pub use astar::{PathFinder, RawPath};
pub use smoother::{PathSmoother, SmoothedPath, bezier_curve, merge_close_anchors};
