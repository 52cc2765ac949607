//! Marga - Voronoi roadmap planner
//!
//! Builds a roadmap from the generalized Voronoi diagram of an occupancy
//! grid and answers route queries with up to `k` routes that pass the
//! obstacles in different ways (distinct homotopy classes), each smoothed
//! into Bezier curves.
//!
//! ## Pipeline
//!
//! ```text
//! GridSnapshot ──► GraphBuilder ──► Roadmap + ObstacleModel
//!                                        │
//!    start, goal ──► PathFinder (A*) ──► find_alternates ──► PathSmoother
//! ```
//!
//! [`PlanningEngine`] owns the current roadmap and keeps rebuilds and
//! queries from overlapping.
//!
//! ## Coordinates
//!
//! All planning happens in grid pixels: `x` is the column, `y` the row,
//! row 0 at the bottom. [`GridSnapshot::world_to_pixel`] and
//! [`GridSnapshot::pixel_to_world`] convert to and from map meters.

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod homotopy;
pub mod io;
pub mod planning;
pub mod roadmap;
pub mod utils;

pub use config::PlannerConfig;
pub use core::{CollisionChecker, GraphNode, GridSnapshot};
pub use engine::{PathSet, PlanningEngine};
pub use error::{BuildError, GridError, MargaError, PlanError, Result};
pub use homotopy::{ObstacleModel, same_class};
pub use planning::{AlternateRoutes, PathFinder, PathSmoother, RawPath, SmoothedPath};
pub use roadmap::{BuiltRoadmap, GraphBuilder, Roadmap, RoadmapStats};
