//! Voronoi roadmap construction and storage.
//!
//! - [`GraphBuilder`]: grid to pruned roadmap plus obstacle model
//! - [`Roadmap`]: node table with absent-aware adjacency
//! - [`RoadmapEdit`]: scoped, self-restoring edge and node removal

mod builder;
mod graph;
mod voronoi;

pub use builder::{BuiltRoadmap, GraphBuilder, RoadmapStats};
pub use graph::{Roadmap, RoadmapEdit};
pub use voronoi::{ClipRect, voronoi_edges};
