//! Configuration loading for Marga

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MargaError, Result};

/// Planner tuning parameters.
///
/// Distances are in grid pixels unless the field says meters; metric values
/// are converted with the grid resolution at the point of use.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Cells at or above this value become diagram sites (default: 100)
    #[serde(default = "default_occupancy_threshold")]
    pub occupancy_threshold: i8,

    /// Cells at or above this value block vertices and edges (default: 85)
    #[serde(default = "default_collision_threshold")]
    pub collision_threshold: i8,

    /// Sampling interval along segments during collision checks, pixels (default: 0.1)
    #[serde(default = "default_line_check_resolution")]
    pub line_check_resolution: f64,

    /// Cells skipped between samples when collecting sites (default: 0)
    #[serde(default)]
    pub pixels_to_skip: usize,

    /// Scale applied to the grid before contour extraction (default: 0.25)
    #[serde(default = "default_downscale_factor")]
    pub downscale_factor: f64,

    /// Relative distance below which two homotopy classes are equal (default: 0.2)
    #[serde(default = "default_h_class_threshold")]
    pub h_class_threshold: f64,

    /// Minimum squared separation between Bezier anchors, m² (default: 1.0)
    #[serde(default = "default_min_node_sep_sq")]
    pub min_node_sep_sq: f64,

    /// Distance of the tangent-continuity anchor after a seam, meters (default: 1.0)
    #[serde(default = "default_extra_point_distance")]
    pub extra_point_distance: f64,

    /// Maximum anchors in one Bezier run (default: 10)
    #[serde(default = "default_bezier_max_control_points")]
    pub bezier_max_control_points: usize,

    /// Parameter steps per Bezier run; a run yields `bezier_steps + 1` samples (default: 20)
    #[serde(default = "default_bezier_steps")]
    pub bezier_steps: usize,

    /// Degree-1 nodes are linked to nodes within this distance, pixels (default: 1.0)
    #[serde(default = "default_node_connection_threshold")]
    pub node_connection_threshold_pix: f64,

    /// Rounding step for vertex identity, pixels (default: 0.1)
    #[serde(default = "default_hash_resolution")]
    pub hash_resolution: f64,

    /// Seed the grid corners as diagram sites (default: true)
    #[serde(default = "default_include_frame_corners")]
    pub include_frame_corners: bool,

    /// Cells per parallel scan task (default: 65536)
    #[serde(default = "default_parallel_chunk_cells")]
    pub parallel_chunk_cells: usize,

    /// Path edges per parallel homotopy task (default: 64)
    #[serde(default = "default_homotopy_chunk_edges")]
    pub homotopy_chunk_edges: usize,
}

// Default value functions
fn default_occupancy_threshold() -> i8 {
    100
}
fn default_collision_threshold() -> i8 {
    85
}
fn default_line_check_resolution() -> f64 {
    0.1
}
fn default_downscale_factor() -> f64 {
    0.25
}
fn default_h_class_threshold() -> f64 {
    0.2
}
fn default_min_node_sep_sq() -> f64 {
    1.0
}
fn default_extra_point_distance() -> f64 {
    1.0
}
fn default_bezier_max_control_points() -> usize {
    10
}
fn default_bezier_steps() -> usize {
    20
}
fn default_node_connection_threshold() -> f64 {
    1.0
}
fn default_hash_resolution() -> f64 {
    0.1
}
fn default_include_frame_corners() -> bool {
    true
}
fn default_parallel_chunk_cells() -> usize {
    65_536
}
fn default_homotopy_chunk_edges() -> usize {
    64
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            occupancy_threshold: default_occupancy_threshold(),
            collision_threshold: default_collision_threshold(),
            line_check_resolution: default_line_check_resolution(),
            pixels_to_skip: 0,
            downscale_factor: default_downscale_factor(),
            h_class_threshold: default_h_class_threshold(),
            min_node_sep_sq: default_min_node_sep_sq(),
            extra_point_distance: default_extra_point_distance(),
            bezier_max_control_points: default_bezier_max_control_points(),
            bezier_steps: default_bezier_steps(),
            node_connection_threshold_pix: default_node_connection_threshold(),
            hash_resolution: default_hash_resolution(),
            include_frame_corners: default_include_frame_corners(),
            parallel_chunk_cells: default_parallel_chunk_cells(),
            homotopy_chunk_edges: default_homotopy_chunk_edges(),
        }
    }
}

impl PlannerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MargaError::Config(format!("Failed to read config file: {}", e)))?;
        let config: PlannerConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the planner cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.line_check_resolution > 0.0) {
            return Err(MargaError::Config(format!(
                "line_check_resolution must be positive, got {}",
                self.line_check_resolution
            )));
        }
        if !(self.downscale_factor > 0.0 && self.downscale_factor <= 1.0) {
            return Err(MargaError::Config(format!(
                "downscale_factor must be in (0, 1], got {}",
                self.downscale_factor
            )));
        }
        if !(self.hash_resolution > 0.0) {
            return Err(MargaError::Config(format!(
                "hash_resolution must be positive, got {}",
                self.hash_resolution
            )));
        }
        // Two slots are taken by the run start and the seam anchor
        if self.bezier_max_control_points < 3 {
            return Err(MargaError::Config(
                "bezier_max_control_points must be at least 3".to_string(),
            ));
        }
        if self.bezier_steps == 0 {
            return Err(MargaError::Config("bezier_steps must be non-zero".to_string()));
        }
        if self.parallel_chunk_cells == 0 || self.homotopy_chunk_edges == 0 {
            return Err(MargaError::Config(
                "parallel chunk sizes must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Builder-style setter for the collision threshold.
    pub fn with_collision_threshold(mut self, threshold: i8) -> Self {
        self.collision_threshold = threshold;
        self
    }

    /// Builder-style setter for the occupancy threshold.
    pub fn with_occupancy_threshold(mut self, threshold: i8) -> Self {
        self.occupancy_threshold = threshold;
        self
    }

    /// Builder-style setter for the contour downscale factor.
    pub fn with_downscale_factor(mut self, factor: f64) -> Self {
        self.downscale_factor = factor;
        self
    }

    /// Builder-style setter for the homotopy class threshold.
    pub fn with_h_class_threshold(mut self, threshold: f64) -> Self {
        self.h_class_threshold = threshold;
        self
    }

    /// Builder-style setter for the site stride.
    pub fn with_pixels_to_skip(mut self, skip: usize) -> Self {
        self.pixels_to_skip = skip;
        self
    }

    /// Builder-style setter for the minimum anchor separation (m²).
    pub fn with_min_node_sep_sq(mut self, sep_sq: f64) -> Self {
        self.min_node_sep_sq = sep_sq;
        self
    }

    /// Builder-style setter for frame corner seeding.
    pub fn with_frame_corners(mut self, enabled: bool) -> Self {
        self.include_frame_corners = enabled;
        self
    }
}
