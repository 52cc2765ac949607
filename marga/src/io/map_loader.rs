//! Occupancy map loader for PGM/PNG + YAML (ROS map_server format).

use std::path::Path;

use image::GrayImage;
use serde::Deserialize;
use tracing::info;

use crate::core::{GraphNode, GridSnapshot};
use crate::error::{MargaError, Result};

/// Map metadata from the YAML file
#[derive(Debug, Deserialize)]
pub struct MapMetadata {
    /// Image filename, relative to the YAML file
    pub image: String,

    /// Meters per pixel
    pub resolution: f64,

    /// World pose [x, y, yaw] of the bottom-left pixel
    pub origin: [f64; 3],

    /// Nonzero when white means occupied
    #[serde(default)]
    pub negate: u8,

    /// Darkness above this is fully occupied
    #[serde(default = "default_occupied_thresh")]
    pub occupied_thresh: f64,

    /// Darkness below this is free
    #[serde(default = "default_free_thresh")]
    pub free_thresh: f64,

    #[serde(default)]
    pub frame_id: Option<String>,
}

fn default_occupied_thresh() -> f64 {
    0.65
}

fn default_free_thresh() -> f64 {
    0.196
}

/// Load a grid snapshot from a map YAML file.
pub fn load_map<P: AsRef<Path>>(yaml_path: P) -> Result<GridSnapshot> {
    let yaml_path = yaml_path.as_ref();

    let yaml_content = std::fs::read_to_string(yaml_path)
        .map_err(|e| MargaError::Map(format!("Failed to read map YAML: {}", e)))?;
    let metadata: MapMetadata = serde_yaml::from_str(&yaml_content)?;

    if metadata.free_thresh > metadata.occupied_thresh {
        return Err(MargaError::Map(format!(
            "free_thresh {} exceeds occupied_thresh {}",
            metadata.free_thresh, metadata.occupied_thresh
        )));
    }

    let yaml_dir = yaml_path.parent().unwrap_or(Path::new("."));
    let image_path = yaml_dir.join(&metadata.image);
    let img = image::open(&image_path)
        .map_err(|e| {
            MargaError::Map(format!(
                "Failed to load map image {}: {}",
                image_path.display(),
                e
            ))
        })?
        .into_luma8();

    let grid = grid_from_image(&img, &metadata)?;
    info!(
        "[MapLoader] {}: {}x{} cells at {} m/px",
        image_path.display(),
        grid.width(),
        grid.height(),
        grid.resolution()
    );
    Ok(grid)
}

/// Convert a grayscale image to a grid. Image row 0 is the top of the map,
/// grid row 0 is the bottom.
pub fn grid_from_image(img: &GrayImage, metadata: &MapMetadata) -> Result<GridSnapshot> {
    let (width, height) = (img.width() as usize, img.height() as usize);
    let mut cells = vec![0i8; width * height];

    for (x, y, pixel) in img.enumerate_pixels() {
        let value = f64::from(pixel.0[0]) / 255.0;
        let darkness = if metadata.negate == 0 { 1.0 - value } else { value };
        let row = height - 1 - y as usize;
        cells[row * width + x as usize] = occupancy(darkness, metadata);
    }

    let mut grid = GridSnapshot::new(width, height, metadata.resolution, cells)?
        .with_origin(GraphNode::new(metadata.origin[0], metadata.origin[1]));
    if let Some(frame_id) = &metadata.frame_id {
        grid = grid.with_frame_id(frame_id.clone());
    }
    Ok(grid)
}

/// Darkness in [0, 1] to occupancy in 0..=100.
fn occupancy(darkness: f64, metadata: &MapMetadata) -> i8 {
    if darkness > metadata.occupied_thresh {
        100
    } else if darkness < metadata.free_thresh {
        0
    } else {
        (darkness * 100.0).round() as i8
    }
}
