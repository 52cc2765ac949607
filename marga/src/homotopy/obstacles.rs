//! Obstacle centroids and their homotopy weights.
//!
//! The grid is reduced to a small binary image, obstacle boundaries are
//! traced, and each outer boundary contributes its polygon centroid. Each
//! centroid `c_i` gets a fixed complex weight
//!
//! ```text
//! w_i = (c_i - BL)^a (c_i - TR)^b / prod_{j != i} (c_i - c_j),   a = b = (N - 1) / 2
//! ```
//!
//! where `BL` and `TR` are the bottom-left and top-right grid corners.
//! The corner terms are multiplied, not added; relative weights in
//! multi-obstacle maps follow from this product form.

use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};
use imageproc::distance_transform::Norm;
use imageproc::morphology::erode;
use imageproc::point::Point;
use num_complex::Complex64;
use tracing::{debug, warn};

use crate::config::PlannerConfig;
use crate::core::{GraphNode, GridSnapshot};

const FILLED: u8 = 255;

/// Obstacle centroids (complex plane, grid pixels) with cached weights.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObstacleModel {
    centroids: Vec<Complex64>,
    coefficients: Vec<Complex64>,
}

impl ObstacleModel {
    /// Build a model from known centroids.
    ///
    /// `top_right` is the far grid corner; the near corner is the origin.
    /// Centroids closer than 1e-6 px to an earlier one are dropped, since
    /// coincident centroids make the weights singular.
    pub fn from_centroids(centroids: &[GraphNode], top_right: GraphNode) -> Self {
        let mut unique: Vec<Complex64> = Vec::with_capacity(centroids.len());
        for c in centroids {
            let z = Complex64::new(c.x, c.y);
            if !z.re.is_finite() || !z.im.is_finite() {
                continue;
            }
            if unique.iter().all(|u| (u - z).norm() > 1e-6) {
                unique.push(z);
            }
        }

        let bl = Complex64::new(0.0, 0.0);
        let tr = Complex64::new(top_right.x, top_right.y);
        let exponent = (unique.len() as f64 - 1.0) / 2.0;

        let coefficients = unique
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                let numerator = (c - bl).powf(exponent) * (c - tr).powf(exponent);
                let denominator: Complex64 = unique
                    .iter()
                    .enumerate()
                    .filter(|&(j, _)| j != i)
                    .map(|(_, &other)| c - other)
                    .product();
                numerator / denominator
            })
            .collect::<Vec<_>>();

        if coefficients
            .iter()
            .any(|w| !w.re.is_finite() || !w.im.is_finite())
        {
            warn!("[Homotopy] non-finite obstacle weight, classes may be unreliable");
        }

        Self {
            centroids: unique,
            coefficients,
        }
    }

    /// Extract obstacle centroids from a grid.
    pub fn extract(grid: &GridSnapshot, config: &PlannerConfig) -> Self {
        let centroids = obstacle_centroids(grid, config);
        debug!("[Homotopy] {} obstacle centroids", centroids.len());
        Self::from_centroids(&centroids, grid.max_corner())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.centroids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.centroids.is_empty()
    }

    pub fn centroids(&self) -> &[Complex64] {
        &self.centroids
    }

    pub fn coefficients(&self) -> &[Complex64] {
        &self.coefficients
    }

    /// Centroids as grid points.
    pub fn centroid_nodes(&self) -> Vec<GraphNode> {
        self.centroids
            .iter()
            .map(|c| GraphNode::new(c.re, c.im))
            .collect()
    }
}

/// Blocked cells as a downscaled binary image with one pixel of free
/// padding on every side.
///
/// Grid cell `(x, y)` lands on small pixel `(floor(x f) + 1, floor(y f) + 1)`,
/// so a small pixel is filled when any cell of its block is blocked.
fn downscaled_mask(grid: &GridSnapshot, threshold: i8, factor: f64) -> GrayImage {
    let small_w = ((grid.width() - 1) as f64 * factor).floor() as u32 + 1;
    let small_h = ((grid.height() - 1) as f64 * factor).floor() as u32 + 1;
    let mut mask = GrayImage::new(small_w + 2, small_h + 2);

    let width = grid.width();
    for (i, &value) in grid.cells().iter().enumerate() {
        if value < threshold {
            continue;
        }
        let u = ((i % width) as f64 * factor).floor() as u32 + 1;
        let v = ((i / width) as f64 * factor).floor() as u32 + 1;
        mask.put_pixel(u, v, Luma([FILLED]));
    }
    mask
}

/// Filled pixels with at least one empty 8-neighbor.
fn boundary_pixels(mask: &GrayImage) -> GrayImage {
    let interior = erode(mask, Norm::LInf, 1);
    let mut edges = GrayImage::new(mask.width(), mask.height());
    for (x, y, pixel) in mask.enumerate_pixels() {
        if pixel[0] == FILLED && interior.get_pixel(x, y)[0] == 0 {
            edges.put_pixel(x, y, Luma([FILLED]));
        }
    }
    edges
}

/// Area centroid of a closed polygon, `None` when the area vanishes.
fn polygon_centroid(points: &[Point<i32>]) -> Option<(f64, f64)> {
    if points.len() < 3 {
        return None;
    }

    let mut area2 = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;
    for (i, p) in points.iter().enumerate() {
        let q = &points[(i + 1) % points.len()];
        let (x0, y0, x1, y1) = (p.x as f64, p.y as f64, q.x as f64, q.y as f64);
        let cross = x0 * y1 - x1 * y0;
        area2 += cross;
        cx += (x0 + x1) * cross;
        cy += (y0 + y1) * cross;
    }

    if area2.abs() < f64::EPSILON {
        return None;
    }
    let (x, y) = (cx / (3.0 * area2), cy / (3.0 * area2));
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

/// Centroids of blocked regions, in grid pixel coordinates.
///
/// Regions connected to the grid border are skipped: a path can never pass
/// between them and the border, and their centroid may lie in free space.
fn obstacle_centroids(grid: &GridSnapshot, config: &PlannerConfig) -> Vec<GraphNode> {
    if grid.is_empty() {
        return Vec::new();
    }
    let factor = config.downscale_factor;
    let mask = downscaled_mask(grid, config.collision_threshold, factor);
    let edges = boundary_pixels(&mask);

    // Padded image: original small pixels span 1..=max
    let max_x = mask.width() as i32 - 2;
    let max_y = mask.height() as i32 - 2;
    let touches_border = |p: &Point<i32>| p.x <= 1 || p.y <= 1 || p.x >= max_x || p.y >= max_y;

    find_contours::<i32>(&edges)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer)
        .filter(|contour| !contour.points.iter().any(touches_border))
        .filter_map(|contour| polygon_centroid(&contour.points))
        .map(|(u, v)| {
            // Undo padding, then map the block center back to grid pixels
            GraphNode::new((u - 1.0 + 0.5) / factor, (v - 1.0 + 0.5) / factor)
        })
        .collect()
}
