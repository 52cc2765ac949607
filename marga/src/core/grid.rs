//! Occupancy grid snapshot.

use crate::error::GridError;

use super::GraphNode;

/// Immutable occupancy grid captured for one rebuild.
///
/// Cells are row-major, `cells[y * width + x]`, with 0 meaning free and 100
/// occupied. Negative values (unknown) never reach either threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct GridSnapshot {
    width: usize,
    height: usize,
    resolution: f64,
    frame_id: String,
    /// World position of the bottom-left corner of cell (0, 0), meters
    origin: GraphNode,
    cells: Vec<i8>,
}

impl GridSnapshot {
    /// Create a snapshot, checking that the cell count matches the extents.
    pub fn new(
        width: usize,
        height: usize,
        resolution: f64,
        cells: Vec<i8>,
    ) -> Result<Self, GridError> {
        let expected = width * height;
        if cells.len() != expected {
            return Err(GridError::CellCount {
                width,
                height,
                expected,
                actual: cells.len(),
            });
        }
        if !(resolution > 0.0) {
            return Err(GridError::Resolution(resolution));
        }

        Ok(Self {
            width,
            height,
            resolution,
            frame_id: String::from("map"),
            origin: GraphNode::default(),
            cells,
        })
    }

    /// An all-free grid.
    pub fn free(width: usize, height: usize, resolution: f64) -> Result<Self, GridError> {
        Self::new(width, height, resolution, vec![0; width * height])
    }

    /// Set the frame identifier.
    pub fn with_frame_id(mut self, frame_id: impl Into<String>) -> Self {
        self.frame_id = frame_id.into();
        self
    }

    /// Set the world origin of cell (0, 0).
    pub fn with_origin(mut self, origin: GraphNode) -> Self {
        self.origin = origin;
        self
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Meters per pixel
    #[inline]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    pub fn frame_id(&self) -> &str {
        &self.frame_id
    }

    pub fn origin(&self) -> GraphNode {
        self.origin
    }

    #[inline]
    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    /// True when the grid holds no cells.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell value at integer coordinates, `None` outside the grid.
    #[inline]
    pub fn cell(&self, x: i64, y: i64) -> Option<i8> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }

    /// Cell value containing a continuous pixel position.
    #[inline]
    pub fn cell_at(&self, p: GraphNode) -> Option<i8> {
        if !p.is_finite() {
            return None;
        }
        self.cell(p.x.floor() as i64, p.y.floor() as i64)
    }

    /// Convert a world position (meters) to pixel coordinates.
    pub fn world_to_pixel(&self, world: GraphNode) -> GraphNode {
        (world - self.origin) * (1.0 / self.resolution)
    }

    /// Convert pixel coordinates to a world position (meters).
    pub fn pixel_to_world(&self, pixel: GraphNode) -> GraphNode {
        pixel * self.resolution + self.origin
    }

    /// Largest valid pixel coordinate on each axis, `(w - 1, h - 1)`.
    pub fn max_corner(&self) -> GraphNode {
        GraphNode::new(
            self.width.saturating_sub(1) as f64,
            self.height.saturating_sub(1) as f64,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cell_count_checked() {
        let err = GridSnapshot::new(3, 2, 0.05, vec![0; 5]).unwrap_err();
        assert_eq!(
            err,
            GridError::CellCount {
                width: 3,
                height: 2,
                expected: 6,
                actual: 5
            }
        );
        assert!(GridSnapshot::new(3, 2, 0.0, vec![0; 6]).is_err());
    }

    #[test]
    fn test_cell_lookup_row_major() {
        let mut cells = vec![0i8; 12];
        cells[2 * 4 + 1] = 100; // (x=1, y=2)
        let grid = GridSnapshot::new(4, 3, 0.05, cells).unwrap();

        assert_eq!(grid.cell(1, 2), Some(100));
        assert_eq!(grid.cell(2, 1), Some(0));
        assert_eq!(grid.cell(-1, 0), None);
        assert_eq!(grid.cell(4, 0), None);
        assert_eq!(grid.cell_at(GraphNode::new(1.9, 2.2)), Some(100));
    }

    #[test]
    fn test_world_pixel_conversion() {
        let grid = GridSnapshot::free(100, 100, 0.05)
            .unwrap()
            .with_origin(GraphNode::new(-2.5, -1.0));

        let pixel = grid.world_to_pixel(GraphNode::new(0.0, 0.0));
        assert_relative_eq!(pixel.x, 50.0, epsilon = 1e-9);
        assert_relative_eq!(pixel.y, 20.0, epsilon = 1e-9);

        let world = grid.pixel_to_world(pixel);
        assert_relative_eq!(world.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(world.y, 0.0, epsilon = 1e-9);
    }
}
