//! Grid builders shared by the integration tests.

#![allow(dead_code)]

use marga::{GraphNode, GridSnapshot, PlannerConfig};

pub const RESOLUTION: f64 = 0.05;
pub const OCCUPIED: i8 = 100;

/// Cell buffer for a `width` x `height` grid.
pub struct GridCells {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<i8>,
}

impl GridCells {
    pub fn free(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0; width * height],
        }
    }

    /// Free interior with a one-cell occupied frame.
    pub fn walled(width: usize, height: usize) -> Self {
        let mut grid = Self::free(width, height);
        grid.fill(0..width, 0..1);
        grid.fill(0..width, height - 1..height);
        grid.fill(0..1, 0..height);
        grid.fill(width - 1..width, 0..height);
        grid
    }

    /// Occupy the cells in `xs` x `ys`.
    pub fn fill(&mut self, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) -> &mut Self {
        for y in ys {
            for x in xs.clone() {
                self.cells[y * self.width + x] = OCCUPIED;
            }
        }
        self
    }

    /// Free the cells in `xs` x `ys`.
    pub fn clear(&mut self, xs: std::ops::Range<usize>, ys: std::ops::Range<usize>) -> &mut Self {
        for y in ys {
            for x in xs.clone() {
                self.cells[y * self.width + x] = 0;
            }
        }
        self
    }

    pub fn snapshot(&self) -> GridSnapshot {
        GridSnapshot::new(self.width, self.height, RESOLUTION, self.cells.clone()).unwrap()
    }
}

/// 80x60 walled room split by a wall at x 36..44 with doorways at
/// y 10..20 and y 40..50. The wall piece between the doorways is the
/// only free-standing obstacle.
pub fn two_door_room() -> GridSnapshot {
    let mut grid = GridCells::walled(80, 60);
    grid.fill(36..44, 0..60);
    grid.clear(36..44, 10..20);
    grid.clear(36..44, 40..50);
    grid.snapshot()
}

/// 60x60 walled room with a 12x12 block in the middle.
pub fn block_room() -> GridSnapshot {
    let mut grid = GridCells::walled(60, 60);
    grid.fill(24..36, 24..36);
    grid.snapshot()
}

/// 40x40 open grid with a closed ring of occupied cells around (20, 20).
pub fn pocket_grid() -> GridSnapshot {
    let mut grid = GridCells::free(40, 40);
    grid.fill(14..27, 14..27);
    grid.clear(15..26, 15..26);
    grid.snapshot()
}

pub fn config() -> PlannerConfig {
    PlannerConfig::default()
}

pub fn p(x: f64, y: f64) -> GraphNode {
    GraphNode::new(x, y)
}

/// `y` where the polyline first crosses the vertical line `x`.
pub fn crossing_y(points: &[GraphNode], x: f64) -> Option<f64> {
    points.windows(2).find_map(|w| {
        let (a, b) = (w[0], w[1]);
        if (a.x - x) * (b.x - x) > 0.0 || a.x == b.x {
            return None;
        }
        let t = (x - a.x) / (b.x - a.x);
        Some(a.y + t * (b.y - a.y))
    })
}
