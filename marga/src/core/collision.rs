//! Straight-line collision checks against an occupancy grid.

use super::{GraphNode, GridSnapshot};

/// Samples segments against a grid at a fixed sub-pixel interval.
///
/// A sample collides when its cell value is at or above the threshold, or
/// when it falls outside the grid.
#[derive(Clone, Copy, Debug)]
pub struct CollisionChecker<'a> {
    grid: &'a GridSnapshot,
    threshold: i8,
    step: f64,
}

impl<'a> CollisionChecker<'a> {
    pub fn new(grid: &'a GridSnapshot, threshold: i8, step: f64) -> Self {
        Self {
            grid,
            threshold,
            step,
        }
    }

    #[inline]
    pub fn grid(&self) -> &'a GridSnapshot {
        self.grid
    }

    /// True if the cell containing `p` blocks travel.
    #[inline]
    pub fn point_blocked(&self, p: GraphNode) -> bool {
        match self.grid.cell_at(p) {
            Some(value) => value >= self.threshold,
            None => true,
        }
    }

    /// True if any sample on the segment `a -> b` is blocked.
    ///
    /// Endpoints are put in lexicographic order first, so the samples and
    /// the answer do not depend on the direction of the query.
    pub fn segment_collides(&self, a: GraphNode, b: GraphNode) -> bool {
        let (from, to) = if (a.x, a.y) <= (b.x, b.y) { (a, b) } else { (b, a) };

        let distance = from.distance(&to);
        if !distance.is_finite() {
            return true;
        }
        let steps = ((distance / self.step).ceil() as usize).max(1);

        (0..=steps).any(|s| {
            let t = s as f64 / steps as f64;
            self.point_blocked(from * (1.0 - t) + to * t)
        })
    }
}
