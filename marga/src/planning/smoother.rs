//! Bezier smoothing of roadmap routes.
//!
//! The raw polyline is cut into runs of anchors that are all visible from
//! the first anchor of their run. Each run is fitted with a single Bezier
//! curve. After a cut, the next run gets an extra anchor continuing the
//! previous run's exit direction so the seam stays tangent-continuous.

use serde::Serialize;
use tracing::warn;

use crate::config::PlannerConfig;
use crate::core::{CollisionChecker, GraphNode};
use crate::error::PlanError;
use crate::utils::binomial;

/// Points sampled along the fitted curves, in grid pixels.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SmoothedPath {
    pub points: Vec<GraphNode>,
}

impl SmoothedPath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<GraphNode> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<GraphNode> {
        self.points.last().copied()
    }

    /// Polyline length in pixels
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

/// Bezier curve through `points` sampled at `t = s / steps`, `s = 0..=steps`.
///
/// Uses exact binomial weights. A single point is returned unchanged.
pub fn bezier_curve(points: &[GraphNode], steps: usize) -> Vec<GraphNode> {
    match points.len() {
        0 => return Vec::new(),
        1 => return vec![points[0]],
        _ => {}
    }
    let n = points.len() - 1;
    let weights: Vec<f64> = (0..=n).map(|i| binomial(n, i) as f64).collect();
    let steps = steps.max(1);

    (0..=steps)
        .map(|s| {
            let t = s as f64 / steps as f64;
            let mut sum = GraphNode::default();
            for (i, (p, w)) in points.iter().zip(&weights).enumerate() {
                sum += *p * (w * (1.0 - t).powi((n - i) as i32) * t.powi(i as i32));
            }
            sum
        })
        .collect()
}

/// Drop anchors closer than `min_sep_sq` (squared pixels) to the previous
/// kept anchor or to the last anchor.
///
/// The first `fixed` anchors and the last anchor are always kept; `fixed`
/// counts at least the first anchor.
pub fn merge_close_anchors(run: &[GraphNode], fixed: usize, min_sep_sq: f64) -> Vec<GraphNode> {
    let fixed = fixed.max(1);
    if run.len() <= fixed + 1 {
        return run.to_vec();
    }
    let last = run[run.len() - 1];
    let mut kept = run[..fixed].to_vec();
    for p in &run[fixed..run.len() - 1] {
        let prev = kept[kept.len() - 1];
        if p.distance_squared(&prev) >= min_sep_sq && p.distance_squared(&last) >= min_sep_sq {
            kept.push(*p);
        }
    }
    kept.push(last);
    kept
}

/// Turns raw node sequences into smooth, collision-aware curves.
pub struct PathSmoother<'a> {
    checker: CollisionChecker<'a>,
    max_anchors: usize,
    steps: usize,
    /// Minimum anchor separation, squared pixels
    min_sep_sq: f64,
    /// Seam anchor distance, pixels
    extra_distance: f64,
}

impl<'a> PathSmoother<'a> {
    /// Metric settings are converted to pixels with the checker's grid
    /// resolution.
    pub fn new(config: &PlannerConfig, checker: CollisionChecker<'a>) -> Self {
        let resolution = checker.grid().resolution();
        Self {
            checker,
            max_anchors: config.bezier_max_control_points.max(3),
            steps: config.bezier_steps,
            min_sep_sq: config.min_node_sep_sq / (resolution * resolution),
            extra_distance: config.extra_point_distance / resolution,
        }
    }

    /// Smooth a polyline given as points (start, roadmap nodes, goal).
    ///
    /// Fails with [`PlanError::StaleRoadmap`] when two consecutive raw
    /// points are not connected by a free straight line.
    pub fn smooth(&self, raw: &[GraphNode]) -> Result<SmoothedPath, PlanError> {
        let mut points = Vec::new();
        for anchors in self.anchor_runs(raw)? {
            points.extend(bezier_curve(&anchors, self.steps));
        }
        Ok(SmoothedPath { points })
    }

    /// Cut `raw` into merged anchor runs, one per Bezier curve.
    ///
    /// A run after a cut starts with the cut point followed by the seam
    /// anchor when that anchor is reachable; the seam anchor is never
    /// merged away.
    pub fn anchor_runs(&self, raw: &[GraphNode]) -> Result<Vec<Vec<GraphNode>>, PlanError> {
        if raw.len() < 2 {
            return Ok(if raw.is_empty() {
                Vec::new()
            } else {
                vec![raw.to_vec()]
            });
        }

        let mut runs = Vec::new();
        let mut run: Vec<GraphNode> = Vec::with_capacity(self.max_anchors);
        // Leading anchors of the current run exempt from merging
        let mut fixed = 1;
        let mut exit: Option<(GraphNode, GraphNode)> = None;

        let mut i = 1;
        while i < raw.len() {
            if run.is_empty() {
                run.push(raw[i - 1]);
                fixed = 1;
                if let Some((a, b)) = exit.take() {
                    let anchor = b + (b - a).unit() * self.extra_distance;
                    if !self.checker.segment_collides(raw[i - 1], anchor) {
                        run.push(anchor);
                        fixed = 2;
                    }
                }
            }

            if self.checker.segment_collides(raw[i - 1], raw[i]) {
                let (from, to) = (raw[i - 1], raw[i]);
                warn!(
                    "[Smoother] stale roadmap: ({:.1}, {:.1}) -> ({:.1}, {:.1}) collides",
                    from.x, from.y, to.x, to.y
                );
                return Err(PlanError::StaleRoadmap { from, to });
            }

            if run.len() < self.max_anchors && !self.checker.segment_collides(run[0], raw[i]) {
                run.push(raw[i]);
                i += 1;
            } else {
                // Close the run; raw[i] is retried as part of the next one
                let anchors = merge_close_anchors(&run, fixed, self.min_sep_sq);
                if anchors.len() > 1 {
                    exit = Some((anchors[anchors.len() - 2], anchors[anchors.len() - 1]));
                }
                runs.push(anchors);
                run.clear();
            }
        }

        if !run.is_empty() {
            runs.push(merge_close_anchors(&run, fixed, self.min_sep_sq));
        }
        Ok(runs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GridSnapshot;
    use approx::assert_relative_eq;

    fn block_grid() -> GridSnapshot {
        // 40x40, block covering x 15..25, y 0..25
        let mut cells = vec![0i8; 1600];
        for y in 0..25 {
            for x in 15..25 {
                cells[y * 40 + x] = 100;
            }
        }
        GridSnapshot::new(40, 40, 0.05, cells).unwrap()
    }

    #[test]
    fn test_bezier_single_point() {
        let p = GraphNode::new(3.5, 7.25);
        assert_eq!(bezier_curve(&[p], 20), vec![p]);
    }

    #[test]
    fn test_bezier_two_points_monotone() {
        let a = GraphNode::new(1.0, 2.0);
        let b = GraphNode::new(9.0, 4.0);
        let curve = bezier_curve(&[a, b], 20);

        assert_eq!(curve.len(), 21);
        assert_eq!(curve[0], a);
        assert_eq!(curve[20], b);
        for w in curve.windows(2) {
            assert!(w[1].x >= w[0].x);
            assert!(w[1].y >= w[0].y);
        }
    }

    #[test]
    fn test_bezier_endpoints_exact() {
        let pts = [
            GraphNode::new(0.3, 0.7),
            GraphNode::new(5.0, 9.0),
            GraphNode::new(8.0, -3.0),
            GraphNode::new(12.1, 4.9),
        ];
        let curve = bezier_curve(&pts, 20);
        assert_eq!(curve[0], pts[0]);
        assert_eq!(curve[20], pts[3]);
        // Quadratic midpoint check on a simpler set
        let mid = bezier_curve(&[pts[0], pts[1], pts[3]], 2)[1];
        assert_relative_eq!(mid.x, 0.25 * 0.3 + 0.5 * 5.0 + 0.25 * 12.1, epsilon = 1e-12);
    }

    #[test]
    fn test_merge_keeps_ends() {
        let run = [
            GraphNode::new(0.0, 0.0),
            GraphNode::new(0.5, 0.0),
            GraphNode::new(5.0, 0.0),
            GraphNode::new(9.5, 0.0),
            GraphNode::new(10.0, 0.0),
        ];
        let merged = merge_close_anchors(&run, 1, 4.0);
        assert_eq!(
            merged,
            vec![GraphNode::new(0.0, 0.0), GraphNode::new(5.0, 0.0), GraphNode::new(10.0, 0.0)]
        );

        let tight = merge_close_anchors(&run[..2], 1, 100.0);
        assert_eq!(tight.len(), 2);
    }

    #[test]
    fn test_straight_route_single_run() {
        let grid = GridSnapshot::free(30, 30, 0.05).unwrap();
        let config = PlannerConfig::default();
        let smoother = PathSmoother::new(&config, CollisionChecker::new(&grid, 85, 0.1));

        let raw = [
            GraphNode::new(1.0, 1.0),
            GraphNode::new(10.0, 12.0),
            GraphNode::new(20.0, 18.0),
            GraphNode::new(28.0, 28.0),
        ];
        let path = smoother.smooth(&raw).unwrap();
        assert_eq!(path.len(), 21);
        assert_eq!(path.first(), Some(raw[0]));
        assert_eq!(path.last(), Some(raw[3]));
    }

    #[test]
    fn test_route_around_block_splits_runs() {
        let grid = block_grid();
        let config = PlannerConfig::default();
        let smoother = PathSmoother::new(&config, CollisionChecker::new(&grid, 85, 0.1));

        // Up the left side, over the block, down the right side
        let raw = [
            GraphNode::new(5.0, 5.0),
            GraphNode::new(10.0, 30.0),
            GraphNode::new(30.0, 30.0),
            GraphNode::new(35.0, 5.0),
        ];
        let path = smoother.smooth(&raw).unwrap();

        assert!(path.len() > 21);
        assert_eq!(path.first(), Some(raw[0]));
        assert_eq!(path.last(), Some(raw[3]));
        assert!(path.length() > raw[0].distance(&raw[3]));
    }

    #[test]
    fn test_stale_roadmap_detected() {
        let grid = block_grid();
        let config = PlannerConfig::default();
        let smoother = PathSmoother::new(&config, CollisionChecker::new(&grid, 85, 0.1));

        let raw = [GraphNode::new(5.0, 5.0), GraphNode::new(35.0, 5.0)];
        let err = smoother.smooth(&raw).unwrap_err();
        assert!(matches!(err, PlanError::StaleRoadmap { .. }));
    }

    /// Three-anchor runs over a 100x100 grid, optionally with a block
    /// where the seam anchor of the second run lands.
    fn seam_setup(blocked: bool) -> (GridSnapshot, PlannerConfig, [GraphNode; 4]) {
        let mut cells = vec![0i8; 100 * 100];
        if blocked {
            for y in 89..96 {
                for x in 54..60 {
                    cells[y * 100 + x] = 100;
                }
            }
        }
        let grid = GridSnapshot::new(100, 100, 0.05, cells).unwrap();
        let config = PlannerConfig {
            bezier_max_control_points: 3,
            ..PlannerConfig::default()
        }
        .with_min_node_sep_sq(1.0);
        let raw = [
            GraphNode::new(5.0, 5.0),
            GraphNode::new(20.5, 30.5),
            GraphNode::new(46.5, 75.0),
            GraphNode::new(80.0, 90.0),
        ];
        (grid, config, raw)
    }

    #[test]
    fn test_seam_anchor_kept_when_free() {
        let (grid, config, raw) = seam_setup(false);
        let smoother = PathSmoother::new(&config, CollisionChecker::new(&grid, 85, 0.1));
        let runs = smoother.anchor_runs(&raw).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0], raw[..3].to_vec());

        // 20 px along the exit direction, right at the merge distance
        let seam = raw[2] + (raw[2] - raw[1]).unit() * 20.0;
        assert_eq!(runs[1].len(), 3);
        assert_eq!(runs[1][0], raw[2]);
        assert_relative_eq!(runs[1][1].x, seam.x, epsilon = 1e-12);
        assert_relative_eq!(runs[1][1].y, seam.y, epsilon = 1e-12);
        assert_eq!(runs[1][2], raw[3]);
    }

    #[test]
    fn test_seam_anchor_dropped_when_blocked() {
        let (grid, config, raw) = seam_setup(true);
        let smoother = PathSmoother::new(&config, CollisionChecker::new(&grid, 85, 0.1));
        let runs = smoother.anchor_runs(&raw).unwrap();

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1], vec![raw[2], raw[3]]);
        let path = smoother.smooth(&raw).unwrap();
        assert_eq!(path.last(), Some(raw[3]));
    }

    #[test]
    fn test_fixed_anchors_survive_merge() {
        let a = GraphNode::new(20.5, 10.5);
        let b = GraphNode::new(46.5, 55.0);
        let seam = b + (b - a).unit() * 20.0;
        let run = [b, seam, GraphNode::new(90.0, 95.0)];
        let min_sep_sq = 1.0 / (0.05 * 0.05);

        assert_eq!(merge_close_anchors(&run, 2, min_sep_sq), run.to_vec());
        assert_eq!(merge_close_anchors(&run, 2, 401.0), run.to_vec());
        assert!(!merge_close_anchors(&run, 1, 401.0).contains(&seam));
    }
}
