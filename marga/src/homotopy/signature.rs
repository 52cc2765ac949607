//! Homotopy class signature of a path.
//!
//! For every path edge `p_{i-1} -> p_i` and every obstacle `c_j`:
//!
//! ```text
//! h += w_j * ( ln(|p_i - c_j| / |p_{i-1} - c_j|) + i * wrap(arg(p_i - c_j) - arg(p_{i-1} - c_j)) )
//! ```
//!
//! Paths that deform into each other without crossing an obstacle share
//! (numerically) the same `h`.

use num_complex::Complex64;
use rayon::prelude::*;

use crate::core::GraphNode;
use crate::utils::normalize_angle;

use super::ObstacleModel;

impl ObstacleModel {
    /// Homotopy signature of a polyline.
    ///
    /// Edges are summed in fixed ranges of `chunk_edges` on the rayon pool;
    /// partial sums are added in range order.
    pub fn class_of(&self, points: &[GraphNode], chunk_edges: usize) -> Complex64 {
        if points.len() < 2 || self.is_empty() {
            return Complex64::new(0.0, 0.0);
        }
        let edge_count = points.len() - 1;
        let chunk = chunk_edges.max(1);
        let chunks = edge_count.div_ceil(chunk);

        let partials: Vec<Complex64> = (0..chunks)
            .into_par_iter()
            .map(|c| {
                let first = 1 + c * chunk;
                let last = (first + chunk).min(points.len());
                (first..last)
                    .map(|i| self.edge_term(points[i - 1], points[i]))
                    .sum::<Complex64>()
            })
            .collect();

        partials.into_iter().sum()
    }

    fn edge_term(&self, from: GraphNode, to: GraphNode) -> Complex64 {
        let a = Complex64::new(from.x, from.y);
        let b = Complex64::new(to.x, to.y);

        self.centroids()
            .iter()
            .zip(self.coefficients())
            .map(|(&c, &w)| {
                let (r0, t0) = (a - c).to_polar();
                let (r1, t1) = (b - c).to_polar();
                w * Complex64::new(r1.ln() - r0.ln(), normalize_angle(t1 - t0))
            })
            .sum()
    }
}

/// True when `candidate` is within `threshold` of `accepted`, relative to
/// the candidate's own magnitude.
#[inline]
pub fn same_class(candidate: Complex64, accepted: Complex64, threshold: f64) -> bool {
    (candidate - accepted).norm() <= threshold * candidate.norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn single_obstacle() -> ObstacleModel {
        ObstacleModel::from_centroids(&[GraphNode::new(50.0, 50.0)], GraphNode::new(99.0, 99.0))
    }

    fn above() -> Vec<GraphNode> {
        vec![
            GraphNode::new(10.0, 50.0),
            GraphNode::new(30.0, 80.0),
            GraphNode::new(50.0, 85.0),
            GraphNode::new(70.0, 80.0),
            GraphNode::new(90.0, 50.0),
        ]
    }

    fn below() -> Vec<GraphNode> {
        vec![
            GraphNode::new(10.0, 50.0),
            GraphNode::new(50.0, 15.0),
            GraphNode::new(90.0, 50.0),
        ]
    }

    #[test]
    fn test_paths_on_opposite_sides_differ() {
        let model = single_obstacle();
        let h_above = model.class_of(&above(), 64);
        let h_below = model.class_of(&below(), 64);

        // One full turn around a unit-weight obstacle
        assert_relative_eq!((h_above - h_below).norm(), 2.0 * std::f64::consts::PI, epsilon = 1e-9);
        assert!(!same_class(h_above, h_below, 0.2));
    }

    #[test]
    fn test_deformed_path_same_class() {
        let model = single_obstacle();
        let wiggly = vec![
            GraphNode::new(10.0, 50.0),
            GraphNode::new(20.0, 70.0),
            GraphNode::new(40.0, 95.0),
            GraphNode::new(60.0, 75.0),
            GraphNode::new(80.0, 90.0),
            GraphNode::new(90.0, 50.0),
        ];
        let h1 = model.class_of(&above(), 64);
        let h2 = model.class_of(&wiggly, 64);
        assert_relative_eq!(h1.re, h2.re, epsilon = 1e-9);
        assert_relative_eq!(h1.im, h2.im, epsilon = 1e-9);
        assert!(same_class(h2, h1, 0.2));
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let model = ObstacleModel::from_centroids(
            &[GraphNode::new(30.0, 40.0), GraphNode::new(70.0, 60.0)],
            GraphNode::new(99.0, 99.0),
        );
        let path: Vec<GraphNode> = (0..50)
            .map(|i| GraphNode::new(2.0 * i as f64, 50.0 + 30.0 * (i as f64 * 0.3).sin()))
            .collect();

        let h1 = model.class_of(&path, 1);
        let h7 = model.class_of(&path, 7);
        let h_all = model.class_of(&path, 1000);
        assert_relative_eq!(h1.re, h_all.re, epsilon = 1e-9);
        assert_relative_eq!(h1.im, h_all.im, epsilon = 1e-9);
        assert_relative_eq!(h7.re, h_all.re, epsilon = 1e-9);
        assert_relative_eq!(h7.im, h_all.im, epsilon = 1e-9);
    }

    #[test]
    fn test_no_obstacles_single_class() {
        let model = ObstacleModel::default();
        let h1 = model.class_of(&above(), 64);
        let h2 = model.class_of(&below(), 64);
        assert_eq!(h1, Complex64::new(0.0, 0.0));
        assert!(same_class(h1, h2, 0.2));
    }
}
