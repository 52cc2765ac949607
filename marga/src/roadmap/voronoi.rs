//! Voronoi edge extraction.
//!
//! The diagram is derived from a Delaunay triangulation of the sites:
//! circumcenters of triangles sharing an edge form a finite Voronoi edge,
//! and every convex-hull edge emits a ray from its triangle's circumcenter
//! along the outward normal. All edges are clipped to the grid rectangle.

use delaunator::{EMPTY, Point, triangulate};

use crate::core::GraphNode;
use crate::error::BuildError;

/// Axis-aligned clip rectangle in pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub struct ClipRect {
    pub min: GraphNode,
    pub max: GraphNode,
}

impl ClipRect {
    /// `[0, w - 1] x [0, h - 1]`
    pub fn for_grid(width: usize, height: usize) -> Self {
        Self {
            min: GraphNode::new(0.0, 0.0),
            max: GraphNode::new(
                width.saturating_sub(1) as f64,
                height.saturating_sub(1) as f64,
            ),
        }
    }

    /// Liang-Barsky clip of `origin + t * dir` for `t` in `[0, t_max]`.
    ///
    /// Pass `f64::INFINITY` as `t_max` to clip a ray.
    pub fn clip(
        &self,
        origin: GraphNode,
        dir: GraphNode,
        t_max: f64,
    ) -> Option<(GraphNode, GraphNode)> {
        let p = [-dir.x, dir.x, -dir.y, dir.y];
        let q = [
            origin.x - self.min.x,
            self.max.x - origin.x,
            origin.y - self.min.y,
            self.max.y - origin.y,
        ];

        let mut t0 = 0.0_f64;
        let mut t1 = t_max;
        for (pk, qk) in p.into_iter().zip(q) {
            if pk == 0.0 {
                if qk < 0.0 {
                    return None;
                }
                continue;
            }
            let r = qk / pk;
            if pk < 0.0 {
                if r > t1 {
                    return None;
                }
                t0 = t0.max(r);
            } else {
                if r < t0 {
                    return None;
                }
                t1 = t1.min(r);
            }
        }

        if !t1.is_finite() {
            return None;
        }
        Some((origin + dir * t0, origin + dir * t1))
    }
}

fn circumcenter(a: &Point, b: &Point, c: &Point) -> GraphNode {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let ex = c.x - a.x;
    let ey = c.y - a.y;

    let bl = dx * dx + dy * dy;
    let cl = ex * ex + ey * ey;
    let d = 0.5 / (dx * ey - dy * ex);

    GraphNode::new(a.x + (ey * bl - dy * cl) * d, a.y + (dx * cl - ex * bl) * d)
}

#[inline]
fn next_halfedge(e: usize) -> usize {
    if e % 3 == 2 { e - 2 } else { e + 1 }
}

#[inline]
fn prev_halfedge(e: usize) -> usize {
    if e % 3 == 0 { e + 2 } else { e - 1 }
}

/// Compute the clipped Voronoi edges of `sites`.
///
/// Fails with [`BuildError::DegenerateSites`] when no triangle can be
/// formed (fewer than three sites, or all collinear).
pub fn voronoi_edges(
    sites: &[Point],
    clip: ClipRect,
) -> Result<Vec<(GraphNode, GraphNode)>, BuildError> {
    let triangulation = triangulate(sites);
    if triangulation.triangles.is_empty() {
        return Err(BuildError::DegenerateSites(sites.len()));
    }

    let triangles = &triangulation.triangles;
    let centers: Vec<GraphNode> = triangles
        .chunks_exact(3)
        .map(|t| circumcenter(&sites[t[0]], &sites[t[1]], &sites[t[2]]))
        .collect();

    let mut edges = Vec::new();
    edges.try_reserve(triangles.len())?;

    for (e, &opposite) in triangulation.halfedges.iter().enumerate() {
        let center = centers[e / 3];
        if !center.is_finite() {
            continue;
        }

        if opposite != EMPTY {
            // Each interior edge is seen from both sides
            if e > opposite {
                continue;
            }
            let other = centers[opposite / 3];
            if !other.is_finite() {
                continue;
            }
            if let Some(segment) = clip.clip(center, other - center, 1.0) {
                edges.push(segment);
            }
        } else {
            let p = &sites[triangles[e]];
            let q = &sites[triangles[next_halfedge(e)]];
            let r = &sites[triangles[prev_halfedge(e)]];

            let mut normal = GraphNode::new(-(q.y - p.y), q.x - p.x);
            // Point away from the third vertex of the hull triangle
            if normal.x * (r.x - p.x) + normal.y * (r.y - p.y) > 0.0 {
                normal = normal * -1.0;
            }
            if let Some(segment) = clip.clip(center, normal, f64::INFINITY) {
                edges.push(segment);
            }
        }
    }

    Ok(edges)
}
