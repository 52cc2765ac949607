//! Roadmap construction from an occupancy grid.
//!
//! Pipeline:
//! 1. Collect occupied cells (parallel scan over fixed cell ranges) plus
//!    caller anchors and optional frame corners as diagram sites
//! 2. Compute the clipped Voronoi edges of the sites
//! 3. Drop edges touching a blocked cell
//! 4. Merge coincident vertices into nodes and link them
//! 5. Link each degree-1 node to nodes within a small radius
//! 6. Extract the obstacle model for homotopy classes

use std::collections::HashMap;
use std::collections::TryReserveError;
use std::time::Instant;

use delaunator::Point;
use rayon::prelude::*;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::core::{CollisionChecker, GraphNode, GridSnapshot};
use crate::error::BuildError;
use crate::homotopy::ObstacleModel;
use crate::utils::elapsed_ms;

use super::graph::Roadmap;
use super::voronoi::{ClipRect, voronoi_edges};

/// Counters from one rebuild.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoadmapStats {
    /// Occupied cells used as sites
    pub occupied_sites: usize,
    /// Caller anchors and frame corners
    pub anchor_sites: usize,
    /// Clipped Voronoi edges before pruning
    pub diagram_edges: usize,
    /// Edges dropped by collision pruning
    pub pruned_edges: usize,
    pub nodes: usize,
    pub edges: usize,
    /// Links added by singleton reconnection
    pub reconnections: usize,
    pub obstacles: usize,
    /// Total rebuild time in milliseconds
    pub elapsed_ms: f64,
}

/// Output of a successful rebuild.
#[derive(Clone, Debug)]
pub struct BuiltRoadmap {
    pub roadmap: Roadmap,
    pub obstacles: ObstacleModel,
    pub stats: RoadmapStats,
}

/// Builds a [`Roadmap`] and [`ObstacleModel`] from a grid.
pub struct GraphBuilder<'a> {
    config: &'a PlannerConfig,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(config: &'a PlannerConfig) -> Self {
        Self { config }
    }

    /// Run the full pipeline.
    pub fn build(
        &self,
        grid: &GridSnapshot,
        anchors: &[GraphNode],
    ) -> Result<BuiltRoadmap, BuildError> {
        if grid.is_empty() {
            return Err(BuildError::EmptyGrid);
        }
        let start = Instant::now();
        let mut stats = RoadmapStats::default();

        let t = Instant::now();
        let mut sites = self.occupied_sites(grid)?;
        stats.occupied_sites = sites.len();

        let corners = self.frame_corners(grid);
        sites.try_reserve(anchors.len() + corners.len())?;
        sites.extend(
            anchors
                .iter()
                .chain(corners.iter())
                .map(|a| Point { x: a.x, y: a.y }),
        );
        stats.anchor_sites = sites.len() - stats.occupied_sites;
        debug!(
            "[Roadmap] scan: {} occupied + {} anchor sites in {:.2}ms",
            stats.occupied_sites,
            stats.anchor_sites,
            elapsed_ms(t)
        );

        let t = Instant::now();
        let raw_edges = voronoi_edges(&sites, ClipRect::for_grid(grid.width(), grid.height()))?;
        stats.diagram_edges = raw_edges.len();
        debug!(
            "[Roadmap] diagram: {} edges in {:.2}ms",
            raw_edges.len(),
            elapsed_ms(t)
        );

        let t = Instant::now();
        let free_edges = self.prune_edges(grid, raw_edges);
        stats.pruned_edges = stats.diagram_edges - free_edges.len();
        debug!(
            "[Roadmap] prune: kept {} of {} edges in {:.2}ms",
            free_edges.len(),
            stats.diagram_edges,
            elapsed_ms(t)
        );

        let t = Instant::now();
        let (nodes, mut neighbors) = self.link_vertices(&free_edges);
        debug!(
            "[Roadmap] adjacency: {} nodes in {:.2}ms",
            nodes.len(),
            elapsed_ms(t)
        );

        let t = Instant::now();
        let checker = CollisionChecker::new(
            grid,
            self.config.collision_threshold,
            self.config.line_check_resolution,
        );
        stats.reconnections = self.reconnect_singletons(&checker, &nodes, &mut neighbors);
        debug!(
            "[Roadmap] reconnect: {} links in {:.2}ms",
            stats.reconnections,
            elapsed_ms(t)
        );

        let roadmap = Roadmap::new(nodes, neighbors);
        stats.nodes = roadmap.node_count();
        stats.edges = roadmap.edge_count();

        let t = Instant::now();
        let obstacles = ObstacleModel::extract(grid, self.config);
        stats.obstacles = obstacles.len();
        debug!(
            "[Roadmap] obstacles: {} centroids in {:.2}ms",
            obstacles.len(),
            elapsed_ms(t)
        );

        stats.elapsed_ms = elapsed_ms(start);
        Ok(BuiltRoadmap {
            roadmap,
            obstacles,
            stats,
        })
    }

    /// Occupied cell coordinates, honoring the site stride.
    ///
    /// Each task scans one fixed range of cells into its own buffer; the
    /// buffers are joined in range order.
    fn occupied_sites(&self, grid: &GridSnapshot) -> Result<Vec<Point>, BuildError> {
        let width = grid.width();
        let chunk = self.config.parallel_chunk_cells.max(1);
        let stride = self.config.pixels_to_skip + 1;
        let threshold = self.config.occupancy_threshold;

        let parts: Vec<Result<Vec<Point>, TryReserveError>> = grid
            .cells()
            .par_chunks(chunk)
            .enumerate()
            .map(|(c, cells)| {
                let base = c * chunk;
                let selected = |(offset, value): &(usize, &i8)| {
                    (base + offset) % stride == 0 && **value >= threshold
                };

                let count = cells.iter().enumerate().filter(selected).count();
                let mut part = Vec::new();
                part.try_reserve_exact(count)?;
                part.extend(cells.iter().enumerate().filter(selected).map(|(offset, _)| {
                    let index = base + offset;
                    Point {
                        x: (index % width) as f64,
                        y: (index / width) as f64,
                    }
                }));
                Ok(part)
            })
            .collect();

        let mut sites = Vec::new();
        let mut merged = Vec::with_capacity(parts.len());
        for part in parts {
            merged.push(part?);
        }
        sites.try_reserve_exact(merged.iter().map(Vec::len).sum())?;
        for part in merged {
            sites.extend(part);
        }
        Ok(sites)
    }

    fn frame_corners(&self, grid: &GridSnapshot) -> Vec<GraphNode> {
        if !self.config.include_frame_corners {
            return Vec::new();
        }
        let max = grid.max_corner();
        vec![
            GraphNode::new(0.0, 0.0),
            GraphNode::new(max.x, 0.0),
            GraphNode::new(0.0, max.y),
            max,
        ]
    }

    /// Keep edges whose endpoints and sampled interior are all free.
    fn prune_edges(
        &self,
        grid: &GridSnapshot,
        edges: Vec<(GraphNode, GraphNode)>,
    ) -> Vec<(GraphNode, GraphNode)> {
        let checker = CollisionChecker::new(
            grid,
            self.config.collision_threshold,
            self.config.line_check_resolution,
        );
        edges
            .into_par_iter()
            .filter(|(a, b)| {
                !checker.point_blocked(*a)
                    && !checker.point_blocked(*b)
                    && !checker.segment_collides(*a, *b)
            })
            .collect()
    }

    /// Vertex identity key: coordinates rounded to `hash_resolution`.
    fn vertex_key(&self, p: GraphNode) -> (i64, i64) {
        let step = self.config.hash_resolution;
        ((p.x / step).round() as i64, (p.y / step).round() as i64)
    }

    /// Merge edge endpoints into nodes and build symmetric neighbor lists.
    fn link_vertices(&self, edges: &[(GraphNode, GraphNode)]) -> (Vec<GraphNode>, Vec<Vec<usize>>) {
        let mut index: HashMap<(i64, i64), usize> = HashMap::new();
        let mut nodes: Vec<GraphNode> = Vec::new();
        let mut neighbors: Vec<Vec<usize>> = Vec::new();

        let mut lookup =
            |p: GraphNode, nodes: &mut Vec<GraphNode>, neighbors: &mut Vec<Vec<usize>>| {
                *index.entry(self.vertex_key(p)).or_insert_with(|| {
                    nodes.push(p);
                    neighbors.push(Vec::new());
                    nodes.len() - 1
                })
            };

        for &(a, b) in edges {
            let ia = lookup(a, &mut nodes, &mut neighbors);
            let ib = lookup(b, &mut nodes, &mut neighbors);
            if ia == ib || neighbors[ia].contains(&ib) {
                continue;
            }
            neighbors[ia].push(ib);
            neighbors[ib].push(ia);
        }

        (nodes, neighbors)
    }

    /// Link every degree-1 node to all nodes within the connection radius
    /// that it can reach in a straight line.
    fn reconnect_singletons(
        &self,
        checker: &CollisionChecker<'_>,
        nodes: &[GraphNode],
        neighbors: &mut [Vec<usize>],
    ) -> usize {
        let radius_sq = self.config.node_connection_threshold_pix.powi(2);
        let singletons: Vec<usize> = (0..nodes.len())
            .filter(|&i| neighbors[i].len() == 1)
            .collect();

        let mut links = 0;
        for s in singletons {
            for j in 0..nodes.len() {
                if j == s || neighbors[s].contains(&j) {
                    continue;
                }
                if nodes[s].distance_squared(&nodes[j]) <= radius_sq
                    && !checker.segment_collides(nodes[s], nodes[j])
                {
                    neighbors[s].push(j);
                    neighbors[j].push(s);
                    links += 1;
                }
            }
        }
        links
    }
}
