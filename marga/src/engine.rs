//! Planning engine facade.
//!
//! Owns the current roadmap and obstacle model and serializes rebuilds
//! against queries:
//! - a query waits until running rebuilds finish, then runs alone
//! - a rebuild requested while a query runs is rejected immediately
//! - a second concurrent query is rejected with [`PlanError::Busy`]
//!
//! A failed rebuild leaves the previous roadmap in place.

use std::time::Instant;

use num_complex::Complex64;
use parking_lot::{Condvar, Mutex};
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::core::{CollisionChecker, GraphNode, GridSnapshot};
use crate::error::{BuildError, MargaError, PlanError};
use crate::homotopy::ObstacleModel;
use crate::planning::{PathFinder, PathSmoother, SmoothedPath, find_alternates};
use crate::roadmap::{GraphBuilder, Roadmap, RoadmapStats};
use crate::utils::elapsed_ms;

/// Result of a path query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSet {
    /// Smoothed routes, the shortest first
    pub paths: Vec<SmoothedPath>,
    /// True when as many distinct routes as requested were found
    pub all_found: bool,
}

#[derive(Debug, Default)]
struct EngineFlags {
    /// Rebuilds currently running
    rebuilding: usize,
    querying: bool,
}

/// Everything produced by one successful rebuild.
struct PlannerState {
    grid: GridSnapshot,
    roadmap: Roadmap,
    obstacles: ObstacleModel,
    stats: RoadmapStats,
}

/// Thread-safe roadmap planner.
pub struct PlanningEngine {
    config: PlannerConfig,
    flags: Mutex<EngineFlags>,
    /// Signalled whenever a rebuild or query finishes
    idle: Condvar,
    state: Mutex<Option<PlannerState>>,
    anchors: Mutex<Vec<GraphNode>>,
}

/// Clears one flag and wakes waiters on drop.
struct FlagGuard<'a> {
    engine: &'a PlanningEngine,
    rebuild: bool,
}

impl Drop for FlagGuard<'_> {
    fn drop(&mut self) {
        let mut flags = self.engine.flags.lock();
        if self.rebuild {
            flags.rebuilding = flags.rebuilding.saturating_sub(1);
        } else {
            flags.querying = false;
        }
        self.engine.idle.notify_all();
    }
}

impl Default for PlanningEngine {
    fn default() -> Self {
        Self::new(PlannerConfig::default())
    }
}

impl PlanningEngine {
    /// Engine with a config that is trusted as is. Use [`Self::try_new`]
    /// for configs built by hand or read from untrusted input.
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            flags: Mutex::new(EngineFlags::default()),
            idle: Condvar::new(),
            state: Mutex::new(None),
            anchors: Mutex::new(Vec::new()),
        }
    }

    /// Engine with a validated config.
    pub fn try_new(config: PlannerConfig) -> Result<Self, MargaError> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Register extra diagram sites merged into the next rebuild.
    pub fn set_local_vertices(&self, points: Vec<GraphNode>) {
        *self.anchors.lock() = points;
    }

    /// True while a rebuild is running.
    pub fn is_updating_voronoi(&self) -> bool {
        self.flags.lock().rebuilding > 0
    }

    /// Rebuild the roadmap; `false` on any build failure.
    pub fn map_to_graph(&self, grid: GridSnapshot) -> bool {
        match self.try_map_to_graph(grid) {
            Ok(stats) => {
                info!(
                    "[Engine] roadmap rebuilt: {} nodes, {} edges, {} obstacles in {:.1}ms",
                    stats.nodes, stats.edges, stats.obstacles, stats.elapsed_ms
                );
                true
            }
            Err(e) => {
                warn!("[Engine] rebuild failed: {}", e);
                false
            }
        }
    }

    /// Rebuild the roadmap, reporting why it failed.
    pub fn try_map_to_graph(&self, grid: GridSnapshot) -> Result<RoadmapStats, BuildError> {
        let _guard = {
            let mut flags = self.flags.lock();
            if flags.querying {
                return Err(BuildError::QueryInProgress);
            }
            flags.rebuilding += 1;
            FlagGuard {
                engine: self,
                rebuild: true,
            }
        };

        let anchors = self.anchors.lock().clone();
        let built = GraphBuilder::new(&self.config).build(&grid, &anchors)?;
        let stats = built.stats.clone();

        *self.state.lock() = Some(PlannerState {
            grid,
            roadmap: built.roadmap,
            obstacles: built.obstacles,
            stats: built.stats,
        });
        Ok(stats)
    }

    /// Up to `k` distinct smoothed routes from `start` to `end` (grid
    /// pixels). Empty on any failure.
    pub fn get_path(&self, start: GraphNode, end: GraphNode, k: usize) -> Vec<SmoothedPath> {
        match self.plan(start, end, k) {
            Ok(set) => set.paths,
            Err(e @ (PlanError::StaleRoadmap { .. } | PlanError::Busy)) => {
                warn!("[Engine] query failed: {}", e);
                Vec::new()
            }
            Err(e) => {
                info!("[Engine] no route: {}", e);
                Vec::new()
            }
        }
    }

    /// Up to `k` routes in distinct homotopy classes, the shortest first.
    ///
    /// `k = 0` is treated as 1. Waits for running rebuilds; fails with
    /// [`PlanError::Busy`] if another query is running.
    pub fn plan(&self, start: GraphNode, end: GraphNode, k: usize) -> Result<PathSet, PlanError> {
        let _guard = {
            let mut flags = self.flags.lock();
            while flags.rebuilding > 0 {
                self.idle.wait(&mut flags);
            }
            if flags.querying {
                return Err(PlanError::Busy);
            }
            flags.querying = true;
            FlagGuard {
                engine: self,
                rebuild: false,
            }
        };

        let mut slot = self.state.lock();
        let state = slot.as_mut().ok_or(PlanError::NoRoadmap)?;
        let PlannerState {
            grid,
            roadmap,
            obstacles,
            ..
        } = state;

        let checker = CollisionChecker::new(
            grid,
            self.config.collision_threshold,
            self.config.line_check_resolution,
        );
        let query_start = Instant::now();

        let t = Instant::now();
        let finder = PathFinder::new(roadmap);
        let start_node = finder.nearest_reachable_node(start, &checker)?;
        let end_node = finder.nearest_reachable_node(end, &checker)?;
        debug!("[Engine] nearest nodes in {:.2}ms", elapsed_ms(t));

        let t = Instant::now();
        let (shortest, cost) = finder.shortest_path(start_node, end_node)?;
        debug!(
            "[Engine] shortest path: {} nodes, cost {:.2} in {:.2}ms",
            shortest.len(),
            cost,
            elapsed_ms(t)
        );

        let t = Instant::now();
        let alternates = k.max(1) - 1;
        let routes = find_alternates(
            roadmap,
            obstacles,
            &self.config,
            end_node,
            shortest,
            alternates,
        );
        debug!(
            "[Engine] {} routes in {:.2}ms",
            routes.paths.len(),
            elapsed_ms(t)
        );
        if !routes.all_found {
            info!(
                "[Engine] found {} of {} requested distinct routes",
                routes.paths.len(),
                alternates + 1
            );
        }

        let t = Instant::now();
        let smoother = PathSmoother::new(&self.config, checker);
        let mut paths = Vec::with_capacity(routes.paths.len());
        for route in &routes.paths {
            let mut raw = Vec::with_capacity(route.len() + 2);
            raw.push(start);
            raw.extend(route.iter().map(|&i| roadmap.node(i)));
            raw.push(end);
            paths.push(smoother.smooth(&raw)?);
        }
        debug!(
            "[Engine] smoothing in {:.2}ms, query total {:.2}ms",
            elapsed_ms(t),
            elapsed_ms(query_start)
        );

        Ok(PathSet {
            paths,
            all_found: routes.all_found,
        })
    }

    fn with_state<T>(&self, default: T, f: impl FnOnce(&PlannerState) -> T) -> T {
        self.state.lock().as_ref().map(f).unwrap_or(default)
    }

    /// Neighbor lists of the current roadmap.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        self.with_state(Vec::new(), |s| s.roadmap.adjacency())
    }

    /// Each roadmap edge once, as endpoint coordinates.
    pub fn edges(&self) -> Vec<(GraphNode, GraphNode)> {
        self.with_state(Vec::new(), |s| s.roadmap.edges())
    }

    /// Coordinates of nodes with exactly one neighbor.
    pub fn disconnected_nodes(&self) -> Vec<GraphNode> {
        self.with_state(Vec::new(), |s| {
            s.roadmap
                .disconnected_nodes()
                .into_iter()
                .map(|i| s.roadmap.node(i))
                .collect()
        })
    }

    pub fn obstacle_centroids(&self) -> Vec<Complex64> {
        self.with_state(Vec::new(), |s| s.obstacles.centroids().to_vec())
    }

    pub fn node_count(&self) -> usize {
        self.with_state(0, |s| s.roadmap.node_count())
    }

    pub fn edge_count(&self) -> usize {
        self.with_state(0, |s| s.roadmap.edge_count())
    }

    /// Statistics of the last successful rebuild.
    pub fn stats(&self) -> Option<RoadmapStats> {
        self.with_state(None, |s| Some(s.stats.clone()))
    }

    /// Copy of the current roadmap.
    pub fn roadmap(&self) -> Option<Roadmap> {
        self.with_state(None, |s| Some(s.roadmap.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_grid() -> GridSnapshot {
        GridSnapshot::free(10, 10, 0.05).unwrap()
    }

    #[test]
    fn test_query_before_rebuild() {
        let engine = PlanningEngine::default();
        let err = engine
            .plan(GraphNode::new(0.0, 0.0), GraphNode::new(9.0, 9.0), 1)
            .unwrap_err();
        assert_eq!(err, PlanError::NoRoadmap);
        assert!(
            engine
                .get_path(GraphNode::new(0.0, 0.0), GraphNode::new(9.0, 9.0), 1)
                .is_empty()
        );
    }

    #[test]
    fn test_failed_rebuild_keeps_roadmap() {
        let engine = PlanningEngine::default();
        assert!(engine.map_to_graph(free_grid()));
        let nodes = engine.node_count();
        assert!(nodes > 0);

        let empty = GridSnapshot::new(0, 0, 0.05, Vec::new()).unwrap();
        assert!(!engine.map_to_graph(empty));
        assert_eq!(engine.node_count(), nodes);
        assert!(!engine.is_updating_voronoi());
    }

    #[test]
    fn test_rebuild_rejected_during_query() {
        let engine = PlanningEngine::default();
        assert!(engine.map_to_graph(free_grid()));

        engine.flags.lock().querying = true;
        assert_eq!(
            engine.try_map_to_graph(free_grid()).unwrap_err(),
            BuildError::QueryInProgress
        );
        assert_eq!(
            engine
                .plan(GraphNode::new(0.0, 0.0), GraphNode::new(9.0, 9.0), 1)
                .unwrap_err(),
            PlanError::Busy
        );
        engine.flags.lock().querying = false;

        assert!(engine.map_to_graph(free_grid()));
    }

    #[test]
    fn test_query_waits_for_rebuild() {
        use std::sync::Arc;
        use std::time::Duration;

        let engine = Arc::new(PlanningEngine::default());
        assert!(engine.map_to_graph(free_grid()));

        engine.flags.lock().rebuilding = 1;
        let worker = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || {
                engine.get_path(GraphNode::new(0.0, 0.0), GraphNode::new(9.0, 9.0), 1)
            })
        };

        std::thread::sleep(Duration::from_millis(50));
        assert!(!worker.is_finished());
        {
            let mut flags = engine.flags.lock();
            flags.rebuilding = 0;
            engine.idle.notify_all();
        }

        let paths = worker.join().unwrap();
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = PlannerConfig {
            line_check_resolution: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(
            PlanningEngine::try_new(config),
            Err(MargaError::Config(_))
        ));

        let engine = PlanningEngine::try_new(PlannerConfig::default()).unwrap();
        assert!(engine.map_to_graph(free_grid()));
    }

    #[test]
    fn test_local_vertices_become_sites() {
        let engine = PlanningEngine::default();
        engine.set_local_vertices(vec![GraphNode::new(3.0, 3.0), GraphNode::new(6.0, 3.0)]);
        assert!(engine.map_to_graph(free_grid()));
        assert_eq!(engine.stats().unwrap().anchor_sites, 6);
    }
}
