//! A* search over the roadmap.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::core::{CollisionChecker, GraphNode};
use crate::error::PlanError;
use crate::roadmap::Roadmap;

/// Ordered sequence of roadmap node indices.
pub type RawPath = Vec<usize>;

/// Open-set entry.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    node: usize,
    f_score: f64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for SearchNode {}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lower f_score = higher priority)
        other
            .f_score
            .partial_cmp(&self.f_score)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shortest-path queries on a roadmap.
pub struct PathFinder<'a> {
    roadmap: &'a Roadmap,
}

impl<'a> PathFinder<'a> {
    pub fn new(roadmap: &'a Roadmap) -> Self {
        Self { roadmap }
    }

    /// Nearest node (squared distance) with a collision-free straight
    /// connection to `point`. Ties keep the lowest index.
    pub fn nearest_reachable_node(
        &self,
        point: GraphNode,
        checker: &CollisionChecker<'_>,
    ) -> Result<usize, PlanError> {
        let mut best: Option<(usize, f64)> = None;
        for (i, node) in self.roadmap.nodes().iter().enumerate() {
            let d = node.distance_squared(&point);
            if best.is_some_and(|(_, best_d)| d >= best_d) {
                continue;
            }
            if !checker.segment_collides(point, *node) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i).ok_or(PlanError::Unreachable(point))
    }

    /// A* from `start` to `goal` with a straight-line heuristic.
    ///
    /// Returns the node sequence and its exact Euclidean length.
    pub fn shortest_path(&self, start: usize, goal: usize) -> Result<(RawPath, f64), PlanError> {
        let n = self.roadmap.node_count();
        if start >= n || goal >= n {
            return Err(PlanError::NoRoute { from: start, to: goal });
        }
        if start == goal {
            return Ok((vec![start], 0.0));
        }

        let goal_pos = self.roadmap.node(goal);
        let heuristic = |i: usize| self.roadmap.node(i).distance(&goal_pos);

        let mut open_set = BinaryHeap::new();
        let mut g_score = vec![f64::INFINITY; n];
        let mut previous: Vec<Option<usize>> = vec![None; n];
        let mut closed = vec![false; n];

        g_score[start] = 0.0;
        open_set.push(SearchNode {
            node: start,
            f_score: heuristic(start),
        });

        let mut expanded = 0usize;
        while let Some(SearchNode { node: current, .. }) = open_set.pop() {
            if closed[current] {
                continue;
            }
            closed[current] = true;
            expanded += 1;

            if current == goal {
                let path = self.reconstruct(&previous, start, goal)?;
                let cost = self.roadmap.path_cost(&path);
                debug!(
                    "[AStar] {} -> {}: {} nodes, cost {:.2}, expanded {}",
                    start,
                    goal,
                    path.len(),
                    cost,
                    expanded
                );
                return Ok((path, cost));
            }

            let current_pos = self.roadmap.node(current);
            for next in self.roadmap.neighbors(current) {
                if closed[next] {
                    continue;
                }
                let tentative = g_score[current] + current_pos.distance(&self.roadmap.node(next));
                if tentative < g_score[next] {
                    g_score[next] = tentative;
                    previous[next] = Some(current);
                    open_set.push(SearchNode {
                        node: next,
                        f_score: tentative + heuristic(next),
                    });
                }
            }
        }

        Err(PlanError::NoRoute { from: start, to: goal })
    }

    /// Walk the predecessor table back from the goal.
    fn reconstruct(
        &self,
        previous: &[Option<usize>],
        start: usize,
        goal: usize,
    ) -> Result<RawPath, PlanError> {
        let mut path = vec![goal];
        let mut current = goal;
        while current != start {
            current = previous[current].ok_or(PlanError::NoRoute { from: start, to: goal })?;
            path.push(current);
        }
        path.reverse();
        Ok(path)
    }
}
