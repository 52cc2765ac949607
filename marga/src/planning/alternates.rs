//! Homotopy-distinct alternate routes (Yen's algorithm with a class filter).
//!
//! Deviation searches run on the roadmap itself: each spur search removes
//! edges and nodes through a [`RoadmapEdit`](crate::roadmap::RoadmapEdit)
//! guard, which restores the touched rows when it goes out of scope.

use std::cmp::Ordering;

use num_complex::Complex64;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::homotopy::{ObstacleModel, same_class};
use crate::roadmap::Roadmap;

use super::astar::{PathFinder, RawPath};

/// Routes in increasing cost order, the shortest first.
#[derive(Clone, Debug, PartialEq)]
pub struct AlternateRoutes {
    pub paths: Vec<RawPath>,
    /// True when every requested alternate was found
    pub all_found: bool,
}

#[derive(Debug)]
struct Candidate {
    path: RawPath,
    cost: f64,
    /// Still eligible; cleared once the candidate is accepted or rejected
    live: bool,
}

/// Find up to `k` alternates to `shortest`, each in a homotopy class
/// distinct from every route accepted before it.
///
/// The roadmap is edited during the search and is identical to its
/// original state when this returns.
pub fn find_alternates(
    roadmap: &mut Roadmap,
    obstacles: &ObstacleModel,
    config: &PlannerConfig,
    goal: usize,
    shortest: RawPath,
    k: usize,
) -> AlternateRoutes {
    let mut accepted: Vec<RawPath> = vec![shortest];
    if k == 0 {
        return AlternateRoutes {
            paths: accepted,
            all_found: true,
        };
    }

    let class_of = |roadmap: &Roadmap, path: &[usize]| -> Complex64 {
        obstacles.class_of(&roadmap.path_points(path), config.homotopy_chunk_edges)
    };

    let mut classes: Vec<Complex64> = Vec::with_capacity(k + 1);
    let mut pool: Vec<Candidate> = Vec::new();
    let mut spur_searches = 0usize;
    let mut duplicates = 0usize;
    let mut same_class_rejections = 0usize;

    for round in 0..k {
        // The previous round accepted nothing: no unique deviations remain
        if accepted.len() <= round {
            break;
        }

        let last = accepted[accepted.len() - 1].clone();
        classes.push(class_of(roadmap, &last));

        for i in 0..last.len().saturating_sub(1) {
            let spur = last[i];
            let root = &last[..=i];

            let spur_result = {
                let mut edit = roadmap.edit();
                for path in &accepted {
                    if path.len() > i + 1 && path[..=i] == *root {
                        edit.remove_edge(spur, path[i + 1]);
                    }
                }
                for &node in &root[..i] {
                    edit.isolate(node);
                }
                PathFinder::new(&edit).shortest_path(spur, goal)
            };
            spur_searches += 1;

            let Ok((spur_path, _)) = spur_result else {
                continue;
            };

            let mut total = Vec::with_capacity(i + spur_path.len());
            total.extend_from_slice(&root[..i]);
            total.extend(spur_path);

            if accepted.contains(&total) || pool.iter().any(|c| c.path == total) {
                duplicates += 1;
                continue;
            }
            let cost = roadmap.path_cost(&total);
            pool.push(Candidate {
                path: total,
                cost,
                live: true,
            });
        }

        if pool.is_empty() {
            break;
        }

        let mut order: Vec<usize> = (0..pool.len()).filter(|&i| pool[i].live).collect();
        order.sort_by(|&a, &b| {
            pool[a]
                .cost
                .partial_cmp(&pool[b].cost)
                .unwrap_or(Ordering::Equal)
        });

        for idx in order {
            pool[idx].live = false;
            let h = class_of(roadmap, &pool[idx].path);
            if classes
                .iter()
                .any(|&known| same_class(h, known, config.h_class_threshold))
            {
                same_class_rejections += 1;
                continue;
            }
            accepted.push(pool[idx].path.clone());
            break;
        }
    }

    debug!(
        "[Alternates] {}/{} found: {} spurs, {} candidates, {} duplicates, {} same-class",
        accepted.len() - 1,
        k,
        spur_searches,
        pool.len(),
        duplicates,
        same_class_rejections
    );

    let all_found = accepted.len() == k + 1;
    AlternateRoutes {
        paths: accepted,
        all_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::GraphNode;

    /// Routes around an obstacle at (50, 50):
    /// upper 0-1-2-3, upper detour 1-6-2, lower 0-4-5-3.
    fn ring(with_lower: bool) -> Roadmap {
        let nodes = vec![
            GraphNode::new(10.0, 50.0),
            GraphNode::new(30.0, 80.0),
            GraphNode::new(70.0, 80.0),
            GraphNode::new(90.0, 50.0),
            GraphNode::new(30.0, 15.0),
            GraphNode::new(70.0, 15.0),
            GraphNode::new(50.0, 95.0),
        ];
        let mut neighbors = vec![
            vec![1],
            vec![0, 2, 6],
            vec![1, 3, 6],
            vec![2],
            vec![],
            vec![],
            vec![1, 2],
        ];
        if with_lower {
            neighbors[0].push(4);
            neighbors[3].push(5);
            neighbors[4] = vec![0, 5];
            neighbors[5] = vec![4, 3];
        }
        Roadmap::new(nodes, neighbors)
    }

    fn obstacle() -> ObstacleModel {
        ObstacleModel::from_centroids(&[GraphNode::new(50.0, 50.0)], GraphNode::new(99.0, 99.0))
    }

    fn shortest(map: &Roadmap) -> RawPath {
        PathFinder::new(map).shortest_path(0, 3).unwrap().0
    }

    #[test]
    fn test_finds_route_on_other_side() {
        let mut map = ring(true);
        let before = map.clone();
        let config = PlannerConfig::default();
        let first = shortest(&map);
        assert_eq!(first, vec![0, 1, 2, 3]);

        let routes = find_alternates(&mut map, &obstacle(), &config, 3, first, 1);

        assert!(routes.all_found);
        assert_eq!(routes.paths, vec![vec![0, 1, 2, 3], vec![0, 4, 5, 3]]);
        assert_eq!(map, before);
    }

    #[test]
    fn test_partial_when_classes_exhausted() {
        let mut map = ring(true);
        let config = PlannerConfig::default();
        let first = shortest(&map);

        let routes = find_alternates(&mut map, &obstacle(), &config, 3, first, 4);

        assert!(!routes.all_found);
        assert_eq!(routes.paths.len(), 2);
    }

    #[test]
    fn test_same_class_detour_rejected() {
        let mut map = ring(false);
        let before = map.clone();
        let config = PlannerConfig::default();
        let first = shortest(&map);

        let routes = find_alternates(&mut map, &obstacle(), &config, 3, first, 1);

        // 0-1-6-2-3 passes the obstacle on the same side
        assert!(!routes.all_found);
        assert_eq!(routes.paths, vec![vec![0, 1, 2, 3]]);
        assert!(map.raw_adjacency() == before.raw_adjacency());
    }

    #[test]
    fn test_zero_alternates() {
        let mut map = ring(true);
        let config = PlannerConfig::default();
        let first = shortest(&map);

        let routes = find_alternates(&mut map, &obstacle(), &config, 3, first.clone(), 0);
        assert!(routes.all_found);
        assert_eq!(routes.paths, vec![first]);
    }
}
