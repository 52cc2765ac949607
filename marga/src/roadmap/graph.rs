//! Roadmap graph storage.
//!
//! Adjacency rows hold `Option<usize>` slots: a `None` slot is an edge that
//! has been temporarily removed during a deviation search. Slots are never
//! shifted, so restoring a row is a plain copy of the saved one.

use std::collections::HashMap;
use std::ops::Deref;

use crate::core::GraphNode;

/// Undirected roadmap: node coordinates plus a per-node neighbor list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Roadmap {
    nodes: Vec<GraphNode>,
    adjacency: Vec<Vec<Option<usize>>>,
}

impl Roadmap {
    /// Build from coordinates and neighbor lists.
    ///
    /// Callers are expected to pass symmetric neighbor lists.
    pub fn new(nodes: Vec<GraphNode>, neighbors: Vec<Vec<usize>>) -> Self {
        debug_assert_eq!(nodes.len(), neighbors.len());
        let adjacency = neighbors
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self { nodes, adjacency }
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, index: usize) -> GraphNode {
        self.nodes[index]
    }

    #[inline]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Present neighbors of a node, skipping removed slots.
    #[inline]
    pub fn neighbors(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        self.adjacency[index].iter().filter_map(|slot| *slot)
    }

    /// Number of present neighbors.
    pub fn degree(&self, index: usize) -> usize {
        self.neighbors(index).count()
    }

    /// True if `b` is a present neighbor of `a`.
    pub fn has_edge(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).any(|n| n == b)
    }

    /// Raw rows including removed slots.
    pub fn raw_adjacency(&self) -> &[Vec<Option<usize>>] {
        &self.adjacency
    }

    /// Adjacency without removed slots.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        (0..self.nodes.len())
            .map(|i| self.neighbors(i).collect())
            .collect()
    }

    /// Each undirected edge once, as `(low, high)` node indices.
    pub fn edge_indices(&self) -> Vec<(usize, usize)> {
        let mut edges = Vec::new();
        for a in 0..self.nodes.len() {
            for b in self.neighbors(a) {
                if a < b {
                    edges.push((a, b));
                }
            }
        }
        edges
    }

    /// Each undirected edge once, as endpoint coordinates.
    pub fn edges(&self) -> Vec<(GraphNode, GraphNode)> {
        self.edge_indices()
            .into_iter()
            .map(|(a, b)| (self.nodes[a], self.nodes[b]))
            .collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_indices().len()
    }

    /// Nodes with exactly one neighbor.
    pub fn disconnected_nodes(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.degree(i) == 1)
            .collect()
    }

    /// True if every present edge is recorded on both of its endpoints.
    pub fn is_symmetric(&self) -> bool {
        (0..self.nodes.len()).all(|a| self.neighbors(a).all(|b| self.has_edge(b, a)))
    }

    /// Euclidean length of a node sequence.
    pub fn path_cost(&self, path: &[usize]) -> f64 {
        path.windows(2)
            .map(|w| self.nodes[w[0]].distance(&self.nodes[w[1]]))
            .sum()
    }

    /// Coordinates of a node sequence.
    pub fn path_points(&self, path: &[usize]) -> Vec<GraphNode> {
        path.iter().map(|&i| self.nodes[i]).collect()
    }

    /// Start a scoped edit. Every row touched through the guard is put
    /// back when the guard is dropped.
    pub fn edit(&mut self) -> RoadmapEdit<'_> {
        RoadmapEdit {
            roadmap: self,
            saved: HashMap::new(),
        }
    }

    fn clear_slot(&mut self, row: usize, target: usize) -> bool {
        match self.adjacency[row].iter_mut().find(|s| **s == Some(target)) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }
}

/// Scoped removal of edges and nodes from a [`Roadmap`].
///
/// Dereferences to the edited roadmap, so searches can run on it directly.
pub struct RoadmapEdit<'a> {
    roadmap: &'a mut Roadmap,
    saved: HashMap<usize, Vec<Option<usize>>>,
}

impl RoadmapEdit<'_> {
    fn save(&mut self, row: usize) {
        let roadmap = &*self.roadmap;
        self.saved
            .entry(row)
            .or_insert_with(|| roadmap.adjacency[row].clone());
    }

    /// Remove the undirected edge `a - b` if present.
    pub fn remove_edge(&mut self, a: usize, b: usize) {
        if self.roadmap.has_edge(a, b) {
            self.save(a);
            self.roadmap.clear_slot(a, b);
        }
        if self.roadmap.has_edge(b, a) {
            self.save(b);
            self.roadmap.clear_slot(b, a);
        }
    }

    /// Remove every edge touching `node`.
    pub fn isolate(&mut self, node: usize) {
        let neighbors: Vec<usize> = self.roadmap.neighbors(node).collect();
        for other in neighbors {
            self.remove_edge(node, other);
        }
    }

    /// Number of rows currently modified.
    pub fn modified_rows(&self) -> usize {
        self.saved.len()
    }
}

impl Deref for RoadmapEdit<'_> {
    type Target = Roadmap;

    fn deref(&self) -> &Roadmap {
        self.roadmap
    }
}

impl Drop for RoadmapEdit<'_> {
    fn drop(&mut self) {
        for (row, original) in self.saved.drain() {
            self.roadmap.adjacency[row] = original;
        }
    }
}
