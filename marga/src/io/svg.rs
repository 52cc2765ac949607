//! SVG rendering of roadmaps and planned routes.
//!
//! Draws, in grid pixels:
//! - occupied cells
//! - roadmap edges and disconnected nodes
//! - obstacle centroids
//! - smoothed routes

use std::fmt::{self, Write};
use std::path::Path;

use crate::core::{GraphNode, GridSnapshot};
use crate::error::Result;
use crate::planning::SmoothedPath;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// SVG color scheme
#[derive(Clone, Debug)]
pub struct SvgColorScheme {
    pub occupied: &'static str,
    pub free: &'static str,
    pub edge: &'static str,
    pub disconnected: &'static str,
    pub centroid: &'static str,
    /// Cycled over routes
    pub paths: [&'static str; 4],
}

impl Default for SvgColorScheme {
    fn default() -> Self {
        Self {
            occupied: "#333333",
            free: "#FFFFFF",
            edge: "#7FA7D9",
            disconnected: "#FF8800",
            centroid: "#AA2222",
            paths: ["#22AA22", "#2222AA", "#AA22AA", "#22AAAA"],
        }
    }
}

/// Rendering options
#[derive(Clone, Debug)]
pub struct SvgConfig {
    /// SVG units per grid cell
    pub scale: f64,
    /// Cells at or above this value are drawn occupied
    pub occupied_threshold: i8,
    pub edge_width: f64,
    pub path_width: f64,
    pub marker_radius: f64,
    pub colors: SvgColorScheme,
}

impl Default for SvgConfig {
    fn default() -> Self {
        Self {
            scale: 4.0,
            occupied_threshold: 85,
            edge_width: 0.5,
            path_width: 1.5,
            marker_radius: 2.0,
            colors: SvgColorScheme::default(),
        }
    }
}

/// Builder for a single SVG image.
pub struct SvgRenderer<'a> {
    config: SvgConfig,
    grid: &'a GridSnapshot,
    edges: Vec<(GraphNode, GraphNode)>,
    disconnected: Vec<GraphNode>,
    centroids: Vec<GraphNode>,
    paths: Vec<SmoothedPath>,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(grid: &'a GridSnapshot, config: SvgConfig) -> Self {
        Self {
            config,
            grid,
            edges: Vec::new(),
            disconnected: Vec::new(),
            centroids: Vec::new(),
            paths: Vec::new(),
        }
    }

    pub fn with_edges(mut self, edges: Vec<(GraphNode, GraphNode)>) -> Self {
        self.edges = edges;
        self
    }

    pub fn with_disconnected(mut self, nodes: Vec<GraphNode>) -> Self {
        self.disconnected = nodes;
        self
    }

    pub fn with_centroids(mut self, centroids: Vec<GraphNode>) -> Self {
        self.centroids = centroids;
        self
    }

    pub fn with_paths(mut self, paths: Vec<SmoothedPath>) -> Self {
        self.paths = paths;
        self
    }

    /// Render to an SVG string.
    pub fn render(&self) -> String {
        let mut svg = String::new();
        // Writing into a String never fails
        let _ = self.write_svg(&mut svg);
        svg
    }

    /// Render and write to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }

    /// Grid pixel to SVG coordinates, y pointing down.
    fn to_svg(&self, p: GraphNode) -> (f64, f64) {
        let s = self.config.scale;
        (
            (p.x + 0.5) * s,
            (self.grid.height() as f64 - 0.5 - p.y) * s,
        )
    }

    fn write_svg(&self, svg: &mut String) -> fmt::Result {
        let s = self.config.scale;
        let width = self.grid.width() as f64 * s;
        let height = self.grid.height() as f64 * s;
        let colors = &self.config.colors;

        writeln!(svg, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
        writeln!(
            svg,
            r#"<svg xmlns="{}" width="{:.0}" height="{:.0}" viewBox="0 0 {:.0} {:.0}">"#,
            SVG_NS, width, height, width, height
        )?;
        writeln!(
            svg,
            r#"  <rect width="100%" height="100%" fill="{}"/>"#,
            colors.free
        )?;

        self.write_grid(svg)?;

        writeln!(
            svg,
            r#"  <g id="roadmap" stroke="{}" stroke-width="{:.2}">"#,
            colors.edge, self.config.edge_width
        )?;
        for &(a, b) in &self.edges {
            let (x1, y1) = self.to_svg(a);
            let (x2, y2) = self.to_svg(b);
            writeln!(
                svg,
                r#"    <line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}"/>"#,
                x1, y1, x2, y2
            )?;
        }
        writeln!(svg, "  </g>")?;

        self.write_markers(svg, "disconnected", &self.disconnected, colors.disconnected)?;
        self.write_markers(svg, "centroids", &self.centroids, colors.centroid)?;

        for (i, path) in self.paths.iter().enumerate() {
            if path.is_empty() {
                continue;
            }
            let mut d = String::new();
            for (j, p) in path.points.iter().enumerate() {
                let (x, y) = self.to_svg(*p);
                let cmd = if j == 0 { 'M' } else { 'L' };
                write!(d, "{}{:.1} {:.1} ", cmd, x, y)?;
            }
            writeln!(
                svg,
                r#"  <path id="route-{}" d="{}" fill="none" stroke="{}" stroke-width="{:.2}"/>"#,
                i,
                d.trim_end(),
                colors.paths[i % colors.paths.len()],
                self.config.path_width
            )?;
        }

        writeln!(svg, "</svg>")
    }

    /// Occupied cells, one rect per horizontal run.
    fn write_grid(&self, svg: &mut String) -> fmt::Result {
        let s = self.config.scale;
        let (w, h) = (self.grid.width(), self.grid.height());
        let cells = self.grid.cells();

        writeln!(svg, r#"  <g id="grid" fill="{}">"#, self.config.colors.occupied)?;
        for y in 0..h {
            let row = &cells[y * w..(y + 1) * w];
            let mut x = 0;
            while x < w {
                if row[x] < self.config.occupied_threshold {
                    x += 1;
                    continue;
                }
                let run_start = x;
                while x < w && row[x] >= self.config.occupied_threshold {
                    x += 1;
                }
                writeln!(
                    svg,
                    r#"    <rect x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}"/>"#,
                    run_start as f64 * s,
                    (h - 1 - y) as f64 * s,
                    (x - run_start) as f64 * s,
                    s
                )?;
            }
        }
        writeln!(svg, "  </g>")
    }

    fn write_markers(
        &self,
        svg: &mut String,
        id: &str,
        points: &[GraphNode],
        color: &str,
    ) -> fmt::Result {
        writeln!(svg, r#"  <g id="{}" fill="{}">"#, id, color)?;
        for p in points {
            let (x, y) = self.to_svg(*p);
            writeln!(
                svg,
                r#"    <circle cx="{:.1}" cy="{:.1}" r="{:.1}"/>"#,
                x, y, self.config.marker_radius
            )?;
        }
        writeln!(svg, "  </g>")
    }
}
