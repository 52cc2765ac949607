//! Map loading and SVG export.

mod map_loader;
mod svg;

pub use map_loader::{MapMetadata, grid_from_image, load_map};
pub use svg::{SvgColorScheme, SvgConfig, SvgRenderer};
