//! Error types for Marga

use std::collections::TryReserveError;

use thiserror::Error;

use crate::core::GraphNode;

/// Malformed grid snapshot.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Grid holds {actual} cells but {width}x{height} needs {expected}")]
    CellCount {
        width: usize,
        height: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Grid resolution must be positive, got {0}")]
    Resolution(f64),
}

/// Roadmap rebuild failure. The previous roadmap stays in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Grid is empty")]
    EmptyGrid,

    #[error("Rebuild rejected: a path query is in progress")]
    QueryInProgress,

    #[error("Allocation failed while building roadmap: {0}")]
    Allocation(#[from] TryReserveError),

    #[error("Only {0} diagram sites, need three that are not collinear")]
    DegenerateSites(usize),
}

/// Path query failure.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    #[error("No roadmap has been built yet")]
    NoRoadmap,

    #[error("Another path query is in progress")]
    Busy,

    #[error("No collision-free roadmap node reachable from ({}, {})", .0.x, .0.y)]
    Unreachable(GraphNode),

    #[error("No route between roadmap nodes {from} and {to}")]
    NoRoute { from: usize, to: usize },

    #[error(
        "Roadmap is stale: segment ({}, {}) -> ({}, {}) collides",
        .from.x, .from.y, .to.x, .to.y
    )]
    StaleRoadmap { from: GraphNode, to: GraphNode },
}

/// Marga error type for configuration and map I/O.
#[derive(Error, Debug)]
pub enum MargaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Map error: {0}")]
    Map(String),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Plan(#[from] PlanError),
}

impl From<toml::de::Error> for MargaError {
    fn from(e: toml::de::Error) -> Self {
        MargaError::Config(e.to_string())
    }
}

impl From<serde_yaml::Error> for MargaError {
    fn from(e: serde_yaml::Error) -> Self {
        MargaError::Map(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MargaError>;
