use std::path::PathBuf;

/// Invalid or unreadable simulation configuration.
///
/// Raised only while building a model, never during stepping.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("grid dimensions must be positive, got {width}x{height}")]
    NonPositiveDimension { width: usize, height: usize },

    #[error("{name} must be within [0, 1], got {value}")]
    DensityOutOfRange { name: &'static str, value: f64 },

    #[error("cop density + citizen density must not exceed 1 (got {cop} + {citizen})")]
    DensitySumExceedsOne { cop: f64, citizen: f64 },

    #[error("legitimacy must be within [0, 1], got {0}")]
    LegitimacyOutOfRange(f64),

    #[error("max jail term must be at least 1, got {0}")]
    InvalidJailTerm(u32),

    #[error("arrest probability constant must be positive and finite, got {0}")]
    InvalidArrestConstant(f64),

    #[error("network discount factor must be non-negative and finite, got {0}")]
    InvalidDiscountFactor(f64),

    #[error("active threshold must be finite, got {0}")]
    NonFiniteThreshold(f64),

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Grid occupancy violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell ({x}, {y}) is already occupied by agent {occupant}")]
    OccupiedCell { x: usize, y: usize, occupant: usize },

    #[error("cell ({x}, {y}) lies outside the grid")]
    OutOfBounds { x: usize, y: usize },
}

/// Failure to bring a model up. Fatal for that run.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("agent placement failed: {0}")]
    Grid(#[from] GridError),
}

/// Failure of a single batch run or of writing its output.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("invalid parameter combination: {0}")]
    Sim(#[from] SimError),

    #[error("parameter override rejected: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown sweep parameter `{0}`")]
    UnknownParameter(String),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}
