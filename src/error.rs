use std::path::PathBuf;
use thiserror::Error;

/// Failures at the load and output boundaries.
///
/// Scoring and validation never fail: degenerate inputs are substituted
/// locally and missing benchmark levels are values, not errors.
#[derive(Debug, Error)]
pub enum GeoCreditError {
    #[error("dataset not found: {}", path.display())]
    DatasetNotFound { path: PathBuf },

    #[error("{file}: required column `{column}` is missing")]
    MissingColumn { file: String, column: String },

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, GeoCreditError>;
