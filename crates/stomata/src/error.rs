//! Library error type.

use std::path::PathBuf;

/// Errors surfaced by the I/O and engine boundaries of the pipeline.
///
/// Geometry never fails: degenerate shapes are reported as `None`.
#[derive(Debug, thiserror::Error)]
pub enum StomataError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("failed to decode image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid mask: {0}")]
    InvalidMask(String),

    #[error("invalid detection dump {path}: {reason}")]
    InvalidDump { path: PathBuf, reason: String },

    #[error("detection engine failed: {0}")]
    Engine(String),
}

impl StomataError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::Json {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = StomataError> = std::result::Result<T, E>;
