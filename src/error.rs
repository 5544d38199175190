//! Error types for the arena crate.

use std::path::PathBuf;

/// Errors surfaced by board construction, match driving and table persistence.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("illegal move: column {column} is out of range or full")]
    IllegalMove { column: usize },

    #[error("{policy} returned no move on a board with legal moves")]
    NoMove { policy: String },

    #[error("failed to access value table {path}: {source}")]
    TableIo {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("value table {path} is corrupt: {source}")]
    TableCorrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for arena operations
pub type Result<T> = std::result::Result<T, Error>;
