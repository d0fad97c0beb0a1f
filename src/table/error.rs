use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to access table file '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse CSV file '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to assemble output table with columns [{}]", .columns.join(", "))]
    Build {
        columns: Vec<String>,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to write CSV file '{path}'")]
    Write {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },

    #[error("Failed to create temporary output file next to '{0}'")]
    TempFile(PathBuf, #[source] std::io::Error),

    #[error("Failed to move finished output into place at '{0}'")]
    Persist(PathBuf, #[source] std::io::Error),

    #[error("Table '{path}' is missing required columns: {}", .columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },

    #[error("Background task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
