use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FishboneError {
    #[error("failed to parse diagram: {0}")]
    Parse(String),

    #[error("category code must not be empty (category #{index})")]
    EmptyCategoryCode { index: usize },

    #[error("duplicate category code `{0}`")]
    DuplicateCategory(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T, E = FishboneError> = std::result::Result<T, E>;
