use std::path::PathBuf;

use thiserror::Error;

/// startup and export failures. steady-state mutate/render/score has no error path.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("failed to load target image {path}: {source}")]
    TargetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("target image {path} has no pixels")]
    EmptyTarget { path: PathBuf },

    #[error("no target image given (pass a path or set CIRCLETRACE_TARGET)")]
    MissingTarget,

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
