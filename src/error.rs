//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Wraps raster I/O, filesystem and JSON errors, and provides semantic variants
//! for malformed scene ids, data-layout mismatches and configuration problems.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Malformed scene id `{id}`: {reason}")]
    MalformedSceneId { id: String, reason: String },

    #[error("Cannot resolve {what} for scene `{scene_id}` under {base}: {reason}")]
    PathResolution {
        what: String,
        scene_id: String,
        base: String,
        reason: String,
    },

    #[error("Raster read error: {0}")]
    RasterRead(#[from] crate::io::RasterError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Alignment error: {0}")]
    Alignment(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn malformed<S: Into<String>>(id: &str, reason: S) -> Self {
        Error::MalformedSceneId {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Configuration(msg.into())
    }
}
