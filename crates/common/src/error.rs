//! Error types shared across CamTrack crates.

use std::path::PathBuf;

/// Top-level error type for CamTrack operations.
#[derive(Debug, thiserror::Error)]
pub enum CamtrackError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid parameter `{name}`: {message}")]
    InvalidParameter { name: &'static str, message: String },

    #[error("Degenerate crop: {width}x{height} after clamping to scene bounds")]
    DegenerateCrop { width: f64, height: f64 },

    #[error("Detection source error: {message}")]
    Detection { message: String },

    #[error("Crop sink error: {message}")]
    Sink { message: String },

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type alias using CamtrackError.
pub type CamtrackResult<T> = Result<T, CamtrackError>;

impl CamtrackError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn invalid_parameter(name: &'static str, msg: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            message: msg.into(),
        }
    }

    pub fn detection(msg: impl Into<String>) -> Self {
        Self::Detection {
            message: msg.into(),
        }
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink {
            message: msg.into(),
        }
    }

    /// Whether this error only affects the current tick.
    ///
    /// The control loop keeps running through these and holds the last frame.
    pub fn is_per_tick(&self) -> bool {
        matches!(self, Self::DegenerateCrop { .. })
    }
}
