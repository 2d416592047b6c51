// error_handling.rs - Crate-level error type for config, I/O and snapshot failures

use thiserror::Error;

use crate::animation::AnimationError;

#[derive(Error, Debug)]
pub enum LandingError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image processing failed: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Viewport {width}x{height} is degenerate")]
    DegenerateViewport { width: u32, height: u32 },

    #[error(transparent)]
    Animation(#[from] AnimationError),
}

pub type Result<T> = std::result::Result<T, LandingError>;

/// Shorthand for config validation failures
pub(crate) fn invalid_config(reason: impl Into<String>) -> LandingError {
    LandingError::InvalidConfig { reason: reason.into() }
}
