//! Custom error types for aesir-utils.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the aesir-utils library.
#[derive(Error, Debug)]
pub enum Error {
    /// An argument is outside its valid range.
    #[error("invalid argument {name}: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// The value handed to the noise injector is not an image representation it understands.
    #[error("unsupported image type: {type_name}")]
    UnsupportedType { type_name: String },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to save an image file.
    #[error("failed to save image to {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to parse a font file.
    #[error("failed to load font from {path}: {source}")]
    FontLoad {
        path: PathBuf,
        #[source]
        source: ab_glyph::InvalidFont,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Shape mismatch between an array and the image it should become.
    #[error("shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    pub(crate) fn invalid_argument(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for aesir-utils operations.
pub type Result<T> = std::result::Result<T, Error>;
