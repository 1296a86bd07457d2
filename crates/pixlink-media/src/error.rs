//! Codec error types.

use thiserror::Error;

/// Errors produced while decoding or encoding raster media.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The input could not be read or is not a recognized raster format.
    #[error("unsupported or unreadable media: {reason}")]
    UnsupportedFormat {
        /// What went wrong while reading the input.
        reason: String,
    },

    /// The source raster cannot be scaled to the panel.
    #[error("unsupported raster size: {width}x{height}")]
    UnsupportedSize {
        /// Source width in pixels.
        width: u32,
        /// Source height in pixels.
        height: u32,
    },
}

impl From<image::ImageError> for CodecError {
    fn from(err: image::ImageError) -> Self {
        CodecError::UnsupportedFormat {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for CodecError {
    fn from(err: std::io::Error) -> Self {
        CodecError::UnsupportedFormat {
            reason: err.to_string(),
        }
    }
}
