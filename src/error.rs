//! Error types for the auto-edit-mask crate.

use std::fmt;

/// Which of the two input images an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    /// The unedited source image.
    Original,
    /// The variant carrying the proposed edit.
    Proposed,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Original => f.write_str("original"),
            Self::Proposed => f.write_str("proposed"),
        }
    }
}

/// Errors that can occur while generating an edit mask or invoking an edit.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input bytes could not be decoded as a raster image.
    #[error("failed to decode {role} image: {source}")]
    Decode {
        /// Which input failed.
        role: ImageRole,
        /// Underlying codec error.
        source: image::ImageError,
    },

    /// An input image has a zero width or height.
    #[error("{role} image has empty dimensions ({width}x{height})")]
    EmptyImage {
        /// Which input is empty.
        role: ImageRole,
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },

    /// Original and proposed images are not the same size.
    #[error(
        "image dimensions do not match: original is {}x{}, proposed is {}x{}",
        .original.0, .original.1, .proposed.0, .proposed.1
    )]
    DimensionMismatch {
        /// Original `(width, height)`.
        original: (u32, u32),
        /// Proposed `(width, height)`.
        proposed: (u32, u32),
    },

    /// Inference step count outside the accepted `[10, 50]` range.
    #[error("step count {0} is outside the accepted range 10..=50")]
    InvalidSteps(u32),

    /// The edit service failed or returned something unusable.
    #[error("edit invocation failed: {0}")]
    Invoke(String),

    /// Transport-level failure talking to the edit service.
    #[cfg(feature = "remote")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (resample, encode, save).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let mismatch = Error::DimensionMismatch {
            original: (640, 480),
            proposed: (320, 240),
        };
        let msg = mismatch.to_string();
        assert!(msg.contains("640x480"));
        assert!(msg.contains("320x240"));

        let empty = Error::EmptyImage {
            role: ImageRole::Proposed,
            width: 0,
            height: 12,
        };
        let msg = empty.to_string();
        assert!(msg.contains("proposed"));
        assert!(msg.contains("0x12"));

        assert!(Error::InvalidSteps(70).to_string().contains("70"));
    }
}
