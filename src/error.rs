//! Error types for image analysis and scoring configuration
//!
//! Only whole-call failures live here. Unreadable metadata is not an error:
//! the metadata stage turns it into a scoring signal (see
//! [`MetadataState::Unreadable`](crate::analyzer::metadata::MetadataState)).

use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single analysis call
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// No image content was supplied
    #[error("no image supplied")]
    MissingInput,

    /// The pixel stage could not decode the image
    #[error("could not decode {media_type} image: {source}")]
    ImageDecode {
        media_type: String,
        #[source]
        source: image::ImageError,
    },

    /// The image decoded but contains no pixels to measure
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// The call did not finish before the caller's deadline
    #[error("analysis did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    /// The worker running the call stopped without producing a result
    #[error("analysis was interrupted")]
    Interrupted,

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl AnalysisError {
    /// True when the pixel signal is missing because the image itself is bad.
    ///
    /// Callers must not treat this as a clean result.
    pub fn is_decode_failure(&self) -> bool {
        matches!(self, Self::ImageDecode { .. } | Self::EmptyImage { .. })
    }
}

/// Failure loading or validating a [`ScoringConfig`](crate::config::ScoringConfig)
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_failure_classification() {
        let decode = AnalysisError::ImageDecode {
            media_type: "image/png".to_string(),
            source: image::ImageError::IoError(io::Error::new(io::ErrorKind::UnexpectedEof, "eof")),
        };
        assert!(decode.is_decode_failure());
        assert!(AnalysisError::EmptyImage { width: 0, height: 0 }.is_decode_failure());

        assert!(!AnalysisError::MissingInput.is_decode_failure());
        assert!(!AnalysisError::DeadlineExceeded(Duration::from_secs(1)).is_decode_failure());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AnalysisError::MissingInput.to_string(), "no image supplied");
        assert_eq!(
            AnalysisError::EmptyImage { width: 0, height: 12 }.to_string(),
            "image has no pixels (0x12)"
        );

        let err = ConfigError::Invalid("tiers out of order".to_string());
        assert_eq!(err.to_string(), "invalid config: tiers out of order");
    }
}
