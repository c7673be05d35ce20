//! Error types for the watermark pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, drawing or converting.
///
/// Payloads are plain strings so the error is `Clone`: a pending result is
/// shared between every observer of a façade and each one receives a copy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Failed to fetch or read a resource
    #[error("Failed to load resource: {0}")]
    LoadError(String),

    /// Resource bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    DecodeError(String),

    /// Network error while fetching a URL
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The draw function failed, panicked or was given the wrong canvases
    #[error("Draw function failed: {0}")]
    DrawError(String),

    /// Data URL was malformed or a canvas could not be encoded
    #[error("Conversion failed: {0}")]
    ConversionError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::Encoding(e) => Error::ConversionError(e.to_string()),
            other => Error::DecodeError(other.to_string()),
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::ConversionError(format!("invalid base64 payload: {}", err))
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::NetworkError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("pipeline task failed: {}", err))
    }
}
