//! Compositing error types.
//!
//! Both errors here are absorbed before they reach a caller: asset
//! failures fall back to the drawn marker shape, and compositing failures
//! fall back to the unmodified base image. They exist as types so the
//! absorption points can log what actually went wrong.

use thiserror::Error;

/// Failure to produce a marker icon image.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The asset file is not where the loader expected it.
    #[error("icon asset not found: {0}")]
    NotFound(String),
    /// The asset file exists but could not be read.
    #[error("icon asset unreadable: {0}")]
    Io(#[from] std::io::Error),
    /// The asset bytes are not a decodable image.
    #[error("icon asset undecodable: {0}")]
    Decode(#[from] image::ImageError),
}

/// Failure inside the compositing pipeline itself.
#[derive(Debug, Error)]
pub enum ComposeError {
    /// The base image bytes did not decode.
    #[error("base image decode failed: {0}")]
    Decode(#[source] image::ImageError),
    /// The composited surface did not re-encode.
    #[error("composited image encode failed: {0}")]
    Encode(#[source] image::ImageError),
}
