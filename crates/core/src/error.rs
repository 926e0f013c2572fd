//! Error types for extraction operations.
//!
//! This module defines the main error type [`ExtractError`]. The error
//! surface is deliberately small: a strategy that finds nothing is a
//! normal `None`, a site profile that turns out to be unusable is a
//! normal `None`, and parse problems inside a profile are collected as
//! [`crate::siteconfig::ParseDiagnostic`] values rather than raised.
//! Only a URL that defeats every strategy produces an error.

use std::time::Duration;
use thiserror::Error;

/// Main error type for article extraction operations.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Every extraction strategy produced empty content for this URL.
    #[error("could not extract article content from {url}")]
    ExtractionFailed { url: String },

    /// A URL could not be parsed or is missing required components.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A pagination fetch exceeded its deadline.
    #[error("page fetch timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// File I/O errors from a profile backing store.
    #[error("profile store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request errors from reqwest.
    ///
    /// Only available when the `fetch` feature is enabled.
    #[cfg(feature = "fetch")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ExtractError.
pub type Result<T> = std::result::Result<T, ExtractError>;
