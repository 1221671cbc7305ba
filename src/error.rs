//! Error types for the msrc-bulletins crate.
//!
//! This module provides the crate-wide error type [`BulletinError`]. Per-period
//! and per-row failures are recovered locally by the aggregator and resolvers;
//! only [`BulletinError::Config`] is expected to abort a run.

use std::io;

/// The main error type for all operations in this crate.
#[derive(Debug, thiserror::Error)]
pub enum BulletinError {
    /// A period token could not be parsed into a calendar month.
    ///
    /// Callers skip the offending entry; this is never fatal on its own.
    #[error("malformed period identifier '{raw}': {message}")]
    MalformedPeriodId {
        /// The token as supplied.
        raw: String,
        /// Why parsing failed.
        message: String,
    },

    /// Failed to fetch bulletin data from a source for a given period/request.
    #[error("source '{source_name}' fetch failed: {message}")]
    SourceFetch {
        /// Name of the source that failed (e.g., "MSRC").
        source_name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Invocation-level configuration error (missing or invalid inputs).
    ///
    /// This is the only error class that should terminate an aggregation run;
    /// it is kept distinguishable from an empty result so automated callers
    /// can tell "nothing found" apart from "invalid invocation".
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (file operations, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A specialized Result type for bulletin operations.
pub type Result<T> = std::result::Result<T, BulletinError>;

impl BulletinError {
    /// Create a new malformed-period error.
    pub fn malformed_period(raw: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedPeriodId {
            raw: raw.into(),
            message: message.into(),
        }
    }

    /// Create a new source fetch error.
    pub fn source_fetch(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceFetch {
            source_name: source.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check if this error is recoverable by skipping the current period.
    pub fn is_skippable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}
