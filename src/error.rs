//! Error types for m3u-mirror
//!
//! Only three conditions abort a run: bad configuration, an unreachable
//! source playlist, and a playlist that yields no channels. Everything that
//! goes wrong for a single logo is an [`AssetError`], which the mirror turns
//! into a [`MirrorOutcome::Failed`](crate::channel::MirrorOutcome::Failed)
//! value instead of propagating it.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for m3u-mirror operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for m3u-mirror
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "source_url")
        key: Option<String>,
    },

    /// The source playlist could not be fetched after every attempt
    #[error("failed to fetch playlist from {url} after {attempts} attempt(s): {message}")]
    Fetch {
        /// Source playlist URL
        url: String,
        /// Number of attempts made before giving up
        attempts: u32,
        /// Last error observed
        message: String,
    },

    /// The playlist was fetched but contained no usable channel entries
    #[error("no channels found in playlist from {source_url}")]
    EmptyPlaylist {
        /// Source playlist URL
        source_url: String,
    },

    /// A report file could not be found where it was expected
    #[error("report not found at {}", path.display())]
    ReportNotFound {
        /// Expected location of the report
        path: PathBuf,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for a [`Error::Config`] tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Pipeline stage the error belongs to, used in the CLI failure message
    pub fn stage(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config",
            Error::Fetch { .. } => "fetch",
            Error::EmptyPlaylist { .. } => "parse",
            Error::ReportNotFound { .. } => "analyze",
            Error::Io(_) | Error::Serialization(_) => "output",
        }
    }
}

/// Failure to mirror a single logo
///
/// Never fatal. Converted to a [`MirrorOutcome::Failed`](crate::channel::MirrorOutcome::Failed)
/// by the mirror stage.
#[derive(Debug, Error)]
pub enum AssetError {
    /// Server answered with a non-success status
    #[error("HTTP {status} for {url}")]
    Status {
        /// Logo URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Connection, timeout or body read failure
    #[error("request for {url} failed: {source}")]
    Network {
        /// Logo URL
        url: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// Writing the logo into the store failed
    #[error("failed to store {}: {source}", path.display())]
    Storage {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Anything else the fetcher wants to report
    #[error("{0}")]
    Other(String),
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fatal_variant_names_its_stage() {
        let cases = [
            (Error::config("source_url", "missing"), "config"),
            (
                Error::Fetch {
                    url: "http://x/list.m3u".into(),
                    attempts: 3,
                    message: "HTTP 500".into(),
                },
                "fetch",
            ),
            (
                Error::EmptyPlaylist {
                    source_url: "http://x/list.m3u".into(),
                },
                "parse",
            ),
            (
                Error::ReportNotFound {
                    path: PathBuf::from("output/stats.json"),
                },
                "analyze",
            ),
            (Error::Io(std::io::Error::other("disk full")), "output"),
        ];

        for (error, expected) in cases {
            assert_eq!(error.stage(), expected, "wrong stage for {error}");
        }
    }

    #[test]
    fn config_helper_records_the_key() {
        match Error::config("max_concurrent_downloads", "must be at least 1") {
            Error::Config { message, key } => {
                assert_eq!(message, "must be at least 1");
                assert_eq!(key.as_deref(), Some("max_concurrent_downloads"));
            }
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn fetch_error_message_mentions_url_and_attempts() {
        let err = Error::Fetch {
            url: "http://example.com/all.m3u".into(),
            attempts: 3,
            message: "HTTP 503".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("http://example.com/all.m3u"), "got: {msg}");
        assert!(msg.contains("3 attempt"), "got: {msg}");
        assert!(msg.contains("HTTP 503"), "got: {msg}");
    }

    #[test]
    fn asset_status_error_display() {
        let err = AssetError::Status {
            url: "http://x/a.png".into(),
            status: 404,
        };
        assert_eq!(err.to_string(), "HTTP 404 for http://x/a.png");
    }
}
