//! Error types for cardfetch
//!
//! A single crate-wide [`Error`] enum covers every failure class the pipeline
//! can see. Transient-vs-permanent classification (which drives retry) lives
//! in [`crate::retry`] as a match over these variants, so HTTP status codes
//! are carried explicitly in [`Error::Status`] rather than being re-parsed
//! out of error strings.

use thiserror::Error;

/// Result type alias for cardfetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cardfetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_fetches")
        key: Option<String>,
    },

    /// Network-level error (DNS, connect, timeout, body read)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-success HTTP status returned by the catalog or image host
    #[error("HTTP status {code}")]
    Status {
        /// The HTTP status code returned by the server
        code: u16,
    },

    /// The requested resource does not exist upstream (HTTP 404)
    ///
    /// This is a distinct signal from [`Error::Status`] because callers need
    /// to tell "collection does not exist" apart from other client errors:
    /// a 404 on the first catalog page yields an empty manifest, not a
    /// failed build.
    #[error("not found: {0}")]
    NotFound(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Completion log (de)serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Job ledger row (de)serialization error
    #[error("ledger format error: {0}")]
    Csv(#[from] csv::Error),

    /// Job ledger is structurally invalid (bad header, malformed row)
    #[error("ledger error: {0}")]
    Ledger(String),

    /// Manifest build failed (catalog pagination error other than not-found)
    #[error("manifest build error: {0}")]
    Manifest(String),

    /// Post-processing transform failed
    #[error("post-processing error: {0}")]
    PostProcess(String),

    /// The run was cancelled before this operation could start
    #[error("operation cancelled")]
    Cancelled,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_display_includes_code() {
        let err = Error::Status { code: 503 };
        assert_eq!(err.to_string(), "HTTP status 503");
    }

    #[test]
    fn not_found_display_includes_resource() {
        let err = Error::NotFound("collection 'xyz'".to_string());
        assert!(err.to_string().contains("collection 'xyz'"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn serde_json_error_converts_via_from() {
        let parse_err = serde_json::from_str::<String>("not json").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Serialization(_)));
    }
}
