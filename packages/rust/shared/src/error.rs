//! Error types for ClarifyMD.
//!
//! Library crates use [`ClarifyError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Failures of a single language-model gateway call.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The configured base URL could not be turned into a request URL.
    #[error("invalid API endpoint '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    /// The provider answered, but without any candidate text.
    #[error("empty or unexpected API response")]
    EmptyResponse,

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Transport-level failure (connect, TLS, read), forwarded as-is.
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Non-success HTTP status. The body is kept for diagnostics.
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected envelope.
    #[error("failed to decode API response: {source} (body: {body})")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level error type for all ClarifyMD operations.
#[derive(Debug, thiserror::Error)]
pub enum ClarifyError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Language-model gateway error.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Input validation error (empty text, unreadable source, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The orchestrator task is no longer running.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ClarifyError>;

impl ClarifyError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ClarifyError::config("missing base url");
        assert_eq!(err.to_string(), "config error: missing base url");

        let err = ClarifyError::validation("input text is empty");
        assert!(err.to_string().contains("input text is empty"));
    }

    #[test]
    fn gateway_error_is_transparent() {
        let err: ClarifyError = GatewayError::EmptyResponse.into();
        assert_eq!(err.to_string(), "empty or unexpected API response");
    }

    #[test]
    fn decode_error_keeps_raw_body() {
        let source = serde_json::from_str::<serde_json::Value>("{oops").unwrap_err();
        let err = GatewayError::Decode {
            body: "{oops".into(),
            source,
        };
        assert!(err.to_string().contains("(body: {oops)"));
    }
}
