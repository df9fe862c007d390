//! Error types for perfmatters-gen

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while generating or fetching configurations
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid URL provided
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Failed to create HTTP client
    #[error("failed to create HTTP client: {0}")]
    HttpClient(String),

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpRequest(String),

    /// HTTP response error status
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),

    /// Rule file could not be read
    #[error("failed to read rule file '{path}': {source}")]
    RuleFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Rule file is not valid JSON or has the wrong shape
    #[error("invalid rule file '{path}': {message}")]
    RuleFileInvalid { path: String, message: String },

    /// Request body failed validation
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Generator API is unreachable or unhealthy
    #[error("generator API unreachable at {url}: {reason}")]
    ApiUnreachable { url: String, reason: String },

    /// Generator API returned an error response
    #[error("generator API error: {0}")]
    ApiError(String),

    /// WP-CLI invocation failed
    #[error("wp-cli failed: {0}")]
    WpCli(String),

    /// Invalid output format specified
    #[error("invalid output format: '{0}' (valid: human, json, none)")]
    InvalidOutputFormat(String),

    /// Output operation failed
    #[error("output failed: {0}")]
    OutputFailed(#[source] std::io::Error),

    /// Failed to bind or serve the HTTP listener
    #[error("server failed: {0}")]
    Server(#[source] std::io::Error),

    /// JSON serialization failed
    #[error("JSON serialization failed")]
    SerializationFailed(#[from] serde_json::Error),
}
