use std::sync::Arc;
use thiserror::Error;

/// Shared, type-erased error attached to responses flowing back through the pipeline.
///
/// `Arc` rather than `Box` so a response (and its error) can be cloned by stages
/// that need to keep a copy while forwarding the original.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Errors produced by the logging stages and the tower adapter
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpLogError {
    /// Request URL could not be parsed into components.
    ///
    /// The raw URL is intentionally not part of the message: it is exactly the
    /// kind of input that may carry credentials in its query string.
    #[error("Malformed request URL: {source}")]
    MalformedUrl {
        #[source]
        source: url::ParseError,
    },

    /// Invalid header name when converting to `http` types
    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    /// Invalid header value when converting to `http` types
    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    /// URL accepted by the pipeline but rejected by `http::Uri`
    #[error("Invalid URI: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    /// A response without a status code cannot be turned back into `http::Response`
    #[error("Response has no status code")]
    MissingStatus,

    /// A stage refused to forward the request
    #[error("Request dropped by pipeline stage")]
    RequestDropped,

    /// Request edited by a stage into something `http` types cannot carry
    #[error("Request cannot be sent: {0}")]
    InvalidRequest(#[source] SharedError),

    /// Transport error reported by the inner service
    #[error("Transport error: {0}")]
    Transport(#[source] SharedError),
}
