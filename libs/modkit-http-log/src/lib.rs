#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Observability stages for `ModKit` HTTP client pipelines
//!
//! This crate provides two pluggable pipeline stages:
//! - [`LoggingPolicy`] - logs every request and response with
//!   - header values and query parameter values redacted unless allow-listed
//!   - per-request correlation id and round-trip duration
//!   - body summaries that never read compressed, non-inline, binary or
//!     oversized payloads
//! - [`CurlPolicy`] - logs each outgoing request as a reproducible `curl` command
//!
//! Stages implement the [`Policy`] trait and know nothing about the pipeline
//! that runs them. [`PolicyLayer`] mounts any policy into a `tower` stack.
//!
//! # Log levels
//!
//! Request/response summaries are written at info, failures and 4xx/5xx status
//! lines at warning. Headers, bodies and curl commands are written only at
//! debug; below debug they are never computed and bodies are never read.
//!
//! # Example
//!
//! ```ignore
//! use modkit_http_log::{CurlPolicy, LoggingConfig, LoggingPolicy, PolicyLayer};
//! use tower::ServiceBuilder;
//!
//! let config = LoggingConfig::default().allow_query_param("api-version");
//!
//! let service = ServiceBuilder::new()
//!     .layer(PolicyLayer::new(LoggingPolicy::new(&config)))
//!     .layer(PolicyLayer::new(CurlPolicy::new()))
//!     .service(transport);
//! ```

mod body;
mod config;
pub mod credential;
mod curl;
mod error;
mod headers;
mod layers;
mod logger;
mod logging;
mod policy;
pub mod redact;
mod request;
mod response;
pub mod summary;
#[cfg(test)]
mod testing;

pub use body::LazyBody;
pub use config::{
    AllowList, DEFAULT_ALLOWED_HEADERS, DEFAULT_ALLOWED_QUERY_PARAMS, DEFAULT_CORRELATION_HEADER,
    LoggingConfig, MAX_LOGGABLE_BODY_SIZE, NO_CORRELATION_ID, REDACTED,
};
pub use credential::{AccessToken, CredentialError, StaticTokenCredential, TokenCredential};
pub use curl::{CurlPolicy, to_curl};
pub use error::{HttpLogError, SharedError};
pub use headers::Headers;
pub use layers::{PolicyLayer, PolicyService};
pub use logger::{LOG_TARGET, LogLevel, PolicyLogger, TracingLogger};
pub use logging::{LoggingPolicy, NO_RESPONSE_DATA};
pub use policy::{ErrorFlow, Policy, RequestFlow};
pub use redact::{Redactor, redact_headers, redact_query};
pub use request::{PipelineRequest, TimingMark};
pub use response::{PipelineError, PipelineResponse};
pub use summary::summarize_body;
