use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Marker substituted for every value that is not allow-listed
pub const REDACTED: &str = "REDACTED";

/// Largest declared body (in bytes) whose text is written to the log (16 KiB)
pub const MAX_LOGGABLE_BODY_SIZE: usize = 16 * 1024;

/// Request header carrying the client-generated correlation id
pub const DEFAULT_CORRELATION_HEADER: &str = "x-ms-client-request-id";

/// Placeholder used in log lines when a request carries no correlation id
pub const NO_CORRELATION_ID: &str = "(none)";

/// Header names whose values are safe to log as-is.
///
/// Tracing and correlation ids, caching and conditional-request headers,
/// content metadata, connection metadata, `User-Agent`, `Server` and
/// `Retry-After`. Everything else is treated as potentially sensitive.
pub const DEFAULT_ALLOWED_HEADERS: &[&str] = &[
    "traceparent",
    "accept",
    "cache-control",
    "x-ms-client-request-id",
    "x-ms-request-id",
    "x-ms-return-client-request-id",
    "connection",
    "content-length",
    "content-type",
    "date",
    "etag",
    "expires",
    "if-match",
    "if-modified-since",
    "if-none-match",
    "if-unmodified-since",
    "last-modified",
    "pragma",
    "retry-after",
    "server",
    "transfer-encoding",
    "user-agent",
];

/// Query parameter names whose values are safe to log as-is (none by default)
pub const DEFAULT_ALLOWED_QUERY_PARAMS: &[&str] = &[];

/// Immutable, case-insensitive set of names exempt from redaction.
///
/// Names are lower-cased once at construction; the set is shared behind an
/// `Arc` so cloning a policy never copies it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    names: Arc<HashSet<String>>,
}

impl AllowList {
    /// Build an allow-list from arbitrary-case names
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| name.as_ref().to_ascii_lowercase())
            .collect();
        Self {
            names: Arc::new(names),
        }
    }

    /// Case-insensitive membership test
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Configuration of the logging stage.
///
/// `LoggingConfig::default()` is the documented preset: [`DEFAULT_ALLOWED_HEADERS`],
/// no allowed query parameters, [`MAX_LOGGABLE_BODY_SIZE`] and
/// [`DEFAULT_CORRELATION_HEADER`]. Missing fields fall back to the preset when
/// deserializing, so host applications can embed a partial section in their
/// own config files.
///
/// # Example
///
/// ```ignore
/// use modkit_http_log::{LoggingConfig, LoggingPolicy};
///
/// let config = LoggingConfig::default()
///     .allow_header("x-tenant-id")
///     .allow_query_param("api-version");
/// let policy = LoggingPolicy::new(&config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Header names logged unredacted (case-insensitive)
    pub allowed_headers: Vec<String>,

    /// Query parameter names logged unredacted (case-insensitive)
    pub allowed_query_params: Vec<String>,

    /// Bodies declaring a larger `Content-Length` are never read (default: 16 KiB)
    pub max_body_size: usize,

    /// Request header that carries the correlation id
    pub correlation_header: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            allowed_headers: DEFAULT_ALLOWED_HEADERS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            allowed_query_params: DEFAULT_ALLOWED_QUERY_PARAMS
                .iter()
                .map(|name| (*name).to_owned())
                .collect(),
            max_body_size: MAX_LOGGABLE_BODY_SIZE,
            correlation_header: DEFAULT_CORRELATION_HEADER.to_owned(),
        }
    }
}

impl LoggingConfig {
    /// Add a header to the allow-list
    #[must_use]
    pub fn allow_header(mut self, name: impl Into<String>) -> Self {
        self.allowed_headers.push(name.into());
        self
    }

    /// Add a query parameter to the allow-list
    #[must_use]
    pub fn allow_query_param(mut self, name: impl Into<String>) -> Self {
        self.allowed_query_params.push(name.into());
        self
    }

    #[must_use]
    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    #[must_use]
    pub fn with_correlation_header(mut self, header: impl Into<String>) -> Self {
        self.correlation_header = header.into();
        self
    }

    /// Frozen header allow-list
    #[must_use]
    pub fn header_allow_list(&self) -> AllowList {
        AllowList::new(&self.allowed_headers)
    }

    /// Frozen query parameter allow-list
    #[must_use]
    pub fn query_allow_list(&self) -> AllowList {
        AllowList::new(&self.allowed_query_params)
    }
}
