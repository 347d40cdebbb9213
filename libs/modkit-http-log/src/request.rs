use crate::body::LazyBody;
use crate::config::NO_CORRELATION_ID;
use crate::error::HttpLogError;
use crate::headers::Headers;
use bytes::Bytes;
use http::header::CONTENT_LENGTH;
use http::request::Parts;
use http::{Extensions, Method, Request};
use http_body_util::Full;
use std::time::{Duration, Instant};

/// Monotonic instant stamped on a request when it enters the logging stage.
///
/// Carried in the request's [`Extensions`] so it survives the round trip to the
/// transport and back without any shared state in the stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimingMark(Instant);

impl TimingMark {
    #[must_use]
    pub fn now() -> Self {
        Self(Instant::now())
    }

    #[must_use]
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.0.elapsed()
    }

    /// Whole milliseconds since the mark
    #[must_use]
    pub fn elapsed_ms(&self) -> u128 {
        self.elapsed().as_millis()
    }
}

/// Outbound request as seen by pipeline stages.
///
/// The URL is kept as the caller's raw string: it is only parsed by stages that
/// need its structure, and a stage may refuse a URL it cannot parse.
#[derive(Debug, Clone)]
pub struct PipelineRequest {
    method: Method,
    url: String,
    headers: Headers,
    body: Option<LazyBody>,
    context: Extensions,
}

impl PipelineRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            context: Extensions::new(),
        }
    }

    /// Builder-style header insertion (last write wins)
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<LazyBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn body_accessor(&self) -> Option<&LazyBody> {
        self.body.as_ref()
    }

    /// Out-of-band context bag preserved across the round trip
    #[must_use]
    pub fn context(&self) -> &Extensions {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Extensions {
        &mut self.context
    }

    /// Correlation id from `header`, or `"(none)"`
    #[must_use]
    pub fn correlation_id(&self, header: &str) -> &str {
        self.headers.get(header).unwrap_or(NO_CORRELATION_ID)
    }

    /// Timing mark stamped on entry, if any
    #[must_use]
    pub fn timing_mark(&self) -> Option<&TimingMark> {
        self.context.get::<TimingMark>()
    }

    /// Snapshot the parts of an `http` request whose body has already been buffered.
    ///
    /// A zero-length body counts as present only when the request declares a
    /// `Content-Length`.
    #[must_use]
    pub fn from_parts(parts: &Parts, body: Bytes) -> Self {
        let declared = parts.headers.contains_key(CONTENT_LENGTH);
        Self {
            method: parts.method.clone(),
            url: parts.uri.to_string(),
            headers: Headers::from_header_map(&parts.headers),
            body: (declared || !body.is_empty()).then(|| LazyBody::from_bytes(body)),
            context: parts.extensions.clone(),
        }
    }

    /// Build a standalone `http` request, carrying the context bag along.
    ///
    /// # Errors
    /// Returns `HttpLogError::InvalidUri` or a header error when the request
    /// cannot be represented with `http` types.
    pub fn to_http(&self) -> Result<Request<Full<Bytes>>, HttpLogError> {
        let (parts, ()) = Request::new(()).into_parts();
        self.to_http_over(parts, &Headers::new())
    }

    /// Rebuild an `http` request on top of the `parts` it was snapshotted from.
    ///
    /// The original header map is forwarded untouched unless the headers differ
    /// from `snapshot`, so repeated and non-UTF-8 values survive. Ready bodies
    /// are moved over without copying; a deferred body is materialized here.
    ///
    /// # Errors
    /// Returns `HttpLogError::InvalidUri` or a header error when a changed URL or
    /// header cannot be represented with `http` types.
    pub fn to_http_over(
        &self,
        mut parts: Parts,
        snapshot: &Headers,
    ) -> Result<Request<Full<Bytes>>, HttpLogError> {
        if parts.uri != self.url.as_str() {
            parts.uri = self.url.parse()?;
        }
        if self.headers != *snapshot {
            parts.headers = self.headers.to_header_map()?;
        }
        parts.method = self.method.clone();
        parts.extensions = self.context.clone();

        let body = self
            .body
            .as_ref()
            .and_then(LazyBody::materialize)
            .unwrap_or_default();
        Ok(Request::from_parts(parts, Full::new(body)))
    }
}
