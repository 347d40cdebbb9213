use crate::body::LazyBody;
use crate::error::{HttpLogError, SharedError};
use crate::headers::Headers;
use crate::request::PipelineRequest;
use bytes::Bytes;
use http::response::Parts;
use http::{Response, StatusCode};
use http_body_util::Full;
use thiserror::Error;

/// Inbound response as seen by pipeline stages.
///
/// A response always remembers the request it answers (including the request's
/// context bag). `status` is `None` when the transport produced no HTTP
/// response at all, e.g. the connection failed before any bytes arrived.
#[derive(Debug, Clone)]
pub struct PipelineResponse {
    request: PipelineRequest,
    status: Option<StatusCode>,
    headers: Headers,
    error: Option<SharedError>,
    body: Option<LazyBody>,
}

impl PipelineResponse {
    /// Response with a status line
    #[must_use]
    pub fn new(request: PipelineRequest, status: StatusCode) -> Self {
        Self {
            request,
            status: Some(status),
            headers: Headers::new(),
            error: None,
            body: None,
        }
    }

    /// Placeholder for an exchange that never produced a response
    #[must_use]
    pub fn without_status(request: PipelineRequest) -> Self {
        Self {
            request,
            status: None,
            headers: Headers::new(),
            error: None,
            body: None,
        }
    }

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

    /// Attach an upstream error; it is reported, never replaced
    #[must_use]
    pub fn with_error(mut self, error: SharedError) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn request(&self) -> &PipelineRequest {
        &self.request
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    #[must_use]
    pub fn error(&self) -> Option<&SharedError> {
        self.error.as_ref()
    }

    #[must_use]
    pub fn body_accessor(&self) -> Option<&LazyBody> {
        self.body.as_ref()
    }

    /// Pair a buffered `http` response with the request that produced it
    #[must_use]
    pub fn from_parts(request: PipelineRequest, parts: &Parts, body: Bytes) -> Self {
        Self {
            request,
            status: Some(parts.status),
            headers: Headers::from_header_map(&parts.headers),
            error: None,
            body: (!body.is_empty()).then(|| LazyBody::from_bytes(body)),
        }
    }

    /// Build a standalone `http` response.
    ///
    /// # Errors
    /// Returns `HttpLogError::MissingStatus` for a response without status, or a
    /// header error when a header cannot be represented with `http` types.
    pub fn into_http(self) -> Result<Response<Full<Bytes>>, HttpLogError> {
        let (parts, ()) = Response::new(()).into_parts();
        self.into_http_over(parts, &Headers::new())
    }

    /// Rebuild an `http` response on top of the `parts` it was snapshotted from.
    ///
    /// The original header map is kept unless the headers differ from
    /// `snapshot`.
    ///
    /// # Errors
    /// Same as [`PipelineResponse::into_http`].
    pub fn into_http_over(
        self,
        mut parts: Parts,
        snapshot: &Headers,
    ) -> Result<Response<Full<Bytes>>, HttpLogError> {
        parts.status = self.status.ok_or(HttpLogError::MissingStatus)?;
        if self.headers != *snapshot {
            parts.headers = self.headers.to_header_map()?;
        }
        let body = self
            .body
            .as_ref()
            .and_then(LazyBody::materialize)
            .unwrap_or_default();
        Ok(Response::from_parts(parts, Full::new(body)))
    }
}

/// Failure travelling back through the pipeline.
///
/// Carries whatever response data exists for the exchange plus the underlying
/// cause. Stages observe it and hand it on; see [`ErrorFlow`](crate::ErrorFlow).
#[derive(Debug, Error)]
#[error("{cause}")]
pub struct PipelineError {
    response: PipelineResponse,
    #[source]
    cause: SharedError,
}

impl PipelineError {
    #[must_use]
    pub fn new(response: PipelineResponse, cause: SharedError) -> Self {
        Self { response, cause }
    }

    #[must_use]
    pub fn response(&self) -> &PipelineResponse {
        &self.response
    }

    #[must_use]
    pub fn cause(&self) -> &SharedError {
        &self.cause
    }

    #[must_use]
    pub fn into_parts(self) -> (PipelineResponse, SharedError) {
        (self.response, self.cause)
    }
}
