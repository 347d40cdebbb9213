//! Pipeline stage interface.
//!
//! A stage sees a request on its way out and the matching response (or error)
//! on its way back. Chaining stages and executing the transport belong to the
//! pipeline; a stage only decides what to hand on. The hook's return value *is*
//! the continuation, so every hook continues exactly once or, for requests,
//! explicitly stops the exchange.

use crate::request::PipelineRequest;
use crate::response::{PipelineError, PipelineResponse};

/// Outcome of [`Policy::on_request`]
#[derive(Debug)]
#[must_use]
pub enum RequestFlow {
    /// Hand the (possibly modified) request to the next stage
    Forward(PipelineRequest),
    /// End the exchange here; no later stage and no transport sees the request
    Drop,
}

impl RequestFlow {
    /// The forwarded request, if any
    #[must_use]
    pub fn into_request(self) -> Option<PipelineRequest> {
        match self {
            RequestFlow::Forward(request) => Some(request),
            RequestFlow::Drop => None,
        }
    }

    #[must_use]
    pub fn is_drop(&self) -> bool {
        matches!(self, RequestFlow::Drop)
    }
}

/// Outcome of [`Policy::on_error`]
#[derive(Debug)]
#[must_use]
pub struct ErrorFlow {
    pub error: PipelineError,
    /// `true` when the stage resolved the error and the pipeline should stop
    /// propagating it
    pub handled: bool,
}

impl ErrorFlow {
    /// Pass the error on untouched
    pub fn unhandled(error: PipelineError) -> Self {
        Self {
            error,
            handled: false,
        }
    }
}

/// A pluggable request/response pipeline stage.
///
/// Implementations must be shareable across concurrently running exchanges;
/// per-request state belongs in the request's context bag, not in the stage.
pub trait Policy: Send + Sync {
    /// Called once per request on its way to the transport
    fn on_request(&self, request: PipelineRequest) -> RequestFlow {
        RequestFlow::Forward(request)
    }

    /// Called once per response on its way back to the caller
    fn on_response(&self, response: PipelineResponse) -> PipelineResponse {
        response
    }

    /// Called once per failed exchange on its way back to the caller
    fn on_error(&self, error: PipelineError) -> ErrorFlow {
        ErrorFlow::unhandled(error)
    }
}

impl<P: Policy + ?Sized> Policy for std::sync::Arc<P> {
    fn on_request(&self, request: PipelineRequest) -> RequestFlow {
        (**self).on_request(request)
    }

    fn on_response(&self, response: PipelineResponse) -> PipelineResponse {
        (**self).on_response(response)
    }

    fn on_error(&self, error: PipelineError) -> ErrorFlow {
        (**self).on_error(error)
    }
}
