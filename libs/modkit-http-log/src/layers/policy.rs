use crate::error::{HttpLogError, SharedError};
use crate::policy::{Policy, RequestFlow};
use crate::request::PipelineRequest;
use crate::response::{PipelineError, PipelineResponse};
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::{BodyExt, Full};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Tower layer that runs a [`Policy`] around an HTTP service.
///
/// Bodies are buffered `Full<Bytes>`, so the request and response handed to the
/// policy carry ready bodies that cost nothing to materialize.
///
/// - `on_request` runs before the inner service; [`RequestFlow::Drop`] completes
///   the call with [`HttpLogError::RequestDropped`] without touching the inner
///   service.
/// - `on_response` runs on every response the inner service returns.
/// - `on_error` runs on inner service errors, which then surface as
///   [`HttpLogError::Transport`] with the original cause. A request a stage
///   edited into something `http` cannot carry goes the same way and surfaces
///   as [`HttpLogError::InvalidRequest`].
///
/// The original `http` parts are forwarded in both directions, so repeated
/// and non-UTF-8 header values pass through untouched unless a stage edits the
/// headers.
pub struct PolicyLayer<P> {
    policy: Arc<P>,
}

impl<P> Clone for PolicyLayer<P> {
    fn clone(&self) -> Self {
        Self {
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<P: Policy> PolicyLayer<P> {
    pub fn new(policy: P) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S, P> Layer<S> for PolicyLayer<P> {
    type Service = PolicyService<S, P>;

    fn layer(&self, inner: S) -> Self::Service {
        PolicyService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

/// Service produced by [`PolicyLayer`]
pub struct PolicyService<S, P> {
    inner: S,
    policy: Arc<P>,
}

impl<S: Clone, P> Clone for PolicyService<S, P> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            policy: Arc::clone(&self.policy),
        }
    }
}

impl<S, P> Service<Request<Full<Bytes>>> for PolicyService<S, P>
where
    S: Service<Request<Full<Bytes>>, Response = Response<Full<Bytes>>> + Clone + Send + 'static,
    S::Future: Send,
    S::Error: Into<Box<dyn std::error::Error + Send + Sync>> + Send,
    P: Policy + 'static,
{
    type Response = Response<Full<Bytes>>;
    type Error = HttpLogError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|err| HttpLogError::Transport(shared(err)))
    }

    fn call(&mut self, req: Request<Full<Bytes>>) -> Self::Future {
        // Swap so we call the instance that was poll_ready'd, leaving a fresh clone
        // for the next poll_ready cycle.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);
        let policy = Arc::clone(&self.policy);

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = collect(body).await;
            let request = PipelineRequest::from_parts(&parts, body);
            let snapshot = request.headers().clone();

            let RequestFlow::Forward(request) = policy.on_request(request) else {
                return Err(HttpLogError::RequestDropped);
            };

            let outgoing = match request.to_http_over(parts, &snapshot) {
                Ok(outgoing) => outgoing,
                Err(err) => {
                    let cause = report(&*policy, request, Arc::new(err));
                    return Err(HttpLogError::InvalidRequest(cause));
                }
            };

            let (parts, body) = match inner.call(outgoing).await {
                Ok(response) => response.into_parts(),
                Err(err) => {
                    let cause = report(&*policy, request, shared(err));
                    return Err(HttpLogError::Transport(cause));
                }
            };

            let body = collect(body).await;
            let response = PipelineResponse::from_parts(request, &parts, body);
            let snapshot = response.headers().clone();
            policy
                .on_response(response)
                .into_http_over(parts, &snapshot)
        })
    }
}

/// Hand a failed exchange to the policy and return the cause it passes on
fn report<P: Policy>(policy: &P, request: PipelineRequest, cause: SharedError) -> SharedError {
    let error = PipelineError::new(PipelineResponse::without_status(request), cause);
    let (_, cause) = policy.on_error(error).error.into_parts();
    cause
}

async fn collect(body: Full<Bytes>) -> Bytes {
    match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(never) => match never {},
    }
}

fn shared<E>(err: E) -> SharedError
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Arc::from(err.into())
}
