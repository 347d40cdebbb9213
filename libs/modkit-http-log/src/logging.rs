use crate::body::LazyBody;
use crate::config::LoggingConfig;
use crate::headers::Headers;
use crate::logger::{LogLevel, PolicyLogger, TracingLogger};
use crate::policy::{ErrorFlow, Policy, RequestFlow};
use crate::redact::{Redactor, display_path};
use crate::request::{PipelineRequest, TimingMark};
use crate::response::{PipelineError, PipelineResponse};
use crate::summary::summarize_body;
use std::sync::Arc;

/// Warning emitted when a response carries no status code
pub const NO_RESPONSE_DATA: &str = "No response data available";

/// Pipeline stage that logs every exchange with sensitive values redacted.
///
/// Per request it writes an `-->` block on the way out and a `<--` block on the
/// way back, both tagged with the correlation id:
///
/// ```text
/// --> [4b1d...]
/// GET /items?api-version=2024-01-01&sig=REDACTED
/// Host: example.com
/// --> [END 4b1d...]
/// <-- [4b1d...] (42ms)
/// 200 OK
/// <-- [END 4b1d...]
/// ```
///
/// At debug level each block also lists the headers (values outside the
/// allow-list replaced by `REDACTED`) and a body summary. None of that work,
/// including reading the body, happens when debug is disabled.
#[derive(Clone)]
pub struct LoggingPolicy {
    redactor: Redactor,
    max_body_size: usize,
    correlation_header: Arc<str>,
    logger: Arc<dyn PolicyLogger>,
}

impl LoggingPolicy {
    /// Stage writing through [`TracingLogger`]
    #[must_use]
    pub fn new(config: &LoggingConfig) -> Self {
        Self::with_logger(config, Arc::new(TracingLogger::new()))
    }

    /// Stage writing through a caller-supplied logger
    #[must_use]
    pub fn with_logger(config: &LoggingConfig, logger: Arc<dyn PolicyLogger>) -> Self {
        Self {
            redactor: Redactor::from_config(config),
            max_body_size: config.max_body_size,
            correlation_header: Arc::from(config.correlation_header.as_str()),
            logger,
        }
    }

    fn log_response(
        &self,
        response: &PipelineResponse,
        error: Option<&(dyn std::error::Error + Send + Sync + 'static)>,
    ) {
        let request = response.request();
        let correlation_id = request.correlation_id(&self.correlation_header);

        match request.timing_mark() {
            Some(mark) => self
                .logger
                .info(&format!("<-- [{correlation_id}] ({}ms)", mark.elapsed_ms())),
            None => self.logger.info(&format!("<-- [{correlation_id}]")),
        }

        if let Some(error) = error {
            self.logger.warning(&error.to_string());
        }

        let Some(status) = response.status() else {
            self.logger.warning(NO_RESPONSE_DATA);
            self.logger.info(&format!("<-- [END {correlation_id}]"));
            return;
        };

        let status_line = format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );
        if status.as_u16() >= 400 {
            self.logger.warning(&status_line);
        } else {
            self.logger.info(&status_line);
        }

        if self.logger.enabled(LogLevel::Debug) {
            self.log_details(response.headers(), response.body_accessor());
        }

        self.logger.info(&format!("<-- [END {correlation_id}]"));
    }

    /// Redacted headers, one per line, then the body summary after a blank line
    fn log_details(&self, headers: &Headers, body: Option<&LazyBody>) {
        for (name, value) in self.redactor.redact_headers(headers).iter() {
            self.logger.debug(&format!("{name}: {value}"));
        }
        let summary = summarize_body(headers, body, self.max_body_size);
        self.logger.debug(&format!("\n{summary}"));
    }
}

impl Policy for LoggingPolicy {
    fn on_request(&self, mut request: PipelineRequest) -> RequestFlow {
        let correlation_id = request.correlation_id(&self.correlation_header).to_owned();

        let safe_url = match self.redactor.redact_url(request.url()) {
            Ok(url) => url,
            Err(err) => {
                self.logger
                    .warning(&format!("Failed to parse URL for request {correlation_id}: {err}"));
                return RequestFlow::Drop;
            }
        };

        self.logger.info(&format!("--> [{correlation_id}]"));
        self.logger
            .info(&format!("{} {}", request.method(), display_path(&safe_url)));
        self.logger
            .info(&format!("Host: {}", safe_url.host_str().unwrap_or("(none)")));

        if self.logger.enabled(LogLevel::Debug) {
            self.log_details(request.headers(), request.body_accessor());
        }

        self.logger.info(&format!("--> [END {correlation_id}]"));

        request.context_mut().insert(TimingMark::now());
        RequestFlow::Forward(request)
    }

    fn on_response(&self, response: PipelineResponse) -> PipelineResponse {
        self.log_response(&response, response.error().map(|error| &**error));
        response
    }

    fn on_error(&self, error: PipelineError) -> ErrorFlow {
        self.log_response(error.response(), Some(&**error.cause()));
        ErrorFlow::unhandled(error)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::testing::RecordingLogger;
    use bytes::Bytes;
    use http::{Method, StatusCode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    #[derive(Debug, thiserror::Error)]
    #[error("connection reset by peer")]
    struct Reset;

    fn policy(level: LogLevel) -> (LoggingPolicy, Arc<RecordingLogger>) {
        let logger = Arc::new(RecordingLogger::new(level));
        let policy = LoggingPolicy::with_logger(&LoggingConfig::default(), logger.clone());
        (policy, logger)
    }

    fn counting_body(text: &'static str) -> (LazyBody, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let body = LazyBody::deferred(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Some(Bytes::from_static(text.as_bytes()))
        });
        (body, calls)
    }

    fn request() -> PipelineRequest {
        PipelineRequest::new(
            Method::GET,
            "https://example.com/items/7?api-version=1&sig=secret#details",
        )
        .header("x-ms-client-request-id", "req-1")
        .header("Authorization", "Bearer token")
        .header("Accept", "application/json")
    }

    #[test]
    fn test_request_info_block() {
        let (policy, logger) = policy(LogLevel::Info);

        let flow = policy.on_request(request());

        let request = flow.into_request().expect("request must be forwarded");
        assert!(request.timing_mark().is_some());
        assert_eq!(
            logger.messages(),
            vec![
                "--> [req-1]",
                "GET /items/7?api-version=REDACTED&sig=REDACTED#details",
                "Host: example.com",
                "--> [END req-1]",
            ]
        );
        assert_eq!(logger.at(LogLevel::Info).len(), 4);
    }

    #[test]
    fn test_request_debug_block_redacts_headers() {
        let (policy, logger) = policy(LogLevel::Debug);
        let request = request()
            .header("Content-Type", "application/json")
            .header("Content-Length", "7")
            .body("{\"a\":1}");

        _ = policy.on_request(request);

        assert_eq!(
            logger.at(LogLevel::Debug),
            vec![
                "x-ms-client-request-id: req-1",
                "Authorization: REDACTED",
                "Accept: application/json",
                "Content-Type: application/json",
                "Content-Length: 7",
                "\n{\"a\":1}",
            ]
        );
        let messages = logger.messages();
        assert_eq!(messages.first().map(String::as_str), Some("--> [req-1]"));
        assert_eq!(messages.last().map(String::as_str), Some("--> [END req-1]"));
    }

    #[test]
    fn test_body_not_read_below_debug() {
        let (policy, logger) = policy(LogLevel::Info);
        let (body, calls) = counting_body("secret payload");
        let request = request().header("Content-Length", "14").body(body);

        _ = policy.on_request(request);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(logger.at(LogLevel::Debug).is_empty());
    }

    #[test]
    fn test_body_read_once_at_debug() {
        let (policy, _logger) = policy(LogLevel::Debug);
        let (body, calls) = counting_body("payload");
        let request = request().header("Content-Length", "7").body(body);

        _ = policy.on_request(request);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_correlation_id() {
        let (policy, logger) = policy(LogLevel::Info);

        _ = policy.on_request(PipelineRequest::new(Method::DELETE, "https://example.com"));

        let messages = logger.messages();
        assert_eq!(messages[0], "--> [(none)]");
        assert_eq!(messages[1], "DELETE /");
        assert_eq!(messages[3], "--> [END (none)]");
    }

    #[test]
    fn test_unparsable_url_is_dropped_with_single_warning() {
        let (policy, logger) = policy(LogLevel::Debug);
        let (body, calls) = counting_body("data");
        let request = PipelineRequest::new(Method::POST, "::not a url::")
            .header("Content-Length", "4")
            .body(body);

        let flow = policy.on_request(request);

        assert!(flow.is_drop());
        let lines = logger.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].0, LogLevel::Warning);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_response_with_timing_mark() {
        let (policy, logger) = policy(LogLevel::Info);
        let mut request = request();
        request
            .context_mut()
            .insert(TimingMark::at(Instant::now().checked_sub(Duration::from_millis(20)).unwrap()));

        let response = policy.on_response(PipelineResponse::new(request, StatusCode::OK));

        assert_eq!(response.status(), Some(StatusCode::OK));
        let messages = logger.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[0].starts_with("<-- [req-1] ("), "got {}", messages[0]);
        assert!(messages[0].ends_with("ms)"));
        assert_eq!(messages[1], "200 OK");
        assert_eq!(messages[2], "<-- [END req-1]");
    }

    #[test]
    fn test_response_without_timing_mark_omits_duration() {
        let (policy, logger) = policy(LogLevel::Info);

        _ = policy.on_response(PipelineResponse::new(request(), StatusCode::NO_CONTENT));

        assert_eq!(
            logger.messages(),
            vec!["<-- [req-1]", "204 No Content", "<-- [END req-1]"]
        );
    }

    #[test]
    fn test_error_status_logged_as_warning() {
        let (policy, logger) = policy(LogLevel::Info);

        _ = policy.on_response(PipelineResponse::new(request(), StatusCode::NOT_FOUND));

        assert_eq!(logger.at(LogLevel::Warning), vec!["404 Not Found"]);
        assert_eq!(logger.at(LogLevel::Info), vec!["<-- [req-1]", "<-- [END req-1]"]);
    }

    #[test]
    fn test_unknown_status_reason() {
        let (policy, logger) = policy(LogLevel::Info);
        let status = StatusCode::from_u16(299).unwrap();

        _ = policy.on_response(PipelineResponse::new(request(), status));

        assert_eq!(logger.messages()[1], "299 Unknown");
    }

    #[test]
    fn test_response_without_status() {
        let (policy, logger) = policy(LogLevel::Debug);
        let (body, calls) = counting_body("never");
        let response = PipelineResponse::without_status(request())
            .header("Content-Length", "5")
            .body(body);

        _ = policy.on_response(response);

        assert_eq!(
            logger.lines(),
            vec![
                (LogLevel::Info, "<-- [req-1]".to_owned()),
                (LogLevel::Warning, NO_RESPONSE_DATA.to_owned()),
                (LogLevel::Info, "<-- [END req-1]".to_owned()),
            ]
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_attached_error_logged_first() {
        let (policy, logger) = policy(LogLevel::Info);
        let response =
            PipelineResponse::new(request(), StatusCode::BAD_GATEWAY).with_error(Arc::new(Reset));

        let response = policy.on_response(response);

        assert!(response.error().is_some());
        assert_eq!(
            logger.lines(),
            vec![
                (LogLevel::Info, "<-- [req-1]".to_owned()),
                (LogLevel::Warning, "connection reset by peer".to_owned()),
                (LogLevel::Warning, "502 Bad Gateway".to_owned()),
                (LogLevel::Info, "<-- [END req-1]".to_owned()),
            ]
        );
    }

    #[test]
    fn test_response_debug_block() {
        let (policy, logger) = policy(LogLevel::Debug);
        let response = PipelineResponse::new(request(), StatusCode::OK)
            .header("Content-Type", "image/png")
            .header("Set-Cookie", "session=abc")
            .header("Content-Length", "100")
            .body("binary");

        _ = policy.on_response(response);

        assert_eq!(
            logger.at(LogLevel::Debug),
            vec![
                "Content-Type: image/png",
                "Set-Cookie: REDACTED",
                "Content-Length: 100",
                "\n(binary body omitted)",
            ]
        );
    }

    #[test]
    fn test_on_error_logs_and_never_handles() {
        let (policy, logger) = policy(LogLevel::Info);
        let mut request = request();
        request.context_mut().insert(TimingMark::now());
        let error = PipelineError::new(PipelineResponse::without_status(request), Arc::new(Reset));

        let flow = policy.on_error(error);

        assert!(!flow.handled);
        assert_eq!(flow.error.to_string(), "connection reset by peer");
        let lines = logger.lines();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].1.starts_with("<-- [req-1] ("));
        assert_eq!(lines[1], (LogLevel::Warning, "connection reset by peer".to_owned()));
        assert_eq!(lines[2], (LogLevel::Warning, NO_RESPONSE_DATA.to_owned()));
        assert_eq!(lines[3], (LogLevel::Info, "<-- [END req-1]".to_owned()));
    }

    #[test]
    fn test_allow_list_from_config() {
        let logger = Arc::new(RecordingLogger::new(LogLevel::Debug));
        let config = LoggingConfig::default()
            .allow_header("Authorization")
            .allow_query_param("sig")
            .with_correlation_header("x-request-id");
        let policy = LoggingPolicy::with_logger(&config, logger.clone());

        _ = policy.on_request(request().header("X-Request-Id", "custom"));

        let messages = logger.messages();
        assert_eq!(messages[0], "--> [custom]");
        assert_eq!(messages[1], "GET /items/7?api-version=REDACTED&sig=secret#details");
        assert!(messages.contains(&"Authorization: Bearer token".to_owned()));
    }
}
