use crate::body::LazyBody;
use crate::logger::{LogLevel, PolicyLogger, TracingLogger};
use crate::policy::{Policy, RequestFlow};
use crate::request::PipelineRequest;
use std::sync::Arc;

/// Render `request` as a `curl` command line that reproduces it.
///
/// Headers are emitted unredacted: this output is only produced at debug level
/// and is meant for a developer replaying the call by hand.
#[must_use]
pub fn to_curl(request: &PipelineRequest) -> String {
    let mut parts = vec![
        "curl".to_owned(),
        "-X".to_owned(),
        request.method().to_string(),
    ];

    let mut compressed = false;
    for (name, value) in request.headers().iter() {
        parts.push(format!("-H \"{name}: {}\"", escape_header_value(value)));
        if name.eq_ignore_ascii_case("accept-encoding") {
            compressed = true;
        }
    }

    if let Some(body) = request.body_accessor().and_then(LazyBody::text) {
        parts.push(format!("--data $'{}'", escape_body(&body)));
    }

    if compressed {
        parts.push("--compressed".to_owned());
    }

    parts.push(request.url().to_owned());
    parts.join(" ")
}

fn escape_header_value(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
    {
        Some(inner) => format!("\\\"{}\\\"", inner.replace('\\', "\\\\")),
        None => value.replace('\\', "\\\\"),
    }
}

fn escape_body(body: &str) -> String {
    body.replace('\n', "\\n").replace('\'', "\\'")
}

/// Pipeline stage that logs every outgoing request as a `curl` command.
///
/// Only active at debug level; otherwise the request is forwarded without any
/// formatting work. Never modifies or drops a request.
#[derive(Clone)]
pub struct CurlPolicy {
    logger: Arc<dyn PolicyLogger>,
}

impl Default for CurlPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl CurlPolicy {
    /// Stage writing through [`TracingLogger`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_logger(Arc::new(TracingLogger::new()))
    }

    /// Stage writing through a caller-supplied logger
    #[must_use]
    pub fn with_logger(logger: Arc<dyn PolicyLogger>) -> Self {
        Self { logger }
    }
}

impl Policy for CurlPolicy {
    fn on_request(&self, request: PipelineRequest) -> RequestFlow {
        if self.logger.enabled(LogLevel::Debug) {
            let command = to_curl(&request);
            self.logger
                .debug(&format!("+--- cURL ({})", request.url()));
            self.logger.debug(&command);
            self.logger
                .debug("+--- (copy and paste the above line to a terminal)");
        }
        RequestFlow::Forward(request)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::testing::RecordingLogger;
    use bytes::Bytes;
    use http::Method;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_simple_get() {
        let request = PipelineRequest::new(Method::GET, "https://example.com/items?x=1");
        assert_eq!(to_curl(&request), "curl -X GET https://example.com/items?x=1");
    }

    #[test]
    fn test_headers_in_order_and_compressed_before_url() {
        let request = PipelineRequest::new(Method::GET, "https://example.com/")
            .header("Accept-Encoding", "gzip")
            .header("Accept", "application/json");

        let command = to_curl(&request);

        assert_eq!(
            command,
            "curl -X GET -H \"Accept-Encoding: gzip\" -H \"Accept: application/json\" \
             --compressed https://example.com/"
        );
        assert_eq!(command.matches("--compressed").count(), 1);
    }

    #[test]
    fn test_quoted_header_value() {
        let request = PipelineRequest::new(Method::GET, "https://example.com/")
            .header("If-Match", "\"quoted\"")
            .header("X-Path", "\"C:\\dir\"");

        let command = to_curl(&request);

        assert!(command.contains(r#"-H "If-Match: \"quoted\"""#), "{command}");
        assert!(command.contains(r#"-H "X-Path: \"C:\\dir\"""#), "{command}");
    }

    #[test]
    fn test_unquoted_backslashes_doubled() {
        let request = PipelineRequest::new(Method::GET, "https://example.com/")
            .header("X-Domain-User", "CORP\\alice")
            .header("X-Quote", "\"");

        let command = to_curl(&request);

        assert!(command.contains(r#"-H "X-Domain-User: CORP\\alice""#), "{command}");
        assert!(command.contains(r#"-H "X-Quote: """#), "{command}");
    }

    #[test]
    fn test_body_escaping_and_position() {
        let request = PipelineRequest::new(Method::POST, "https://example.com/notes")
            .header("Content-Type", "text/plain")
            .header("accept-encoding", "br")
            .body("it's\nfine");

        assert_eq!(
            to_curl(&request),
            "curl -X POST -H \"Content-Type: text/plain\" -H \"accept-encoding: br\" \
             --data $'it\\'s\\nfine' --compressed https://example.com/notes"
        );
    }

    #[test]
    fn test_present_empty_body_emits_data() {
        let request = PipelineRequest::new(Method::POST, "https://example.com/").body("");
        assert_eq!(
            to_curl(&request),
            "curl -X POST --data $'' https://example.com/"
        );
    }

    #[test]
    fn test_unavailable_body_omits_data() {
        let request = PipelineRequest::new(Method::PUT, "https://example.com/")
            .body(LazyBody::deferred(|| None));
        assert_eq!(to_curl(&request), "curl -X PUT https://example.com/");
    }

    #[test]
    fn test_policy_logs_three_debug_lines() {
        let logger = Arc::new(RecordingLogger::new(LogLevel::Debug));
        let policy = CurlPolicy::with_logger(logger.clone());
        let request = PipelineRequest::new(Method::GET, "https://example.com/a");

        let flow = policy.on_request(request);

        assert_eq!(flow.into_request().unwrap().url(), "https://example.com/a");
        assert_eq!(
            logger.at(LogLevel::Debug),
            vec![
                "+--- cURL (https://example.com/a)",
                "curl -X GET https://example.com/a",
                "+--- (copy and paste the above line to a terminal)",
            ]
        );
    }

    #[test]
    fn test_policy_is_noop_below_debug() {
        let logger = Arc::new(RecordingLogger::new(LogLevel::Info));
        let policy = CurlPolicy::with_logger(logger.clone());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let request = PipelineRequest::new(Method::POST, "https://example.com/")
            .body(LazyBody::deferred(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(Bytes::from_static(b"x"))
            }));

        let flow = policy.on_request(request);

        assert!(!flow.is_drop());
        assert!(logger.lines().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
