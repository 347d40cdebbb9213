//! Allow-list based redaction of header values and query parameter values.
//!
//! Only values are ever rewritten. Header names, query parameter names, the URL
//! path and the fragment are left exactly as the caller wrote them.

use crate::config::{AllowList, LoggingConfig, REDACTED};
use crate::error::HttpLogError;
use crate::headers::Headers;
use std::borrow::Cow;
use url::Url;

/// Replace the value of every header not in `allowed` with [`REDACTED`]
#[must_use]
pub fn redact_headers(headers: &Headers, allowed: &AllowList) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            if allowed.contains(name) {
                (name, value)
            } else {
                (name, REDACTED)
            }
        })
        .collect()
}

/// Parse `url` and replace the value of every query parameter not in `allowed`
/// with [`REDACTED`].
///
/// Parameter names keep their raw (still percent-encoded) form; membership is
/// tested against the decoded name. A parameter written without `=` gets one,
/// so `?flag` becomes `?flag=REDACTED` unless `flag` is allowed.
///
/// # Errors
/// Returns `HttpLogError::MalformedUrl` when `url` is not an absolute URL.
pub fn redact_query(url: &str, allowed: &AllowList) -> Result<Url, HttpLogError> {
    let mut parsed = Url::parse(url).map_err(|source| HttpLogError::MalformedUrl { source })?;

    if let Some(query) = parsed.query() {
        let redacted = query
            .split('&')
            .map(|pair| redact_pair(pair, allowed))
            .collect::<Vec<_>>()
            .join("&");
        parsed.set_query(Some(&redacted));
    }

    Ok(parsed)
}

fn redact_pair<'a>(pair: &'a str, allowed: &AllowList) -> Cow<'a, str> {
    if pair.is_empty() {
        return Cow::Borrowed(pair);
    }

    let raw_name = pair.split_once('=').map_or(pair, |(name, _)| name);
    let decoded = url::form_urlencoded::parse(raw_name.as_bytes())
        .next()
        .map(|(name, _)| name)
        .unwrap_or_default();

    if allowed.contains(&decoded) {
        Cow::Borrowed(pair)
    } else {
        Cow::Owned(format!("{raw_name}={REDACTED}"))
    }
}

/// Human-readable `path[?query][#fragment]` of a URL
#[must_use]
pub fn display_path(url: &Url) -> String {
    let mut path = url.path().to_owned();
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    path
}

/// Both allow-lists of a logging stage, frozen at construction
#[derive(Debug, Clone, Default)]
pub struct Redactor {
    headers: AllowList,
    query: AllowList,
}

impl Redactor {
    /// Redactor keeping values of the given header and query names
    #[must_use]
    pub fn new(headers: AllowList, query: AllowList) -> Self {
        Self { headers, query }
    }

    /// Redactor using the allow-lists of `config`
    #[must_use]
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self::new(config.header_allow_list(), config.query_allow_list())
    }

    #[must_use]
    pub fn redact_headers(&self, headers: &Headers) -> Headers {
        redact_headers(headers, &self.headers)
    }

    /// # Errors
    /// Returns `HttpLogError::MalformedUrl` when `url` cannot be parsed.
    pub fn redact_url(&self, url: &str) -> Result<Url, HttpLogError> {
        redact_query(url, &self.query)
    }
}
