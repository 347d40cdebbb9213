use crate::body::LazyBody;
use crate::headers::Headers;

pub const ENCODED_BODY_OMITTED: &str = "(encoded body omitted)";
pub const NON_INLINE_BODY_OMITTED: &str = "(non-inline body omitted)";
pub const BINARY_BODY_OMITTED: &str = "(binary body omitted)";
pub const EMPTY_BODY: &str = "(empty body)";

/// Decide what to print for a message body.
///
/// The decision is made from the headers first; `body` is only materialized
/// when the headers declare a positive length no larger than `max_size` and
/// nothing marks the payload as compressed, non-inline or binary. Rules are
/// evaluated in that order and the first match is final:
///
/// 1. `Content-Encoding` other than `identity` → `(encoded body omitted)`
/// 2. `Content-Disposition` other than `inline` → `(non-inline body omitted)`
/// 3. `Content-Type` `*octet-stream` or `image*` → `(binary body omitted)`
/// 4. `Content-Length` above `max_size` → `(<n>-byte body omitted)`
/// 5. positive `Content-Length` and non-empty text → the text itself
/// 6. otherwise `(empty body)`
#[must_use]
pub fn summarize_body(headers: &Headers, body: Option<&LazyBody>, max_size: usize) -> String {
    if has_non_default(headers, "content-encoding", "identity") {
        return ENCODED_BODY_OMITTED.to_owned();
    }
    if has_non_default(headers, "content-disposition", "inline") {
        return NON_INLINE_BODY_OMITTED.to_owned();
    }

    let content_type = headers
        .get("content-type")
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if content_type.ends_with("octet-stream") || content_type.starts_with("image") {
        return BINARY_BODY_OMITTED.to_owned();
    }

    let length = declared_length(headers);
    if length > max_size {
        return format!("({length}-byte body omitted)");
    }

    if length > 0
        && let Some(text) = body.and_then(LazyBody::text)
        && !text.is_empty()
    {
        return text;
    }

    EMPTY_BODY.to_owned()
}

/// `Content-Length` as declared; missing or non-numeric counts as zero
fn declared_length(headers: &Headers) -> usize {
    headers
        .get("content-length")
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(0)
}

fn has_non_default(headers: &Headers, name: &str, default: &str) -> bool {
    headers
        .get(name)
        .is_some_and(|value| !value.is_empty() && !value.eq_ignore_ascii_case(default))
}
