use bytes::Bytes;
use std::fmt;
use std::sync::Arc;

type Loader = Arc<dyn Fn() -> Option<Bytes> + Send + Sync>;

#[derive(Clone)]
enum Source {
    Ready(Bytes),
    Deferred(Loader),
}

/// Lazily materialized message body.
///
/// Constructing or cloning a `LazyBody` never touches the payload. Deferred
/// bodies run their loader on every [`materialize`](Self::materialize) call, so
/// callers are expected to materialize at most once per hook; ready bodies are
/// backed by reference-counted [`Bytes`] and cost nothing to materialize.
#[derive(Clone)]
pub struct LazyBody {
    source: Source,
}

impl LazyBody {
    /// Body whose bytes are already in memory
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        Self {
            source: Source::Ready(bytes.into()),
        }
    }

    /// Body produced on demand by `loader` (decoding, IO, ...).
    ///
    /// `None` from the loader means the body is unavailable.
    pub fn deferred<F>(loader: F) -> Self
    where
        F: Fn() -> Option<Bytes> + Send + Sync + 'static,
    {
        Self {
            source: Source::Deferred(Arc::new(loader)),
        }
    }

    /// Produce the body bytes
    #[must_use]
    pub fn materialize(&self) -> Option<Bytes> {
        match &self.source {
            Source::Ready(bytes) => Some(bytes.clone()),
            Source::Deferred(loader) => loader(),
        }
    }

    /// Produce the body as text (invalid UTF-8 is replaced)
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.materialize()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Bytes already held in memory, without running a deferred loader
    #[must_use]
    pub fn ready_bytes(&self) -> Option<&Bytes> {
        match &self.source {
            Source::Ready(bytes) => Some(bytes),
            Source::Deferred(_) => None,
        }
    }
}

impl fmt::Debug for LazyBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Source::Ready(bytes) => f
                .debug_struct("LazyBody")
                .field("ready_len", &bytes.len())
                .finish(),
            Source::Deferred(_) => f.debug_struct("LazyBody").finish_non_exhaustive(),
        }
    }
}

impl From<Bytes> for LazyBody {
    fn from(bytes: Bytes) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<&'static str> for LazyBody {
    fn from(text: &'static str) -> Self {
        Self::from_bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for LazyBody {
    fn from(text: String) -> Self {
        Self::from_bytes(Bytes::from(text))
    }
}
