use crate::error::HttpLogError;
use http::HeaderMap;
use http::header::{HeaderName, HeaderValue};

/// Ordered header collection with case-insensitive names.
///
/// Unlike [`http::HeaderMap`], the name is stored exactly as written so log
/// output and curl commands show the caller's casing. Inserting a name that is
/// already present (in any casing) replaces that entry in place: last write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a header
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(index) => self.entries[index] = (name, value),
            None => self.entries.push((name, value)),
        }
    }

    /// Case-insensitive lookup
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .map(|index| self.entries[index].1.as_str())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Remove a header, returning its value
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .map(|index| self.entries.remove(index).1)
    }

    /// Iterate `(name, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot an [`http::HeaderMap`] for stages to read.
    ///
    /// Repeated values for one name are combined with `", "`. Values that are not
    /// valid UTF-8 are decoded lossily. The snapshot is a view only: the original
    /// map is what gets forwarded unless a stage edits the headers.
    #[must_use]
    pub fn from_header_map(map: &HeaderMap) -> Self {
        let mut headers = Self::new();
        for name in map.keys() {
            let combined = map
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            headers.insert(name.as_str(), combined);
        }
        headers
    }

    /// Build an [`http::HeaderMap`] from these entries.
    ///
    /// # Errors
    /// Returns `HttpLogError::InvalidHeaderName` / `InvalidHeaderValue` when an
    /// entry is not a legal HTTP header.
    pub fn to_header_map(&self) -> Result<HeaderMap, HttpLogError> {
        let mut map = HeaderMap::with_capacity(self.entries.len());
        for (name, value) in &self.entries {
            let name = HeaderName::from_bytes(name.as_bytes())?;
            let value = HeaderValue::from_str(value)?;
            map.insert(name, value);
        }
        Ok(map)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(existing, _)| existing.eq_ignore_ascii_case(name))
    }
}

impl<N, V> FromIterator<(N, V)> for Headers
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}
