use std::fmt;

/// Second path segment of every storage coordinate.
pub const SYS: &str = "sys";

/// Module segment addressing the key/revision/value storage engine.
pub const KEY_REV_VALUE: &str = "key_rev_value";

/// Ordered path addressing an object behind the storage RPC interface.
///
/// The layout is `[domain, "sys", "key_rev_value", store, key?, revision?, tid?]`.
/// An empty trailing segment is significant: it renders as a trailing `/`
/// and addresses the revision listing of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StoreUri {
    segments: Vec<String>,
}

impl StoreUri {
    /// Build a URI from raw segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `[domain, "sys", "key_rev_value", store]`
    pub fn key_rev_value(domain: &str, store: &str) -> Self {
        Self::new([domain, SYS, KEY_REV_VALUE, store])
    }

    /// Append a segment, consuming and returning the URI.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for StoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
