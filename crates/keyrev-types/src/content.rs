use std::fmt;

const JSON_PREFIX: &str = "application/json";

/// How a value is treated on its way in and out of the latest store.
///
/// JSON values are stored as-is; everything else is gzip-compressed before
/// it reaches the latest store and flagged `content-encoding: gzip` on read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ContentKind {
    Json,
    Binary,
}

impl ContentKind {
    /// Classify a declared content type. A missing header is `Binary`.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct)
                if ct
                    .get(..JSON_PREFIX.len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(JSON_PREFIX)) =>
            {
                Self::Json
            }
            _ => Self::Binary,
        }
    }

    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Binary => write!(f, "binary"),
        }
    }
}
