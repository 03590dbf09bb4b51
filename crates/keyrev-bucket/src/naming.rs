use std::fmt;

/// Maps a logical bucket name to its two physical store names.
///
/// Implementations must be pure: the same bucket always yields the same
/// names, and the two names must differ.
pub trait StoreNaming: Send + Sync + fmt::Debug {
    fn latest_name(&self, bucket: &str) -> String;
    fn archive_name(&self, bucket: &str) -> String;
}

/// Latest store = `bucket + suffix`, archive store = `bucket`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuffixNaming {
    suffix: String,
}

impl SuffixNaming {
    pub const DEFAULT_SUFFIX: &'static str = ".latest";

    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }
}

impl Default for SuffixNaming {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SUFFIX)
    }
}

impl StoreNaming for SuffixNaming {
    fn latest_name(&self, bucket: &str) -> String {
        format!("{bucket}{}", self.suffix)
    }

    fn archive_name(&self, bucket: &str) -> String {
        bucket.to_string()
    }
}
