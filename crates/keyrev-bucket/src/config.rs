use serde::{Deserialize, Serialize};

use crate::compression::{Gzip, DEFAULT_GZIP_LEVEL};
use crate::naming::SuffixNaming;

/// Tunables for [`ArchivalBucket`](crate::ArchivalBucket).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchivalConfig {
    /// Suffix appended to a bucket name to form its latest store name.
    pub latest_suffix: String,
    /// gzip level applied to non-JSON latest-store values. Clamped to 0..=9.
    pub gzip_level: u32,
}

impl Default for ArchivalConfig {
    fn default() -> Self {
        Self {
            latest_suffix: SuffixNaming::DEFAULT_SUFFIX.into(),
            gzip_level: DEFAULT_GZIP_LEVEL,
        }
    }
}

impl ArchivalConfig {
    pub fn naming(&self) -> SuffixNaming {
        SuffixNaming::new(self.latest_suffix.clone())
    }

    pub fn effective_gzip_level(&self) -> u32 {
        self.gzip_level.min(9)
    }

    pub fn compressor(&self) -> Gzip {
        Gzip::new(self.gzip_level)
    }
}
