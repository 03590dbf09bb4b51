use std::fmt;

use keyrev_store::StoreError;
use keyrev_types::TypeError;

/// One of the two physical stores behind a bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StoreRole {
    Latest,
    Archive,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => write!(f, "latest"),
            Self::Archive => write!(f, "archive"),
        }
    }
}

/// Errors from bucket operations.
#[derive(Debug, thiserror::Error)]
pub enum BucketError {
    /// A storage RPC failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The gzip stream failed while preparing a latest-store value.
    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    /// The `createBucket` body is not a usable store configuration.
    #[error("invalid bucket configuration: {0}")]
    InvalidConfig(String),

    /// A key-scoped operation was issued without a key.
    #[error("missing path parameter `{0}`")]
    MissingParam(&'static str),

    /// The operation name is not one of the four bucket operations.
    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    /// Exactly one of the two concurrent writes succeeded.
    #[error("{failed} store write failed after {committed} store write succeeded: {source}")]
    PartialWrite {
        committed: StoreRole,
        failed: StoreRole,
        source: Box<BucketError>,
    },
}

impl BucketError {
    /// HTTP status to report for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::Store(e) => e.status(),
            Self::Compression(_) => 500,
            Self::InvalidConfig(_) | Self::MissingParam(_) => 400,
            Self::UnknownOperation(_) => 501,
            Self::PartialWrite { .. } => 502,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_not_found())
    }

    pub(crate) fn partial(committed: StoreRole, failed: StoreRole, source: BucketError) -> Self {
        Self::PartialWrite {
            committed,
            failed,
            source: Box::new(source),
        }
    }
}

impl From<TypeError> for BucketError {
    fn from(e: TypeError) -> Self {
        Self::InvalidConfig(e.to_string())
    }
}

/// Result alias for bucket operations.
pub type BucketResult<T> = Result<T, BucketError>;
