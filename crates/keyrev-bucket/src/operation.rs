use std::fmt;
use std::str::FromStr;

use keyrev_types::{Request, Response};

use crate::archival::ArchivalBucket;
use crate::error::{BucketError, BucketResult};

/// The operations a bucket exposes, under their external names.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateBucket,
    GetRevision,
    ListRevisions,
    PutRevision,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Self::CreateBucket,
        Self::GetRevision,
        Self::ListRevisions,
        Self::PutRevision,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::CreateBucket => "createBucket",
            Self::GetRevision => "getRevision",
            Self::ListRevisions => "listRevisions",
            Self::PutRevision => "putRevision",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Operation {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| BucketError::UnknownOperation(s.to_string()))
    }
}

impl ArchivalBucket {
    /// Run `op` against this bucket.
    pub async fn handle(&self, op: Operation, req: &Request) -> BucketResult<Response> {
        match op {
            Operation::CreateBucket => self.create_bucket(req).await,
            Operation::GetRevision => self.get_revision(req).await,
            Operation::ListRevisions => self.list_revisions(req).await,
            Operation::PutRevision => self.put_revision(req).await,
        }
    }
}
