//! Archival buckets: a fast latest-value store in front of a full history.
//!
//! A logical bucket is backed by two physical stores behind the storage RPC
//! interface:
//!
//! - the **latest** store (`{bucket}.latest`) keeps only the newest revision
//!   per key, gzip-compressed by this crate unless the value is JSON;
//! - the **archive** store (`{bucket}`) keeps every revision uncompressed.
//!
//! [`ArchivalBucket`] translates the four bucket operations into calls
//! against those stores:
//!
//! | operation       | latest store                | archive store          |
//! |-----------------|-----------------------------|------------------------|
//! | `createBucket`  | create, `latest_hash` policy | create, caller config |
//! | `getRevision`   | read first                  | read on not-found      |
//! | `listRevisions` | --                          | list                   |
//! | `putRevision`   | write (maybe compressed)    | write raw              |
//!
//! The two writes of `putRevision` are concurrent and not transactional. If
//! exactly one of them fails the operation reports
//! [`BucketError::PartialWrite`] naming the store that did change, so the
//! drift can be detected and repaired.

pub mod archival;
pub mod compression;
pub mod config;
pub mod error;
pub mod naming;
pub mod operation;
pub mod store_config;

#[cfg(test)]
mod testing;

pub use archival::ArchivalBucket;
pub use compression::{compress_async, gzip, Compressor, Gzip, DEFAULT_GZIP_LEVEL};
pub use config::ArchivalConfig;
pub use error::{BucketError, BucketResult, StoreRole};
pub use naming::{StoreNaming, SuffixNaming};
pub use operation::Operation;
pub use store_config::latest_store_config;
