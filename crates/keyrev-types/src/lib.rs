//! Foundation types for keyrev.
//!
//! Every other keyrev crate depends on `keyrev-types`. Nothing in here
//! performs I/O; these are the values that flow between the bucket layer
//! and the storage RPC interface.
//!
//! # Key Types
//!
//! - [`StoreUri`]: ordered path addressing a store, key, revision, and tid
//! - [`Headers`] / [`Query`]: case-insensitive headers and query parameters
//! - [`Body`]: empty, raw bytes, or a JSON document
//! - [`Request`] / [`Response`]: the envelopes exchanged with operations
//! - [`ContentKind`]: `Json | Binary`, derived once from a content type
//! - [`BucketConfig`]: the store configuration supplied at bucket creation

pub mod config;
pub mod content;
pub mod error;
pub mod headers;
pub mod message;
pub mod uri;

pub use config::{BucketConfig, LATEST_HASH};
pub use content::ContentKind;
pub use error::TypeError;
pub use headers::{Headers, Query, CONTENT_ENCODING, CONTENT_TYPE, ETAG};
pub use message::{Body, Request, RequestParams, Response};
pub use uri::{StoreUri, KEY_REV_VALUE, SYS};
