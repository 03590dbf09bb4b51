//! Storage RPC interface for keyrev.
//!
//! The key/revision/value engine lives behind a generic `get`/`put`
//! interface addressed by [`StoreUri`](keyrev_types::StoreUri). This crate
//! defines that seam and ships one backend:
//!
//! - [`InMemoryStorage`] -- `HashMap`-based engine for tests and embedding
//!
//! # Contract
//!
//! 1. Per-key `put`/`get` are atomic; nothing else is promised across keys.
//! 2. Failures are typed: a missing store, key, or revision is always
//!    [`StoreError::NotFound`], never an empty success.
//! 3. Implementations are stateless from the caller's point of view and
//!    safe to share between concurrent operations.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryStorage, Method, RecordedCall};
pub use traits::StorageRpc;
