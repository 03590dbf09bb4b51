use std::sync::Arc;

use async_trait::async_trait;
use keyrev_types::{Body, Headers, Query, Response, StoreUri};

use crate::error::StoreResult;

/// Generic storage RPC interface.
///
/// Every call is addressed by a [`StoreUri`] of the form
/// `[domain, "sys", "key_rev_value", store, key?, revision?, tid?]`.
/// Implementations must be safe for concurrent use by many operations and
/// must report a missing target as [`StoreError::NotFound`](crate::StoreError::NotFound).
#[async_trait]
pub trait StorageRpc: Send + Sync {
    /// Read the object addressed by `uri`.
    async fn get(&self, uri: &StoreUri, headers: &Headers, query: &Query) -> StoreResult<Response>;

    /// Create or replace the object addressed by `uri`.
    async fn put(&self, uri: &StoreUri, headers: &Headers, body: Body) -> StoreResult<Response>;
}

#[async_trait]
impl<T: StorageRpc + ?Sized> StorageRpc for Arc<T> {
    async fn get(&self, uri: &StoreUri, headers: &Headers, query: &Query) -> StoreResult<Response> {
        (**self).get(uri, headers, query).await
    }

    async fn put(&self, uri: &StoreUri, headers: &Headers, body: Body) -> StoreResult<Response> {
        (**self).put(uri, headers, body).await
    }
}
