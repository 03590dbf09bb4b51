use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use keyrev_types::{
    Body, BucketConfig, Headers, Query, Response, StoreUri, CONTENT_TYPE, ETAG, KEY_REV_VALUE,
    SYS,
};
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::StorageRpc;

const DEFAULT_LIST_LIMIT: usize = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

/// One RPC observed by [`InMemoryStorage`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub method: Method,
    pub uri: String,
}

impl RecordedCall {
    pub fn get(uri: impl Into<String>) -> Self {
        Self { method: Method::Get, uri: uri.into() }
    }

    pub fn put(uri: impl Into<String>) -> Self {
        Self { method: Method::Put, uri: uri.into() }
    }
}

#[derive(Clone, Debug)]
struct StoredRevision {
    revision: u64,
    tid: String,
    content_type: Option<String>,
    value: Bytes,
}

impl StoredRevision {
    fn etag(&self) -> String {
        format!("{}/{}", self.revision, self.tid)
    }

    fn to_response(&self) -> Response {
        let mut response = Response::ok()
            .with_header(ETAG, self.etag())
            .with_body(self.value.clone());
        if let Some(ct) = &self.content_type {
            response.headers.insert(CONTENT_TYPE, ct.clone());
        }
        response
    }
}

#[derive(Debug)]
struct StoreState {
    config: BucketConfig,
    /// Revisions per key, ascending by revision. The last entry is the newest.
    keys: HashMap<String, Vec<StoredRevision>>,
}

enum Target<'a> {
    Store,
    Value {
        key: &'a str,
        revision: Option<u64>,
        tid: Option<&'a str>,
    },
    Listing {
        key: &'a str,
    },
}

struct Address<'a> {
    domain: &'a str,
    store: &'a str,
    target: Target<'a>,
}

impl Address<'_> {
    fn store_key(&self) -> (String, String) {
        (self.domain.to_string(), self.store.to_string())
    }
}

fn parse_revision(uri: &StoreUri, raw: &str) -> StoreResult<u64> {
    raw.parse()
        .map_err(|_| StoreError::invalid_uri(uri, format!("revision `{raw}` is not a number")))
}

fn parse(uri: &StoreUri) -> StoreResult<Address<'_>> {
    let segments: Vec<&str> = uri.segments().iter().map(String::as_str).collect();
    let (domain, store, rest) = match segments.as_slice() {
        [domain, SYS, KEY_REV_VALUE, store, rest @ ..] if !store.is_empty() => {
            (*domain, *store, rest)
        }
        _ => return Err(StoreError::invalid_uri(uri, "not a key_rev_value address")),
    };
    if rest.first().is_some_and(|key| key.is_empty()) {
        return Err(StoreError::invalid_uri(uri, "empty key"));
    }
    let target = match rest {
        [] => Target::Store,
        [key, ""] => Target::Listing { key: *key },
        [key] => Target::Value {
            key: *key,
            revision: None,
            tid: None,
        },
        [key, rev] => Target::Value {
            key: *key,
            revision: Some(parse_revision(uri, rev)?),
            tid: None,
        },
        [key, rev, tid] => Target::Value {
            key: *key,
            revision: Some(parse_revision(uri, rev)?),
            tid: Some(*tid),
        },
        _ => return Err(StoreError::invalid_uri(uri, "too many segments")),
    };
    Ok(Address { domain, store, target })
}

fn bad_request(message: impl Into<String>) -> StoreError {
    StoreError::Upstream {
        status: 400,
        message: message.into(),
    }
}

/// In-memory key/revision/value engine.
///
/// Stands in for the external storage engine in tests and embedded setups.
/// Stores are keyed by `(domain, store)` and must be created with a `PUT`
/// of their configuration before values can be written.
///
/// An engine built with [`recording`](Self::recording) also keeps every call
/// it receives for inspection through [`calls`](Self::calls). The log is
/// unbounded, so long-running servers use [`new`](Self::new).
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    stores: RwLock<HashMap<(String, String), StoreState>>,
    calls: Option<RwLock<Vec<RecordedCall>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// An engine that records every call.
    pub fn recording() -> Self {
        Self {
            calls: Some(RwLock::default()),
            ..Self::default()
        }
    }

    pub fn is_recording(&self) -> bool {
        self.calls.is_some()
    }

    /// RPCs received so far, in arrival order. Always empty unless recording.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.as_ref().map_or_else(Vec::new, |calls| {
            calls.read().unwrap_or_else(PoisonError::into_inner).clone()
        })
    }

    pub fn clear_calls(&self) {
        if let Some(calls) = &self.calls {
            calls.write().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }

    /// Configuration a store was created with.
    pub fn store_config(&self, domain: &str, store: &str) -> Option<BucketConfig> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores
            .get(&(domain.to_string(), store.to_string()))
            .map(|s| s.config.clone())
    }

    /// Number of revisions currently retained for `key`.
    pub fn revision_count(&self, domain: &str, store: &str, key: &str) -> usize {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        stores
            .get(&(domain.to_string(), store.to_string()))
            .and_then(|s| s.keys.get(key))
            .map_or(0, Vec::len)
    }

    pub fn store_count(&self) -> usize {
        self.stores.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn record(&self, method: Method, uri: &StoreUri) {
        debug!(?method, %uri, "memory storage call");
        if let Some(calls) = &self.calls {
            calls
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push(RecordedCall { method, uri: uri.to_string() });
        }
    }

    fn read_value(
        &self,
        uri: &StoreUri,
        addr: &Address<'_>,
        key: &str,
        revision: Option<u64>,
        tid: Option<&str>,
    ) -> StoreResult<Response> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let history = stores
            .get(&addr.store_key())
            .and_then(|s| s.keys.get(key))
            .ok_or_else(|| StoreError::not_found(uri))?;
        let found = match (revision, tid) {
            (None, _) => history.last(),
            (Some(rev), None) => history.iter().rev().find(|r| r.revision == rev),
            (Some(rev), Some(tid)) => history.iter().find(|r| r.revision == rev && r.tid == tid),
        };
        found
            .map(StoredRevision::to_response)
            .ok_or_else(|| StoreError::not_found(uri))
    }

    fn list_revisions(
        &self,
        uri: &StoreUri,
        addr: &Address<'_>,
        key: &str,
        query: &Query,
    ) -> StoreResult<Response> {
        let limit = match query.get("limit") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(0) | Err(_) => return Err(bad_request(format!("invalid limit `{raw}`"))),
                Ok(n) => n,
            },
            None => DEFAULT_LIST_LIMIT,
        };
        let offset = match query.get("next") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|_| bad_request(format!("invalid continuation `{raw}`")))?,
            None => 0,
        };

        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let history = stores
            .get(&addr.store_key())
            .and_then(|s| s.keys.get(key))
            .ok_or_else(|| StoreError::not_found(uri))?;

        let items: Vec<_> = history
            .iter()
            .rev()
            .skip(offset)
            .take(limit)
            .map(|r| json!({ "revision": r.revision, "tid": r.tid }))
            .collect();
        let consumed = offset + items.len();
        let mut listing = json!({ "items": items });
        if consumed < history.len() {
            listing["next"] = json!(consumed.to_string());
        }
        Ok(Response::ok()
            .with_header(CONTENT_TYPE, "application/json")
            .with_body(listing))
    }

    fn create_store(&self, addr: &Address<'_>, body: &Body) -> StoreResult<Response> {
        let config = BucketConfig::from_body(body).map_err(|e| bad_request(e.to_string()))?;
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.entry(addr.store_key()).or_insert_with(|| StoreState {
            config,
            keys: HashMap::new(),
        });
        Ok(Response::created())
    }

    #[allow(clippy::too_many_arguments)]
    fn write_value(
        &self,
        uri: &StoreUri,
        addr: &Address<'_>,
        key: &str,
        revision: Option<u64>,
        tid: Option<&str>,
        headers: &Headers,
        body: &Body,
    ) -> StoreResult<Response> {
        let value = body.to_bytes().map_err(|e| bad_request(e.to_string()))?;
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        let state = stores
            .get_mut(&addr.store_key())
            .ok_or_else(|| StoreError::not_found(uri))?;
        let latest_only = state.config.retains_latest_only();
        let history = state.keys.entry(key.to_string()).or_default();

        let revision = revision.unwrap_or_else(|| history.last().map_or(0, |r| r.revision) + 1);
        let stored = StoredRevision {
            revision,
            tid: tid.map_or_else(|| Uuid::now_v7().to_string(), str::to_string),
            content_type: headers.content_type().map(str::to_string),
            value,
        };
        let response = Response::created().with_header(ETAG, stored.etag());

        if latest_only {
            history.clear();
            history.push(stored);
        } else {
            history.retain(|r| !(r.revision == stored.revision && r.tid == stored.tid));
            let pos = history.partition_point(|r| r.revision <= stored.revision);
            history.insert(pos, stored);
        }
        Ok(response)
    }
}

#[async_trait]
impl StorageRpc for InMemoryStorage {
    async fn get(&self, uri: &StoreUri, _headers: &Headers, query: &Query) -> StoreResult<Response> {
        self.record(Method::Get, uri);
        let addr = parse(uri)?;
        match addr.target {
            Target::Store => {
                let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
                let state = stores
                    .get(&addr.store_key())
                    .ok_or_else(|| StoreError::not_found(uri))?;
                Ok(Response::ok()
                    .with_header(CONTENT_TYPE, "application/json")
                    .with_body(state.config.to_body()))
            }
            Target::Value { key, revision, tid } => self.read_value(uri, &addr, key, revision, tid),
            Target::Listing { key } => self.list_revisions(uri, &addr, key, query),
        }
    }

    async fn put(&self, uri: &StoreUri, headers: &Headers, body: Body) -> StoreResult<Response> {
        self.record(Method::Put, uri);
        let addr = parse(uri)?;
        match addr.target {
            Target::Store => self.create_store(&addr, &body),
            Target::Value { key, revision, tid } => {
                self.write_value(uri, &addr, key, revision, tid, headers, &body)
            }
            Target::Listing { .. } => Err(StoreError::invalid_uri(uri, "cannot write a listing")),
        }
    }
}
