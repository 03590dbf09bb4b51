//! Test doubles shared by the bucket tests.

use std::collections::HashMap;
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyrev_store::{InMemoryStorage, StorageRpc, StoreError, StoreResult};
use keyrev_types::{Body, Headers, Query, Response, StoreUri};

use crate::archival::ArchivalBucket;
use crate::compression::Compressor;

pub(crate) const DOMAIN: &str = "en.wikipedia.org";

/// Wraps a recording [`InMemoryStorage`] and fails calls addressed to chosen stores.
#[derive(Debug)]
pub(crate) struct FaultyStorage {
    pub inner: InMemoryStorage,
    put_faults: Mutex<HashMap<String, StoreError>>,
    get_faults: Mutex<HashMap<String, StoreError>>,
}

impl FaultyStorage {
    pub fn new() -> Self {
        Self {
            inner: InMemoryStorage::recording(),
            put_faults: Mutex::default(),
            get_faults: Mutex::default(),
        }
    }

    pub fn fail_puts(&self, store: &str, err: StoreError) {
        self.put_faults.lock().unwrap().insert(store.to_string(), err);
    }

    pub fn fail_gets(&self, store: &str, err: StoreError) {
        self.get_faults.lock().unwrap().insert(store.to_string(), err);
    }

    fn fault(faults: &Mutex<HashMap<String, StoreError>>, uri: &StoreUri) -> Option<StoreError> {
        let store = uri.segments().get(3)?;
        faults.lock().unwrap().get(store).cloned()
    }
}

#[async_trait]
impl StorageRpc for FaultyStorage {
    async fn get(&self, uri: &StoreUri, headers: &Headers, query: &Query) -> StoreResult<Response> {
        if let Some(err) = Self::fault(&self.get_faults, uri) {
            return Err(err);
        }
        self.inner.get(uri, headers, query).await
    }

    async fn put(&self, uri: &StoreUri, headers: &Headers, body: Body) -> StoreResult<Response> {
        if let Some(err) = Self::fault(&self.put_faults, uri) {
            return Err(err);
        }
        self.inner.put(uri, headers, body).await
    }
}

pub(crate) fn fixture() -> (Arc<FaultyStorage>, ArchivalBucket) {
    let storage = Arc::new(FaultyStorage::new());
    let bucket = ArchivalBucket::new(storage.clone());
    (storage, bucket)
}

pub(crate) fn upstream(status: u16) -> StoreError {
    StoreError::Upstream {
        status,
        message: "injected".into(),
    }
}

/// Compressor whose stream always breaks.
#[derive(Debug)]
pub(crate) struct FailingCompressor;

impl Compressor for FailingCompressor {
    fn compress(&self, _data: &[u8]) -> io::Result<Vec<u8>> {
        Err(io::Error::other("deflate stream error"))
    }
}
