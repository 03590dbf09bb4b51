use std::sync::Arc;

use keyrev_store::StorageRpc;
use keyrev_types::{
    Body, BucketConfig, ContentKind, Headers, Query, Request, RequestParams, Response, StoreUri,
    CONTENT_ENCODING,
};
use tracing::{debug, warn};

use crate::compression::{compress_async, Compressor};
use crate::config::ArchivalConfig;
use crate::error::{BucketError, BucketResult, StoreRole};
use crate::naming::StoreNaming;
use crate::store_config::latest_store_config;

/// Stateless translator from bucket operations to storage RPCs.
///
/// Holds no data of its own: every call is forwarded to the shared
/// [`StorageRpc`] client, so one instance serves any number of concurrent
/// operations.
#[derive(Clone)]
pub struct ArchivalBucket {
    rpc: Arc<dyn StorageRpc>,
    naming: Arc<dyn StoreNaming>,
    compressor: Arc<dyn Compressor>,
}

impl std::fmt::Debug for ArchivalBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchivalBucket")
            .field("naming", &self.naming)
            .field("compressor", &self.compressor)
            .finish_non_exhaustive()
    }
}

impl ArchivalBucket {
    pub fn new(rpc: Arc<dyn StorageRpc>) -> Self {
        Self::with_config(rpc, &ArchivalConfig::default())
    }

    pub fn with_config(rpc: Arc<dyn StorageRpc>, config: &ArchivalConfig) -> Self {
        Self {
            rpc,
            naming: Arc::new(config.naming()),
            compressor: Arc::new(config.compressor()),
        }
    }

    /// Replace the store naming strategy.
    pub fn with_naming(mut self, naming: impl StoreNaming + 'static) -> Self {
        self.naming = Arc::new(naming);
        self
    }

    /// Replace the encoder applied to non-JSON latest-store values.
    pub fn with_compressor(mut self, compressor: impl Compressor + 'static) -> Self {
        self.compressor = Arc::new(compressor);
        self
    }

    pub fn latest_name(&self, bucket: &str) -> String {
        self.naming.latest_name(bucket)
    }

    pub fn archive_name(&self, bucket: &str) -> String {
        self.naming.archive_name(bucket)
    }

    fn store_name(&self, role: StoreRole, bucket: &str) -> String {
        match role {
            StoreRole::Latest => self.latest_name(bucket),
            StoreRole::Archive => self.archive_name(bucket),
        }
    }

    /// `[domain, sys, key_rev_value, store, key, revision?, tid?]`.
    ///
    /// The tid is only appended when a revision is present.
    fn revision_uri(&self, params: &RequestParams, role: StoreRole) -> BucketResult<StoreUri> {
        let key = params.key.as_deref().ok_or(BucketError::MissingParam("key"))?;
        let mut uri = StoreUri::key_rev_value(&params.domain, &self.store_name(role, &params.bucket))
            .with_segment(key);
        if let Some(revision) = &params.revision {
            uri.push(revision.clone());
            if let Some(tid) = &params.tid {
                uri.push(tid.clone());
            }
        }
        Ok(uri)
    }

    /// Create the latest and archive stores for a bucket.
    ///
    /// The request body is the caller's store configuration. The archive
    /// store receives it verbatim; the latest store receives the derivation
    /// from [`latest_store_config`]. Both creations run concurrently and
    /// both must succeed.
    pub async fn create_bucket(&self, req: &Request) -> BucketResult<Response> {
        let p = &req.params;
        let config = BucketConfig::from_body(&req.body)?;
        let latest_body = latest_store_config(&config).to_body();

        let latest_uri = StoreUri::key_rev_value(&p.domain, &self.latest_name(&p.bucket));
        let archive_uri = StoreUri::key_rev_value(&p.domain, &self.archive_name(&p.bucket));
        debug!(latest = %latest_uri, archive = %archive_uri, "creating bucket stores");

        let (latest, archive) = tokio::join!(
            self.rpc.put(&latest_uri, &req.headers, latest_body),
            self.rpc.put(&archive_uri, &req.headers, req.body.clone()),
        );
        match (latest, archive) {
            (Ok(_), Ok(_)) => Ok(Response::created()),
            (Err(e), Ok(_)) => {
                warn!(created = %archive_uri, error = %e, "latest store creation failed; archive store exists");
                Err(e.into())
            }
            (Ok(_), Err(e)) => {
                warn!(created = %latest_uri, error = %e, "archive store creation failed; latest store exists");
                Err(e.into())
            }
            (Err(e), Err(_)) => Err(e.into()),
        }
    }

    /// Read a revision, preferring the latest store.
    ///
    /// A hit on the latest store with a non-JSON content type is returned
    /// with `content-encoding: gzip` and its body still compressed. A
    /// not-found from the latest store falls back to the archive store,
    /// whose answer (success or error) is returned as-is.
    pub async fn get_revision(&self, req: &Request) -> BucketResult<Response> {
        let latest_uri = self.revision_uri(&req.params, StoreRole::Latest)?;
        debug!(uri = %latest_uri, "reading latest store");
        match self.rpc.get(&latest_uri, &req.headers, &Query::new()).await {
            Ok(mut res) => {
                if !res.headers.content_kind().is_json() {
                    res.headers.insert(CONTENT_ENCODING, "gzip");
                }
                Ok(res)
            }
            Err(e) if e.is_not_found() => {
                let archive_uri = self.revision_uri(&req.params, StoreRole::Archive)?;
                debug!(uri = %archive_uri, "latest store miss; reading archive");
                Ok(self.rpc.get(&archive_uri, &req.headers, &Query::new()).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List the revisions of a key. Always served by the archive store.
    ///
    /// Query parameters are passed through untouched; pagination is whatever
    /// the storage engine implements.
    pub async fn list_revisions(&self, req: &Request) -> BucketResult<Response> {
        let p = &req.params;
        let key = p.key.as_deref().ok_or(BucketError::MissingParam("key"))?;
        let uri = StoreUri::key_rev_value(&p.domain, &self.archive_name(&p.bucket))
            .with_segment(key)
            .with_segment("");
        debug!(%uri, "listing revisions");
        Ok(self.rpc.get(&uri, &Headers::new(), &req.query).await?)
    }

    /// Write a revision to both stores.
    ///
    /// The archive store always gets the raw body. The latest store gets the
    /// body as-is for JSON content and its gzip compression otherwise. The
    /// two writes run concurrently; compression only delays the latest one.
    /// On success the latest store's response is returned.
    pub async fn put_revision(&self, req: &Request) -> BucketResult<Response> {
        let latest_uri = self.revision_uri(&req.params, StoreRole::Latest)?;
        let archive_uri = self.revision_uri(&req.params, StoreRole::Archive)?;
        let kind = req.headers.content_kind();
        debug!(latest = %latest_uri, archive = %archive_uri, %kind, "writing revision");

        let latest_write = async {
            let value = match kind {
                ContentKind::Json => req.body.clone(),
                ContentKind::Binary => {
                    let raw = req.body.to_bytes()?;
                    Body::Bytes(compress_async(self.compressor.clone(), raw).await?)
                }
            };
            self.rpc
                .put(&latest_uri, &req.headers, value)
                .await
                .map_err(BucketError::from)
        };
        let archive_write = self.rpc.put(&archive_uri, &req.headers, req.body.clone());

        let (latest, archive) = tokio::join!(latest_write, archive_write);
        match (latest, archive) {
            (Ok(res), Ok(_)) => Ok(res),
            (Ok(_), Err(e)) => {
                warn!(uri = %archive_uri, error = %e, "archive write failed; latest store already updated");
                Err(BucketError::partial(StoreRole::Latest, StoreRole::Archive, e.into()))
            }
            (Err(e), Ok(_)) => {
                warn!(uri = %latest_uri, error = %e, "latest write failed; archive store already updated");
                Err(BucketError::partial(StoreRole::Archive, StoreRole::Latest, e))
            }
            (Err(e), Err(_)) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compression::{gzip, DEFAULT_GZIP_LEVEL};
    use crate::naming::SuffixNaming;
    use crate::testing::{fixture, upstream, FailingCompressor, DOMAIN};
    use keyrev_store::{InMemoryStorage, Method, RecordedCall, StoreError};
    use keyrev_types::{CONTENT_TYPE, ETAG, LATEST_HASH};
    use serde_json::json;

    const HTML: &str = "<html><body>Main Page</body></html>";

    fn bucket_req(bucket: &str, config: serde_json::Value) -> Request {
        Request::new(RequestParams::bucket(DOMAIN, bucket)).with_body(config)
    }

    fn key_req(key: &str) -> Request {
        Request::new(RequestParams::bucket(DOMAIN, "html").with_key(key))
    }

    fn html_put(key: &str) -> Request {
        key_req(key)
            .with_header(CONTENT_TYPE, "text/html")
            .with_body(HTML)
    }

    async fn setup(value_type: &str) -> (Arc<crate::testing::FaultyStorage>, ArchivalBucket) {
        let (storage, bucket) = fixture();
        bucket
            .create_bucket(&bucket_req("html", json!({ "valueType": value_type })))
            .await
            .unwrap();
        storage.inner.clear_calls();
        (storage, bucket)
    }

    // -----------------------------------------------------------------------
    // createBucket
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_bucket_issues_two_puts() {
        let (storage, bucket) = fixture();
        let res = bucket
            .create_bucket(&bucket_req("html", json!({ "valueType": "json" })))
            .await
            .unwrap();
        assert_eq!(res, Response::created());

        let mut calls = storage.inner.calls();
        calls.sort_by(|a, b| a.uri.cmp(&b.uri));
        assert_eq!(
            calls,
            vec![
                RecordedCall::put("/en.wikipedia.org/sys/key_rev_value/html"),
                RecordedCall::put("/en.wikipedia.org/sys/key_rev_value/html.latest"),
            ]
        );
    }

    #[tokio::test]
    async fn create_json_bucket_keeps_caller_compression() {
        let (storage, bucket) = fixture();
        let config = json!({
            "valueType": "json",
            "revisionRetentionPolicy": { "type": "all" },
            "options": { "compression": [{ "algorithm": "deflate", "block_size": 256 }] }
        });
        bucket.create_bucket(&bucket_req("data", config)).await.unwrap();

        let latest = storage.inner.store_config(DOMAIN, "data.latest").unwrap();
        let archive = storage.inner.store_config(DOMAIN, "data").unwrap();
        assert_eq!(latest.retention_policy(), Some(LATEST_HASH));
        assert_eq!(archive.retention_policy(), Some("all"));
        assert_eq!(latest.compression(), archive.compression());
        assert_eq!(
            latest.compression(),
            Some(&json!([{ "algorithm": "deflate", "block_size": 256 }]))
        );
    }

    #[tokio::test]
    async fn create_json_bucket_passes_null_compression_through() {
        let (storage, bucket) = fixture();
        let config = json!({ "valueType": "json", "options": { "compression": null } });
        bucket.create_bucket(&bucket_req("data", config)).await.unwrap();

        let latest = storage.inner.store_config(DOMAIN, "data.latest").unwrap();
        assert_eq!(latest.get("options"), Some(&json!({ "compression": null })));
    }

    #[tokio::test]
    async fn non_string_value_type_is_treated_as_binary() {
        let (storage, bucket) = fixture();
        let config = json!({ "valueType": 1 });
        bucket.create_bucket(&bucket_req("html", config)).await.unwrap();

        let latest = storage.inner.store_config(DOMAIN, "html.latest").unwrap();
        let archive = storage.inner.store_config(DOMAIN, "html").unwrap();
        assert_eq!(latest.compression(), Some(&json!([])));
        assert_eq!(latest.get("valueType"), Some(&json!(1)));
        assert_eq!(archive.to_body(), Body::Json(json!({ "valueType": 1 })));
    }

    #[tokio::test]
    async fn create_blob_bucket_disables_latest_compression_only() {
        let (storage, bucket) = fixture();
        let config = json!({
            "valueType": "blob",
            "options": { "compression": [{ "algorithm": "deflate" }] }
        });
        bucket.create_bucket(&bucket_req("html", config)).await.unwrap();

        let latest = storage.inner.store_config(DOMAIN, "html.latest").unwrap();
        let archive = storage.inner.store_config(DOMAIN, "html").unwrap();
        assert_eq!(latest.compression(), Some(&json!([])));
        assert_eq!(archive.compression(), Some(&json!([{ "algorithm": "deflate" }])));
        assert!(latest.retains_latest_only());
        assert!(!archive.retains_latest_only());
    }

    #[tokio::test]
    async fn create_bucket_rejects_bad_config_before_any_rpc() {
        let (storage, bucket) = fixture();
        let req = Request::new(RequestParams::bucket(DOMAIN, "html")).with_body("valueType=json");
        let err = bucket.create_bucket(&req).await.unwrap_err();
        assert!(matches!(err, BucketError::InvalidConfig(_)));
        assert!(storage.inner.calls().is_empty());
    }

    #[tokio::test]
    async fn create_bucket_surfaces_half_failure() {
        let (storage, bucket) = fixture();
        storage.fail_puts("html.latest", upstream(500));
        let err = bucket
            .create_bucket(&bucket_req("html", json!({ "valueType": "blob" })))
            .await
            .unwrap_err();
        assert_eq!(err.status(), 500);
        // No rollback: the archive store stays created.
        assert!(storage.inner.store_config(DOMAIN, "html").is_some());
    }

    // -----------------------------------------------------------------------
    // putRevision / getRevision
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn binary_put_compresses_latest_only() {
        let (storage, bucket) = setup("blob").await;
        let res = bucket.put_revision(&html_put("Main_Page")).await.unwrap();
        assert_eq!(res.status, 201);

        let raw = storage
            .inner
            .get(
                &StoreUri::key_rev_value(DOMAIN, "html.latest").with_segment("Main_Page"),
                &Headers::new(),
                &Query::new(),
            )
            .await
            .unwrap();
        let expected = gzip(HTML.as_bytes(), DEFAULT_GZIP_LEVEL).unwrap();
        assert_eq!(raw.body, Body::from(expected));
        // Returned response is the latest store's write response.
        assert_eq!(res.headers.get(ETAG), raw.headers.get(ETAG));

        let archived = storage
            .inner
            .get(
                &StoreUri::key_rev_value(DOMAIN, "html").with_segment("Main_Page"),
                &Headers::new(),
                &Query::new(),
            )
            .await
            .unwrap();
        assert_eq!(archived.body, Body::from(HTML));
    }

    #[tokio::test]
    async fn binary_get_is_flagged_gzip() {
        let (_storage, bucket) = setup("blob").await;
        bucket.put_revision(&html_put("Main_Page")).await.unwrap();

        let res = bucket.get_revision(&key_req("Main_Page")).await.unwrap();
        assert_eq!(res.headers.get(CONTENT_ENCODING), Some("gzip"));
        let expected = gzip(HTML.as_bytes(), DEFAULT_GZIP_LEVEL).unwrap();
        assert_eq!(res.body, Body::from(expected));
    }

    #[tokio::test]
    async fn json_round_trip_is_unmodified() {
        let (storage, bucket) = setup("json").await;
        let doc = json!({ "title": "Main_Page", "rev": 1 });
        let put = key_req("Main_Page")
            .with_header(CONTENT_TYPE, "application/json")
            .with_body(doc.clone());
        bucket.put_revision(&put).await.unwrap();

        let res = bucket.get_revision(&key_req("Main_Page")).await.unwrap();
        assert!(!res.headers.contains(CONTENT_ENCODING));
        assert_eq!(res.body.to_json().unwrap(), doc);

        let reads: Vec<_> = storage
            .inner
            .calls()
            .into_iter()
            .filter(|c| c.method == Method::Get)
            .collect();
        assert_eq!(reads.len(), 1, "latest hit must not touch the archive");
    }

    #[tokio::test]
    async fn historical_revision_falls_back_to_archive() {
        let (_storage, bucket) = setup("blob").await;
        bucket.put_revision(&html_put("Main_Page")).await.unwrap();
        let second = key_req("Main_Page")
            .with_header(CONTENT_TYPE, "text/html")
            .with_body("<html>v2</html>");
        bucket.put_revision(&second).await.unwrap();

        let mut old = key_req("Main_Page");
        old.params.revision = Some("1".into());
        let res = bucket.get_revision(&old).await.unwrap();
        assert_eq!(res.body, Body::from(HTML));
        assert!(!res.headers.contains(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn latest_miss_returns_archive_response() {
        let (storage, bucket) = setup("blob").await;
        let uri = StoreUri::key_rev_value(DOMAIN, "html").with_segment("Only_Archived");
        let headers = Headers::new().with(CONTENT_TYPE, "text/html");
        storage.inner.put(&uri, &headers, Body::from(HTML)).await.unwrap();

        let res = bucket.get_revision(&key_req("Only_Archived")).await.unwrap();
        assert_eq!(res.body, Body::from(HTML));
        assert!(!res.headers.contains(CONTENT_ENCODING));
    }

    #[tokio::test]
    async fn never_written_key_is_archive_not_found() {
        let (storage, bucket) = setup("blob").await;
        let err = bucket.get_revision(&key_req("Missing")).await.unwrap_err();
        assert!(err.is_not_found());
        match err {
            BucketError::Store(StoreError::NotFound { uri }) => {
                assert_eq!(uri, "/en.wikipedia.org/sys/key_rev_value/html/Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(storage.inner.calls().len(), 2);
    }

    #[tokio::test]
    async fn non_404_latest_error_does_not_fall_back() {
        let (storage, bucket) = setup("blob").await;
        bucket.put_revision(&html_put("Main_Page")).await.unwrap();
        storage.inner.clear_calls();
        storage.fail_gets("html.latest", upstream(503));

        let err = bucket.get_revision(&key_req("Main_Page")).await.unwrap_err();
        assert_eq!(err.status(), 503);
        assert!(storage.inner.calls().is_empty());
    }

    #[tokio::test]
    async fn tid_without_revision_is_ignored() {
        let (storage, bucket) = setup("blob").await;
        let mut req = key_req("Main_Page");
        req.params.tid = Some("abc".into());
        let _ = bucket.get_revision(&req).await;
        let calls = storage.inner.calls();
        assert_eq!(calls[0].uri, "/en.wikipedia.org/sys/key_rev_value/html.latest/Main_Page");
    }

    #[tokio::test]
    async fn revision_and_tid_address_both_stores() {
        let (storage, bucket) = setup("blob").await;
        let mut req = html_put("Main_Page");
        req.params.revision = Some("12".into());
        req.params.tid = Some("tid-1".into());
        bucket.put_revision(&req).await.unwrap();

        let mut uris: Vec<_> = storage.inner.calls().into_iter().map(|c| c.uri).collect();
        uris.sort();
        assert_eq!(
            uris,
            vec![
                "/en.wikipedia.org/sys/key_rev_value/html.latest/Main_Page/12/tid-1",
                "/en.wikipedia.org/sys/key_rev_value/html/Main_Page/12/tid-1",
            ]
        );
    }

    #[tokio::test]
    async fn key_is_required() {
        let (_storage, bucket) = setup("blob").await;
        let req = Request::new(RequestParams::bucket(DOMAIN, "html"));
        for err in [
            bucket.get_revision(&req).await.unwrap_err(),
            bucket.put_revision(&req).await.unwrap_err(),
            bucket.list_revisions(&req).await.unwrap_err(),
        ] {
            assert!(matches!(err, BucketError::MissingParam("key")));
        }
    }

    // -----------------------------------------------------------------------
    // Partial writes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn archive_failure_is_partial_write() {
        let (storage, bucket) = setup("blob").await;
        storage.fail_puts("html", upstream(500));
        let err = bucket.put_revision(&html_put("Main_Page")).await.unwrap_err();
        assert!(matches!(
            err,
            BucketError::PartialWrite { committed: StoreRole::Latest, failed: StoreRole::Archive, .. }
        ));
        assert_eq!(storage.inner.revision_count(DOMAIN, "html.latest", "Main_Page"), 1);
    }

    #[tokio::test]
    async fn latest_failure_is_partial_write() {
        let (storage, bucket) = setup("blob").await;
        storage.fail_puts("html.latest", StoreError::Transport("reset".into()));
        let err = bucket.put_revision(&html_put("Main_Page")).await.unwrap_err();
        match err {
            BucketError::PartialWrite { committed, failed, source } => {
                assert_eq!(committed, StoreRole::Archive);
                assert_eq!(failed, StoreRole::Latest);
                assert_eq!(source.status(), 502);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(storage.inner.revision_count(DOMAIN, "html", "Main_Page"), 1);
    }

    #[tokio::test]
    async fn compression_failure_is_partial_write() {
        let (storage, bucket) = setup("blob").await;
        let bucket = bucket.with_compressor(FailingCompressor);
        let err = bucket.put_revision(&html_put("Main_Page")).await.unwrap_err();
        match err {
            BucketError::PartialWrite { committed, failed, source } => {
                assert_eq!(committed, StoreRole::Archive);
                assert_eq!(failed, StoreRole::Latest);
                assert!(matches!(*source, BucketError::Compression(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(storage.inner.revision_count(DOMAIN, "html", "Main_Page"), 1);
        assert_eq!(storage.inner.revision_count(DOMAIN, "html.latest", "Main_Page"), 0);
        let puts: Vec<_> = storage.inner.calls().into_iter().map(|c| c.uri).collect();
        assert_eq!(puts, vec!["/en.wikipedia.org/sys/key_rev_value/html/Main_Page"]);
    }

    #[tokio::test]
    async fn json_put_skips_the_compressor() {
        let (storage, bucket) = setup("json").await;
        let bucket = bucket.with_compressor(FailingCompressor);
        let put = key_req("Main_Page")
            .with_header(CONTENT_TYPE, "application/json")
            .with_body(json!({ "rev": 1 }));
        bucket.put_revision(&put).await.unwrap();
        assert_eq!(storage.inner.revision_count(DOMAIN, "html.latest", "Main_Page"), 1);
    }

    #[tokio::test]
    async fn double_failure_reports_latest_error() {
        let (_storage, bucket) = fixture();
        // Stores never created: both writes are not-found.
        let err = bucket.put_revision(&html_put("Main_Page")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    // -----------------------------------------------------------------------
    // listRevisions
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn list_revisions_reads_archive_with_query() {
        let (storage, bucket) = setup("blob").await;
        for _ in 0..3 {
            bucket.put_revision(&html_put("Main_Page")).await.unwrap();
        }
        storage.inner.clear_calls();

        let req = key_req("Main_Page").with_query("limit", "2");
        let res = bucket.list_revisions(&req).await.unwrap();
        let listing = res.body.to_json().unwrap();
        assert_eq!(listing["items"].as_array().unwrap().len(), 2);
        assert_eq!(listing["items"][0]["revision"], 3);
        assert_eq!(
            storage.inner.calls(),
            vec![RecordedCall::get("/en.wikipedia.org/sys/key_rev_value/html/Main_Page/")]
        );
    }

    // -----------------------------------------------------------------------
    // Naming strategy
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn custom_naming_is_used_everywhere() {
        let storage = Arc::new(InMemoryStorage::new());
        let bucket = ArchivalBucket::new(storage.clone()).with_naming(SuffixNaming::new("_hot"));
        bucket
            .create_bucket(&bucket_req("html", json!({ "valueType": "blob" })))
            .await
            .unwrap();
        assert!(storage.store_config(DOMAIN, "html_hot").is_some());
        assert_eq!(bucket.latest_name("html"), "html_hot");
        assert_eq!(bucket.archive_name("html"), "html");
    }
}
