use keyrev_types::{BucketConfig, LATEST_HASH};
use serde_json::Value;

/// Derive the latest store's configuration from the caller's bucket config.
///
/// The retention policy is forced to `latest_hash`. For non-JSON buckets
/// store-level compression is switched off, since values arrive already
/// gzip-compressed. Everything else is copied unchanged and `config` itself
/// is left untouched.
pub fn latest_store_config(config: &BucketConfig) -> BucketConfig {
    let mut latest = config.clone();
    latest.set_retention_policy(LATEST_HASH);
    if !config.is_json() {
        latest.set_compression(Value::Array(Vec::new()));
    }
    latest
}
