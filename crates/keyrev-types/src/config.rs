use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::TypeError;
use crate::message::Body;

/// Retention policy type that keeps only the most recent revision per key.
pub const LATEST_HASH: &str = "latest_hash";

const VALUE_TYPE: &str = "valueType";
const RETENTION_POLICY: &str = "revisionRetentionPolicy";
const OPTIONS: &str = "options";
const COMPRESSION: &str = "compression";

/// Store configuration supplied when a bucket is created.
///
/// Held as the raw JSON object so that every field, including ones set to
/// `null` or of an unexpected type, reaches the storage engine exactly as the
/// caller wrote it. Only `valueType`, `revisionRetentionPolicy` and
/// `options.compression` are ever read or replaced.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketConfig(Map<String, Value>);

impl BucketConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value_type(value_type: impl Into<String>) -> Self {
        let mut config = Self::new();
        config.insert(VALUE_TYPE, Value::String(value_type.into()));
        config
    }

    /// Builder-style [`set_retention_policy`](Self::set_retention_policy).
    pub fn with_retention_policy(mut self, kind: &str) -> Self {
        self.set_retention_policy(kind);
        self
    }

    /// Parse a configuration from a request body. The body must be a JSON object.
    pub fn from_body(body: &Body) -> Result<Self, TypeError> {
        match body.to_json()? {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(TypeError::InvalidConfig(
                "bucket configuration must be a JSON object".into(),
            )),
        }
    }

    pub fn to_body(&self) -> Body {
        Body::Json(Value::Object(self.0.clone()))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn insert(&mut self, field: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(field.into(), value)
    }

    /// `valueType`, when it is a string.
    pub fn value_type(&self) -> Option<&str> {
        self.get(VALUE_TYPE)?.as_str()
    }

    /// `true` only when `valueType` is exactly the string `"json"`.
    pub fn is_json(&self) -> bool {
        self.value_type() == Some("json")
    }

    /// `revisionRetentionPolicy.type`, when it is a string.
    pub fn retention_policy(&self) -> Option<&str> {
        self.get(RETENTION_POLICY)?.get("type")?.as_str()
    }

    /// Replace the whole retention policy with `{"type": kind}`.
    pub fn set_retention_policy(&mut self, kind: &str) {
        self.insert(RETENTION_POLICY, json!({ "type": kind }));
    }

    /// `true` when the retention policy keeps a single revision per key.
    pub fn retains_latest_only(&self) -> bool {
        self.retention_policy() == Some(LATEST_HASH)
    }

    /// `options.compression`, exactly as supplied.
    pub fn compression(&self) -> Option<&Value> {
        self.get(OPTIONS)?.get(COMPRESSION)
    }

    /// Set `options.compression`, keeping the other options. A missing or
    /// non-object `options` is replaced by an object.
    pub fn set_compression(&mut self, codecs: Value) {
        let options = self
            .0
            .entry(OPTIONS)
            .or_insert_with(|| Value::Object(Map::new()));
        if !options.is_object() {
            *options = Value::Object(Map::new());
        }
        if let Value::Object(map) = options {
            map.insert(COMPRESSION.into(), codecs);
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for BucketConfig {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
