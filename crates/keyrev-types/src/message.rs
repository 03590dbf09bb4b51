use bytes::Bytes;
use serde_json::Value;

use crate::error::TypeError;
use crate::headers::{Headers, Query};

/// Payload carried by requests and responses.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
    Json(Value),
}

impl Body {
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Bytes(b) => b.is_empty(),
            Self::Json(_) => false,
        }
    }

    /// Wire representation of the body. JSON documents are serialized.
    pub fn to_bytes(&self) -> Result<Bytes, TypeError> {
        match self {
            Self::Empty => Ok(Bytes::new()),
            Self::Bytes(b) => Ok(b.clone()),
            Self::Json(v) => serde_json::to_vec(v)
                .map(Bytes::from)
                .map_err(|e| TypeError::InvalidJson(e.to_string())),
        }
    }

    /// Interpret the body as a JSON document.
    pub fn to_json(&self) -> Result<Value, TypeError> {
        match self {
            Self::Empty => Err(TypeError::InvalidJson("empty body".into())),
            Self::Bytes(b) => {
                serde_json::from_slice(b).map_err(|e| TypeError::InvalidJson(e.to_string()))
            }
            Self::Json(v) => Ok(v.clone()),
        }
    }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(s.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(s: &'static [u8]) -> Self {
        Self::Bytes(Bytes::from_static(s))
    }
}

impl From<Value> for Body {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

/// Path parameters of an inbound operation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestParams {
    pub domain: String,
    pub bucket: String,
    pub key: Option<String>,
    pub revision: Option<String>,
    pub tid: Option<String>,
}

impl RequestParams {
    /// Parameters addressing a whole bucket.
    pub fn bucket(domain: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_revision(mut self, revision: impl ToString) -> Self {
        self.revision = Some(revision.to_string());
        self
    }

    pub fn with_tid(mut self, tid: impl Into<String>) -> Self {
        self.tid = Some(tid.into());
        self
    }
}

/// An inbound operation request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Request {
    pub params: RequestParams,
    pub headers: Headers,
    pub query: Query,
    pub body: Body,
}

impl Request {
    pub fn new(params: RequestParams) -> Self {
        Self {
            params,
            ..Default::default()
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }
}

/// Result of an operation or a storage RPC.
#[derive(Clone, Debug, PartialEq)]
pub struct Response {
    pub status: u16,
    pub headers: Headers,
    pub body: Body,
}

impl Response {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Body::Empty,
        }
    }

    pub fn ok() -> Self {
        Self::new(200)
    }

    pub fn created() -> Self {
        Self::new(201)
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = body.into();
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
