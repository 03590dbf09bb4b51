use std::collections::{BTreeMap, HashMap};

use axum::body::Body as HttpBody;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use keyrev_bucket::Operation;
use keyrev_types::{Body, Headers, Request, RequestParams, CONTENT_TYPE};
use serde_json::json;

use crate::error::{ServerError, ServerResult};
use crate::router::AppState;

type PathParams = Path<HashMap<String, String>>;
type QueryParams = Query<BTreeMap<String, String>>;

/// Health check handler.
pub async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "name": "keyrev-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn not_found_handler() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "type": "not_found", "status": 404, "detail": "no such route" })),
    )
}

pub async fn create_bucket(
    State(state): State<AppState>,
    Path(path): PathParams,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    dispatch(&state, Operation::CreateBucket, path, &headers, BTreeMap::new(), body).await
}

pub async fn get_revision(
    State(state): State<AppState>,
    Path(path): PathParams,
    headers: HeaderMap,
) -> ServerResult<Response> {
    dispatch(&state, Operation::GetRevision, path, &headers, BTreeMap::new(), Bytes::new()).await
}

pub async fn list_revisions(
    State(state): State<AppState>,
    Path(path): PathParams,
    headers: HeaderMap,
    Query(query): QueryParams,
) -> ServerResult<Response> {
    dispatch(&state, Operation::ListRevisions, path, &headers, query, Bytes::new()).await
}

pub async fn put_revision(
    State(state): State<AppState>,
    Path(path): PathParams,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Response> {
    dispatch(&state, Operation::PutRevision, path, &headers, BTreeMap::new(), body).await
}

async fn dispatch(
    state: &AppState,
    op: Operation,
    mut path: HashMap<String, String>,
    headers: &HeaderMap,
    query: BTreeMap<String, String>,
    body: Bytes,
) -> ServerResult<Response> {
    let params = RequestParams {
        domain: path.remove("domain").unwrap_or_default(),
        bucket: path.remove("bucket").unwrap_or_default(),
        key: path.remove("key"),
        revision: path.remove("revision"),
        tid: path.remove("tid"),
    };
    let req = Request {
        params,
        headers: adapt_headers(headers),
        query,
        body: if body.is_empty() { Body::Empty } else { Body::Bytes(body) },
    };
    tracing::debug!(operation = %op, domain = %req.params.domain, bucket = %req.params.bucket, "dispatching");
    let res = state.bucket.handle(op, &req).await?;
    into_http(res)
}

/// Copy inbound headers, dropping the ones that describe this hop's framing.
fn adapt_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter(|(name, _)| !matches!(name.as_str(), "content-length" | "host" | "transfer-encoding"))
        .filter_map(|(name, value)| Some((name.as_str(), value.to_str().ok()?.to_string())))
        .collect()
}

fn into_http(res: keyrev_types::Response) -> ServerResult<Response> {
    let status = StatusCode::from_u16(res.status)
        .map_err(|_| ServerError::Internal(format!("invalid status {}", res.status)))?;
    let is_json = matches!(res.body, Body::Json(_));
    let payload = res
        .body
        .to_bytes()
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    let mut out = Response::new(HttpBody::from(payload));
    *out.status_mut() = status;
    for (name, value) in res.headers.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        let value = HeaderValue::from_str(value).map_err(|e| ServerError::Internal(e.to_string()))?;
        out.headers_mut().insert(name, value);
    }
    if is_json && !res.headers.contains(CONTENT_TYPE) {
        out.headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    Ok(out)
}
