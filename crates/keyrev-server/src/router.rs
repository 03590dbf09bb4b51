use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use axum::Router;
use keyrev_bucket::ArchivalBucket;
use tower_http::trace::TraceLayer;

use crate::handler;

const BUCKET: &str = "/:domain/sys/key_rev_latest_value/:bucket";

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub bucket: ArchivalBucket,
}

/// Build the axum router with all bucket endpoints.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(BUCKET, put(handler::create_bucket))
        .route(&format!("{BUCKET}/"), put(handler::create_bucket))
        .route(
            &format!("{BUCKET}/:key"),
            get(handler::get_revision).put(handler::put_revision),
        )
        .route(&format!("{BUCKET}/:key/"), get(handler::list_revisions))
        .route(&format!("{BUCKET}/:key/:revision"), get(handler::get_revision))
        .route(&format!("{BUCKET}/:key/:revision/:tid"), get(handler::get_revision))
        .fallback(handler::not_found_handler)
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
