use std::sync::Arc;

use keyrev_bucket::ArchivalBucket;
use keyrev_store::StorageRpc;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::{build_router, AppState};

/// Serves one [`ArchivalBucket`] over HTTP.
///
/// Store naming and gzip level come from `config.archival`; every route
/// rejects bodies larger than `config.max_body_bytes`.
pub struct KeyrevServer {
    config: ServerConfig,
    bucket: ArchivalBucket,
}

impl KeyrevServer {
    pub fn new(config: ServerConfig, rpc: Arc<dyn StorageRpc>) -> Self {
        let bucket = ArchivalBucket::with_config(rpc, &config.archival);
        Self { config, bucket }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn bucket(&self) -> &ArchivalBucket {
        &self.bucket
    }

    /// Routes bound to this server's bucket, without a listener.
    pub fn router(&self) -> axum::Router {
        let state = AppState {
            bucket: self.bucket.clone(),
        };
        build_router(state, self.config.max_body_bytes)
    }

    /// Bind `config.bind_addr` and serve until the listener fails.
    pub async fn serve(self) -> ServerResult<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_on(listener).await
    }

    /// Serve on an already-bound listener.
    pub async fn serve_on(self, listener: TcpListener) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        let app = self.router();
        info!(
            %addr,
            latest_suffix = %self.config.archival.latest_suffix,
            "keyrev server listening"
        );
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
