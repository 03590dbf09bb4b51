//! HTTP route shell for keyrev.
//!
//! Binds the four archival bucket operations to REST routes under
//! `/{domain}/sys/key_rev_latest_value/{bucket}` and adapts HTTP requests
//! and responses to the bucket envelopes. Errors are rendered as JSON
//! problem bodies; anything unexpected becomes a plain 500.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::{build_router, AppState};
pub use server::KeyrevServer;
