use keyrev_types::StoreUri;

/// Errors returned by the storage RPC interface.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The addressed store, key, or revision does not exist.
    #[error("not found: {uri}")]
    NotFound { uri: String },

    /// The storage engine answered with a non-2xx status.
    #[error("storage returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// No response was obtained from the storage engine.
    #[error("transport error: {0}")]
    Transport(String),

    /// The URI does not address anything the engine understands.
    #[error("invalid uri {uri}: {reason}")]
    InvalidUri { uri: String, reason: String },
}

impl StoreError {
    pub fn not_found(uri: &StoreUri) -> Self {
        Self::NotFound {
            uri: uri.to_string(),
        }
    }

    pub fn invalid_uri(uri: &StoreUri, reason: impl Into<String>) -> Self {
        Self::InvalidUri {
            uri: uri.to_string(),
            reason: reason.into(),
        }
    }

    /// HTTP status carried by the error.
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Upstream { status, .. } => *status,
            Self::Transport(_) => 502,
            Self::InvalidUri { .. } => 400,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == 404
    }
}

/// Result alias for storage RPC calls.
pub type StoreResult<T> = Result<T, StoreError>;
