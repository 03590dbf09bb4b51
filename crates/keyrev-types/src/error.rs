use thiserror::Error;

/// Errors produced by type conversions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid bucket configuration: {0}")]
    InvalidConfig(String),

    #[error("body is not valid JSON: {0}")]
    InvalidJson(String),
}
