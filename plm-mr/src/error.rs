//! Error types for plm-mr
//!
//! Per-service errors live next to their services. `MrError` is the fatal
//! class: anything that aborts a run or a command.

use crate::db::songs::CatalogStoreError;
use thiserror::Error;

/// Crate-level error
#[derive(Debug, Error)]
pub enum MrError {
    /// Catalog store failure that prevents the run from continuing
    #[error("Catalog store error: {0}")]
    Catalog(#[from] CatalogStoreError),

    /// Invalid input supplied by the caller
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Run cancelled by the caller
    #[error("Run cancelled")]
    Cancelled,

    /// Worker task failed
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// plm-common error
    #[error("Common error: {0}")]
    Common(#[from] plm_common::Error),
}

impl MrError {
    /// Stable code recorded in run errors
    pub fn code(&self) -> &'static str {
        match self {
            MrError::Catalog(_) => "CATALOG_READ",
            MrError::BadRequest(_) => "BAD_REQUEST",
            MrError::Cancelled => "CANCELLED",
            MrError::Internal(_) => "INTERNAL_ERROR",
            MrError::Io(_) => "IO_ERROR",
            MrError::Serialization(_) => "SERIALIZATION_ERROR",
            MrError::Common(_) => "COMMON_ERROR",
        }
    }
}

/// Result type for plm-mr operations
pub type MrResult<T> = Result<T, MrError>;
