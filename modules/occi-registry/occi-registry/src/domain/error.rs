//! Domain error types for the OCCI Registry module.

use occi_registry_sdk::{OcciRegistryError, StatusCode};
use thiserror::Error;

use super::repo::StoreError;

/// Domain-level errors for the OCCI Registry module.
///
/// Every registry operation reports its outcome through this type; the
/// closed [`StatusCode`] vocabulary is recovered with [`DomainError::status`].
#[derive(Error, Debug)]
pub enum DomainError {
    /// The identifier or location collides with an existing one.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A referenced category or document is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The document exists but the caller did not create it.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request cannot be applied as a whole.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The store failed or returned data that could not be decoded.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    /// Creates a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Returns the status code reported for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::Conflict,
            Self::NotFound(_) => StatusCode::NotFound,
            Self::Forbidden(_) => StatusCode::Forbidden,
            Self::BadRequest(_) => StatusCode::BadRequest,
            Self::Internal(_) => StatusCode::InternalError,
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(key) => Self::Conflict(format!("store rejected the write on {key}")),
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl From<DomainError> for OcciRegistryError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::Conflict(msg) => Self::conflict(msg),
            DomainError::NotFound(msg) => Self::not_found(msg),
            DomainError::Forbidden(msg) => Self::forbidden(msg),
            DomainError::BadRequest(msg) => Self::bad_request(msg),
            DomainError::Internal(e) => Self::internal(e.to_string()),
        }
    }
}
