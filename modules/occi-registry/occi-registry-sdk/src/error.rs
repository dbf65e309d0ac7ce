//! Public error types for the `occi-registry` module.
//!
//! These errors are safe to expose to other modules and consumers. Each
//! variant corresponds to one non-OK [`StatusCode`].

use thiserror::Error;

use crate::models::StatusCode;

/// Errors that can be returned by the `OcciRegistryApi`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OcciRegistryError {
    /// The request was malformed or could not be fully applied.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The document exists but the caller is not its creator.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A referenced category or document is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// An identifier or location collides with an existing one.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The store was unreachable or a query failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcciRegistryError {
    /// Creates a `BadRequest` error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Creates a `Forbidden` error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Creates a `Conflict` error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns the status code this error reports.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BadRequest,
            Self::Forbidden(_) => StatusCode::Forbidden,
            Self::NotFound(_) => StatusCode::NotFound,
            Self::Conflict(_) => StatusCode::Conflict,
            Self::Internal(_) => StatusCode::InternalError,
        }
    }

    /// Returns the message without the status prefix.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m) => m,
        }
    }

    #[must_use]
    pub const fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }

    #[must_use]
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
