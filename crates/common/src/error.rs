//! Common error types shared across crates.

use sealfield::FieldError;
use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::UnsupportedLookup`] → 400
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::Undecryptable`] → 422
/// - [`ServiceError::Unavailable`] → 503
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed: bad base64, a value of the wrong type, invalid JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The lookup operator cannot be answered for this field.
    #[error("unsupported lookup: {0}")]
    UnsupportedLookup(String),

    /// No field is registered under the requested name.
    #[error("not found: {0}")]
    NotFound(String),

    /// The stored value did not verify under any key of the field.
    #[error("undecryptable: {0}")]
    Undecryptable(String),

    /// The field registry is not loaded yet.
    #[error("service unavailable: {0}")]
    Unavailable(String),

    /// An unexpected internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::UnsupportedLookup(_) => 400,
            ServiceError::NotFound(_) => 404,
            ServiceError::Undecryptable(_) => 422,
            ServiceError::Unavailable(_) => 503,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable code for error response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::UnsupportedLookup(_) => "unsupported_lookup",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Undecryptable(_) => "undecryptable",
            ServiceError::Unavailable(_) => "service_unavailable",
            ServiceError::Internal(_) => "internal_error",
        }
    }
}

impl From<FieldError> for ServiceError {
    fn from(e: FieldError) -> Self {
        match e {
            FieldError::Decryption => ServiceError::Undecryptable(e.to_string()),
            FieldError::UnsupportedLookup { .. } => ServiceError::UnsupportedLookup(e.to_string()),
            FieldError::Value { .. } => ServiceError::Undecryptable(e.to_string()),
            FieldError::Configuration(_) | FieldError::InvalidKey(_) => {
                ServiceError::Internal(e.to_string())
            }
        }
    }
}
