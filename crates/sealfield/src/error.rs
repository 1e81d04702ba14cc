//! Error types for the field codec.

use thiserror::Error;

/// Errors produced while defining, encoding, decoding, or querying an
/// encrypted field.
///
/// Messages are safe to surface to operators: they never contain key
/// material, plaintext, or any hint of which key or byte range failed.
#[derive(Debug, Error)]
pub enum FieldError {
    /// Invalid or conflicting field definition. Raised when the field is
    /// defined, never on the encode/decode path.
    #[error("improperly configured field: {0}")]
    Configuration(String),

    /// The token failed authentication under every key in the set, or is
    /// structurally malformed. Deliberately opaque.
    #[error("invalid token or wrong key")]
    Decryption,

    /// A lookup operator the field cannot honour.
    #[error("field {field:?} does not support the {operator:?} lookup")]
    UnsupportedLookup {
        /// Name of the field the lookup targeted.
        field: String,
        /// The offending operator, as given by the caller.
        operator: String,
    },

    /// A raw secret is not usable as a cipher key with derivation disabled.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Decrypted bytes do not parse as the column's logical type.
    #[error("invalid {kind} value in decrypted field")]
    Value {
        /// Logical type that failed to parse (e.g. `"date"`).
        kind: &'static str,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FieldError>;

impl FieldError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        FieldError::Configuration(msg.into())
    }

    pub(crate) fn unsupported(field: &str, operator: &str) -> Self {
        FieldError::UnsupportedLookup {
            field: field.to_owned(),
            operator: operator.to_owned(),
        }
    }
}
