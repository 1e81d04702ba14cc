//! Request and response types exchanged with the `sealfield` service.
//!
//! Binary values (stored bytes, digests) travel as URL-safe base64 without
//! padding. Field values are JSON scalars interpreted by the field's kind.

use sealfield::{IndexDefinition, IndexIntent};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Encode / decode
// ---------------------------------------------------------------------------

/// Request body for `POST /fields/:name/encode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeRequest {
    /// Value to encrypt. `null` is stored as NULL.
    pub value: serde_json::Value,
}

/// Response body for `POST /fields/:name/encode` and `/reencode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    /// Base64 stored bytes, or `null` for NULL.
    pub stored: Option<String>,
}

/// Request body for `POST /fields/:name/decode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeRequest {
    /// Base64 stored bytes, or `null` for NULL.
    pub stored: Option<String>,
}

/// Response body for `POST /fields/:name/decode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodeResponse {
    /// Decrypted value, typed per the field's kind.
    pub value: serde_json::Value,
}

/// Request body for `POST /fields/:name/reencode`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReencodeRequest {
    /// Base64 stored bytes written under any key of the field.
    pub stored: String,
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

/// Request body for `POST /fields/:name/lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRequest {
    /// ORM-style operator name, e.g. `"exact"` or `"in"`.
    pub operator: String,
    /// A scalar for `exact`, an array for `in`.
    pub value: serde_json::Value,
}

/// Response body for `POST /fields/:name/lookup`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResponse {
    /// Base64 digests to compare with the first 32 stored bytes.
    pub digests: Vec<String>,
}

// ---------------------------------------------------------------------------
// Index planning
// ---------------------------------------------------------------------------

/// Request body for `POST /fields/:name/index/plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanIndexRequest {
    /// Table holding the column.
    pub table: String,
    /// Column storing the field.
    pub column: String,
}

/// Response body for `POST /fields/:name/index/plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanIndexResponse {
    /// The prefix index the field needs, if any.
    pub index: Option<IndexDefinition>,
}

/// Request body for `POST /index/diff`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffIndexRequest {
    /// Intent of the column before the change.
    pub old: IndexIntent,
    /// Intent of the column after the change.
    pub new: IndexIntent,
    /// Table holding the column.
    pub table: String,
    /// Column storing the field.
    pub column: String,
    /// Indexes currently present on the table, as listed by the schema layer.
    #[serde(default)]
    pub existing: Vec<IndexDefinition>,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: `"ok"` or `"degraded"`.
    pub status: String,
    /// Number of field definitions currently registered.
    pub fields_loaded: usize,
}
