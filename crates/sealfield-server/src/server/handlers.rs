//! Axum request handlers for all service endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use common::{
    protocol::{
        DecodeRequest, DecodeResponse, DiffIndexRequest, EncodeRequest, ErrorResponse,
        HealthResponse, LookupRequest, LookupResponse, PlanIndexRequest, PlanIndexResponse,
        ReencodeRequest, StoredResponse,
    },
    ServiceError,
};
use sealfield::{IndexCatalog, IndexDefinition, IndexDiff, IndexPolicy, LookupValue};
use serde_json::Value;
use tracing::debug;

use super::{error::ApiError, state::AppState};
use crate::registry::RegisteredField;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// `POST /fields/:name/encode`: encrypt a value for storage.
///
/// `null` passes through as `null`.
pub async fn encode(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<EncodeRequest>,
) -> ApiResult<StoredResponse> {
    let field = state.field(&name)?;
    if req.value.is_null() {
        return Ok(Json(StoredResponse { stored: None }));
    }
    let canonical = canonical(&name, &field, &req.value)?;
    let stored = field.codec.encode_for_storage(&canonical)?;
    debug!(field = %name, len = stored.len(), "encoded value");
    Ok(Json(StoredResponse {
        stored: Some(URL_SAFE_NO_PAD.encode(stored)),
    }))
}

/// `POST /fields/:name/decode`: decrypt a stored value.
pub async fn decode(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<DecodeRequest>,
) -> ApiResult<DecodeResponse> {
    let field = state.field(&name)?;
    let Some(stored) = req.stored else {
        return Ok(Json(DecodeResponse { value: Value::Null }));
    };
    let plaintext = field.codec.decode_from_storage(&from_base64(&stored)?)?;
    let value = field.kind.to_json(&plaintext)?;
    Ok(Json(DecodeResponse { value }))
}

/// `POST /fields/:name/reencode`: rewrite a stored value under the field's
/// current primary key.
pub async fn reencode(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<ReencodeRequest>,
) -> ApiResult<StoredResponse> {
    let field = state.field(&name)?;
    let stored = field.codec.reencode(&from_base64(&req.stored)?)?;
    debug!(field = %name, "re-encoded value");
    Ok(Json(StoredResponse {
        stored: Some(URL_SAFE_NO_PAD.encode(stored)),
    }))
}

/// `POST /fields/:name/lookup`: turn a lookup value into the digests a
/// query compares against the stored prefix.
pub async fn lookup(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<LookupRequest>,
) -> ApiResult<LookupResponse> {
    let field = state.field(&name)?;
    // Reject the operator before the value is read as the field's kind.
    field.codec.check_lookup(&req.operator)?;

    let canonicals = match &req.value {
        Value::Array(items) => items
            .iter()
            .map(|v| canonical(&name, &field, v))
            .collect::<Result<Vec<_>, _>>()?,
        single => vec![canonical(&name, &field, single)?],
    };
    let value = if req.value.is_array() {
        LookupValue::Many(canonicals.iter().map(Vec::as_slice).collect())
    } else {
        LookupValue::Single(&canonicals[0])
    };

    let digests = field
        .codec
        .transform_lookup_value(&req.operator, value)?
        .into_digests()
        .iter()
        .map(|d| URL_SAFE_NO_PAD.encode(d.as_bytes()))
        .collect();
    Ok(Json(LookupResponse { digests }))
}

/// `POST /fields/:name/index/plan`: the prefix index a field needs.
pub async fn plan_index(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(req): Json<PlanIndexRequest>,
) -> ApiResult<PlanIndexResponse> {
    let field = state.field(&name)?;
    let index = IndexPolicy::plan(field.spec(), &req.table, &req.column);
    Ok(Json(PlanIndexResponse { index }))
}

/// `POST /index/diff`: schema changes for a column whose index intent
/// changes, checked against the indexes the caller reports as present.
pub async fn diff_index(Json(req): Json<DiffIndexRequest>) -> Json<IndexDiff> {
    let catalog = ReportedIndexes(req.existing);
    Json(IndexPolicy::diff_intents(
        req.old,
        req.new,
        &req.table,
        &req.column,
        &catalog,
    ))
}

/// `GET /health`: liveness and readiness check.
///
/// Returns `200 OK` when at least one field is registered, and
/// `503 Service Unavailable` otherwise.
pub async fn health(State(state): State<AppState>) -> Response {
    let fields_loaded = state.registry.len();

    let (status_code, status_str) = if fields_loaded > 0 {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    let body = HealthResponse {
        status: status_str.into(),
        fields_loaded,
    };
    (status_code, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index catalog backed by the list the caller sent with the request.
struct ReportedIndexes(Vec<IndexDefinition>);

impl IndexCatalog for ReportedIndexes {
    fn list_indexes(&self, table: &str) -> Vec<IndexDefinition> {
        self.0.iter().filter(|i| i.table == table).cloned().collect()
    }
}

fn canonical(name: &str, field: &RegisteredField, value: &Value) -> Result<Vec<u8>, ServiceError> {
    field.kind.canonical(value).ok_or_else(|| {
        ServiceError::BadRequest(format!("{value} is not a valid {:?} value for {name}", field.kind))
    })
}

fn from_base64(stored: &str) -> Result<Vec<u8>, ServiceError> {
    URL_SAFE_NO_PAD
        .decode(stored)
        .map_err(|e| ServiceError::BadRequest(format!("stored value is not base64: {e}")))
}
