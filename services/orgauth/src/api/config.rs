//! Config API handlers.
//!
//! # Purpose and responsibility
//! HTTP surface for writing, reading, and describing the backend config.
//!
//! # Key invariants and assumptions
//! - Write bodies are JSON objects. Keys outside the declared field set are
//!   ignored and reported back as a warning.
//! - A read of a never-written config is a 404, not an error.
//!
//! # Security considerations
//! - The lookup credential is never accepted from the body; a
//!   `token`-like key would simply be reported as unrecognized.
use crate::api::error::{ApiError, api_not_found, api_validation_error};
use crate::api::types::{FieldListResponse, WriteResponse};
use crate::app::AppState;
use crate::model::{ConfigView, ConfigWriteRequest};
use crate::schema::{config_fields, unknown_fields};
use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value};

#[utoipa::path(
    get,
    path = "/v1/auth/config",
    tag = "config",
    responses(
        (status = 200, description = "Current config", body = ConfigView),
        (status = 404, description = "No config written yet"),
        (status = 500, description = "Storage failure")
    )
)]
/// Return the stored config with effective TTLs.
pub(crate) async fn read_config(State(state): State<AppState>) -> Result<Json<ConfigView>, ApiError> {
    match state.service.read().await? {
        Some(view) => Ok(Json(view)),
        None => Err(api_not_found("config not found")),
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/config",
    tag = "config",
    request_body = ConfigWriteRequest,
    responses(
        (status = 204, description = "Config written"),
        (status = 200, description = "Config written with warnings", body = WriteResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Concurrent modification"),
        (status = 500, description = "Lookup or storage failure")
    )
)]
/// Merge the supplied fields into the stored config.
///
/// # Errors
/// - 400 for malformed bodies and validation failures.
/// - 409 when concurrent writers kept winning the race.
/// - 500 when the organization lookup or storage fails.
pub(crate) async fn write_config(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(|rejection| api_validation_error(&rejection.body_text()))?;

    let mut warnings = Vec::new();
    let unknown = unknown_fields(body.keys());
    if !unknown.is_empty() {
        tracing::warn!(fields = ?unknown, "ignoring unrecognized config parameters");
        warnings.push(format!(
            "ignoring unrecognized parameters: {}",
            unknown.join(", ")
        ));
    }

    let request: ConfigWriteRequest = serde_json::from_value(Value::Object(body))
        .map_err(|err| api_validation_error(&format!("invalid request body: {err}")))?;
    let outcome = state.service.write(&request).await?;
    warnings.extend(outcome.warnings);

    if warnings.is_empty() {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Ok((StatusCode::OK, Json(WriteResponse { warnings })).into_response())
    }
}

#[utoipa::path(
    get,
    path = "/v1/auth/config/fields",
    tag = "config",
    responses(
        (status = 200, description = "Recognized config fields", body = FieldListResponse)
    )
)]
/// List the fields the write endpoint recognizes.
pub(crate) async fn list_fields() -> Json<FieldListResponse> {
    Json(FieldListResponse {
        items: config_fields().values().cloned().collect(),
    })
}
