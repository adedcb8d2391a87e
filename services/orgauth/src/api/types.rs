//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the payload shapes shared by the config API handlers and the
//! OpenAPI document.
use orgauth_tokenutil::FieldSchema;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub backend: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// Body of a successful write that produced warnings.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct WriteResponse {
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct FieldListResponse {
    pub items: Vec<FieldSchema>,
}
