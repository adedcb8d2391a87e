//! OpenAPI schema aggregation for the config API.
use crate::api::types::{ErrorResponse, FieldListResponse, HealthStatus, WriteResponse};
use crate::api::{config, system};
use crate::model::{ConfigView, ConfigWriteRequest};
use orgauth_tokenutil::{FieldSchema, FieldType, TokenFieldsInput, TokenParamsView, TokenType};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "orgauth",
        version = "v1",
        description = "Organization-scoped auth backend configuration API"
    ),
    paths(
        system::system_health,
        config::read_config,
        config::write_config,
        config::list_fields
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        WriteResponse,
        FieldListResponse,
        FieldSchema,
        FieldType,
        ConfigView,
        ConfigWriteRequest,
        TokenFieldsInput,
        TokenParamsView,
        TokenType
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "config", description = "Auth backend configuration")
    )
)]
pub struct ApiDoc;
