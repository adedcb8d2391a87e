//! HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures tracing middleware, and defines the
//! shared state injected into handlers.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::observability;
use crate::service::ConfigService;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ConfigService>,
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route(
            "/v1/auth/config",
            axum::routing::get(api::config::read_config)
                .post(api::config::write_config)
                .put(api::config::write_config),
        )
        .route(
            "/v1/auth/config/fields",
            axum::routing::get(api::config::list_fields),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
