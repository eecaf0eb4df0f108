use axum::{
    extract::{DefaultBodyLimit, Request},
    http::{header, HeaderName, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::handlers::{analyze, health_check, index};
use crate::state::AppState;

pub fn create_routes(state: &AppState) -> Router<AppState> {
    let server_config = &state.config.server_config;

    Router::new()
        .route("/", get(index))
        .route("/analyze", post(analyze))
        .route("/api/health", get(health_check))
        // Static file serving
        .nest_service("/static", ServeDir::new(&server_config.static_dir))
        .layer(DefaultBodyLimit::max(server_config.max_upload_bytes))
}

/// Full application: routes, CORS and request tracing, bound to `state`.
pub fn build_app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server_config);
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %Uuid::new_v4(),
        )
    });

    Router::new()
        .merge(create_routes(&state))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}

fn cors_layer(server_config: &ServerConfig) -> CorsLayer {
    let origins = &server_config.cors_allowed_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([HeaderName::from_static("x-requested-with"), header::CONTENT_TYPE])
}
