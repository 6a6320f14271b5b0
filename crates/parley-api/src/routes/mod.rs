pub mod health;
pub mod root;
pub mod threads;

use std::sync::Arc;
use std::time::Duration;

use axum::{http::Method, middleware, routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Config, docs::ApiDoc, middleware::logging, state::AppState};

pub fn build_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    let mut api_routes = Router::new()
        .route("/", get(root::index))
        .route("/health", get(health::health_check))
        .route("/threads", get(threads::list_threads))
        .route("/threads/:thread_id", get(threads::get_thread));

    // Assets are only mounted when the frontend was built into place
    if config.frontend.dir.is_dir() {
        tracing::info!(dir = %config.frontend.dir.display(), "Serving frontend assets");
        api_routes = api_routes.nest_service("/static", ServeDir::new(&config.frontend.dir));
    } else {
        tracing::info!(dir = %config.frontend.dir.display(), "Frontend directory not found, skipping static assets");
    }

    Router::new()
        .merge(api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(logging::log_request))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if !config.cors.enabled {
        return CorsLayer::new();
    }

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers(Any);

    if config.cors.origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let parsed_origins: Vec<axum::http::HeaderValue> = config
            .cors
            .origins
            .iter()
            .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
            .collect();

        cors.allow_origin(parsed_origins)
    }
}
