use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::{error::ApiResult, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the health status of the API and its dependencies
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service status", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<HealthResponse>> {
    let mut services = HashMap::new();

    let database = match state.threads.ping().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Database health check failed: {}", e);
            "disconnected"
        }
    };
    services.insert("database".to_string(), database.to_string());

    let cache = match state.cache.ping().await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::warn!("Cache health check failed: {}", e);
            "disconnected"
        }
    };
    services.insert("cache".to_string(), cache.to_string());

    let agent = match state.agent().await {
        Ok(graph) => {
            tracing::debug!(model = %graph.model.model, "Agent ready");
            "ready"
        }
        Err(e) => {
            tracing::warn!("Agent unavailable: {}", e);
            "unavailable"
        }
    };
    services.insert("agent".to_string(), agent.to_string());

    let status = if database == "connected" && agent == "ready" {
        "healthy"
    } else {
        "degraded"
    };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    }))
}
