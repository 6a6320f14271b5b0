use axum::{
    extract::{Request, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub message: String,
}

impl StatusResponse {
    pub fn online() -> Self {
        Self {
            status: "online".to_string(),
            message: "Chat API is running".to_string(),
        }
    }
}

/// Single-page frontend entry
///
/// Serves `index.html` from the frontend directory as-is; without one the
/// API answers with a plain status object so the backend can run on its own.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Frontend entry page or API status", body = StatusResponse)
    ),
    tag = "root"
)]
pub async fn index(State(state): State<Arc<AppState>>, req: Request) -> Response {
    let index_file = state.config.frontend.index_file();

    if !tokio::fs::try_exists(&index_file).await.unwrap_or(false) {
        return Json(StatusResponse::online()).into_response();
    }

    match ServeFile::new(index_file).oneshot(req).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
