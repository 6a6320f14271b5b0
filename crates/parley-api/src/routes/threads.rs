use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use parley_persist::Thread;
use crate::{error::{ApiError, ApiResult}, state::AppState};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ThreadResponse {
    pub id: String,
    pub chat_name: String,
    /// ISO-8601 timestamp as written by the agent engine, or the read time
    pub last_activity_time: String,
}

/// List conversation threads
///
/// One entry per distinct thread id found in the checkpoint store. Order is
/// not guaranteed.
#[utoipa::path(
    get,
    path = "/threads",
    responses(
        (status = 200, description = "Thread directory", body = Vec<ThreadResponse>),
        (status = 500, description = "Storage error")
    ),
    tag = "threads"
)]
pub async fn list_threads(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ThreadResponse>>> {
    let threads = state.threads.list_threads().await?;

    tracing::debug!(count = threads.len(), "Listed threads");

    Ok(Json(threads.into_iter().map(thread_to_response).collect()))
}

/// Get a single thread
///
/// Directory entry only; the conversation messages live with the agent engine.
#[utoipa::path(
    get,
    path = "/threads/{thread_id}",
    params(("thread_id" = String, Path, description = "Thread identifier")),
    responses(
        (status = 200, description = "Thread found", body = ThreadResponse),
        (status = 400, description = "Blank thread_id"),
        (status = 404, description = "Thread not found")
    ),
    tag = "threads"
)]
pub async fn get_thread(
    State(state): State<Arc<AppState>>,
    Path(thread_id): Path<String>,
) -> ApiResult<Json<ThreadResponse>> {
    let thread_id = thread_id.trim();
    if thread_id.is_empty() {
        return Err(ApiError::BadRequest("thread_id is required".to_string()));
    }

    let thread = state
        .threads
        .get_thread(thread_id)
        .await?
        .ok_or_else(|| ApiError::ThreadNotFound(thread_id.to_string()))?;

    Ok(Json(thread_to_response(thread)))
}

fn thread_to_response(thread: Thread) -> ThreadResponse {
    ThreadResponse {
        id: thread.id,
        chat_name: thread.chat_name,
        last_activity_time: thread.last_activity_time,
    }
}
