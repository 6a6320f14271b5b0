use utoipa::OpenApi;

use crate::routes::{health, root, threads};

#[derive(OpenApi)]
#[openapi(
    paths(
        root::index,
        health::health_check,
        threads::list_threads,
        threads::get_thread,
    ),
    components(schemas(
        root::StatusResponse,
        health::HealthResponse,
        threads::ThreadResponse,
    )),
    tags(
        (name = "root", description = "Frontend entry"),
        (name = "threads", description = "Conversation threads"),
        (name = "health", description = "Service health")
    )
)]
pub struct ApiDoc;
