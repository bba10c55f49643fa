use actix_web::{HttpResponse, post, web};
use meshcheck::AgentDescriptor;
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

/// Agent heartbeat: upsert the liveness record and bump the global
/// version counter.
#[post("/heartbeat")]
pub async fn heartbeat(
    state: web::Data<AppState>,
    descriptor: web::Json<AgentDescriptor>,
) -> Result<HttpResponse, AppError> {
    let descriptor = descriptor.into_inner();
    let agent_name = descriptor.agent_name.clone();
    let version = state.registry.upsert(descriptor)?;

    debug!(agent = %agent_name, version, "heartbeat accepted");
    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "version": version,
    })))
}
