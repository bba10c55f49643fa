use actix_web::{HttpResponse, Responder, get};
use serde_json::json;

/// Liveness of the observer itself.
#[get("/health")]
pub async fn health_route() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}
