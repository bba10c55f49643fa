use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use serde_json::json;
use tracing::info;

/// Peers TCP-probe this port; answering HTTP on it is a bonus.
#[get("/health")]
async fn health_route() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "healthy" }))
}

/// Serve the agent health endpoint until the process is signalled.
pub async fn serve(port: u16) -> std::io::Result<()> {
    info!(port, "agent health endpoint listening");
    HttpServer::new(|| App::new().service(health_route)).bind(("0.0.0.0", port))?.run().await
}
