use actix_web::{HttpResponse, Responder, get, web};

use crate::state::AppState;

/// Aggregated connectivity report across the whole fleet.
#[get("/report")]
pub async fn report(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(meshcheck::report::generate(&state.registry, &state.store))
}
