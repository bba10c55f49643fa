use actix_web::{HttpResponse, Responder, get, post, web};
use meshcheck::ConnectivityResult;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResultsRequest {
    pub source_addr: String,
    pub results: Vec<ConnectivityResult>,
}

#[derive(Debug, Deserialize)]
pub struct ServiceResultRequest {
    pub source_addr: String,
    pub result: ConnectivityResult,
}

fn saved() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "success" }))
}

#[post("/test-results/hosts")]
pub async fn save_host_results(
    state: web::Data<AppState>,
    request: web::Json<ResultsRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    state.store.save_host_results(&request.source_addr, &request.results)?;
    debug!(source = %request.source_addr, count = request.results.len(), "host results saved");
    Ok(saved())
}

#[get("/test-results/hosts")]
pub async fn get_host_results(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "results": state.store.host_results() }))
}

#[post("/test-results/agents")]
pub async fn save_agent_results(
    state: web::Data<AppState>,
    request: web::Json<ResultsRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    state.store.save_agent_results(&request.source_addr, &request.results)?;
    debug!(source = %request.source_addr, count = request.results.len(), "agent results saved");
    Ok(saved())
}

#[get("/test-results/agents")]
pub async fn get_agent_results(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "results": state.store.agent_results() }))
}

#[post("/test-results/service")]
pub async fn save_service_result(
    state: web::Data<AppState>,
    request: web::Json<ServiceResultRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    state.store.save_service_result(&request.source_addr, request.result)?;
    debug!(source = %request.source_addr, "service result saved");
    Ok(saved())
}

#[get("/test-results/service")]
pub async fn get_service_results(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({ "results": state.store.service_results() }))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{App, test};
    use chrono::Utc;
    use meshcheck::models::{PingStatus, PortState};
    use meshcheck::{LivenessRegistry, ResultStore};

    use super::*;

    fn state() -> web::Data<AppState> {
        web::Data::new(AppState {
            registry: Arc::new(LivenessRegistry::default()),
            store: Arc::new(ResultStore::new()),
        })
    }

    fn result(target: &str) -> ConnectivityResult {
        let mut ports = BTreeMap::new();
        ports.insert(22u16, PortState::Open);
        ConnectivityResult {
            source_addr: "10.0.0.1".into(),
            target_addr: target.into(),
            ping_status: PingStatus::Reachable,
            port_status: ports,
            latency: Duration::from_millis(2),
            test_duration: Duration::from_millis(50),
            observed_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn second_save_replaces_first_snapshot() {
        let state = state();
        let app = test::init_service(
            App::new().app_data(state.clone()).service(save_host_results),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/test-results/hosts")
            .set_json(json!({
                "source_addr": "10.0.0.1",
                "results": [result("10.0.0.2"), result("10.0.0.3")],
            }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let req = test::TestRequest::post()
            .uri("/test-results/hosts")
            .set_json(json!({ "source_addr": "10.0.0.1", "results": [result("10.0.0.4")] }))
            .to_request();
        assert!(test::call_service(&app, req).await.status().is_success());

        let snapshot = state.store.host_results();
        assert_eq!(snapshot["10.0.0.1"].len(), 1);
        assert!(snapshot["10.0.0.1"].contains_key("10.0.0.4"));
    }

    #[actix_web::test]
    async fn empty_source_is_rejected() {
        let app =
            test::init_service(App::new().app_data(state()).service(save_agent_results)).await;

        let req = test::TestRequest::post()
            .uri("/test-results/agents")
            .set_json(json!({ "source_addr": "", "results": [] }))
            .to_request();
        let response = test::call_service(&app, req).await;

        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }
}
