use actix_web::{HttpResponse, Responder, get, web};
use serde_json::json;

use crate::state::AppState;

/// Deduplicated node addresses of all live agents.
#[get("/hosts")]
pub async fn hosts(state: web::Data<AppState>) -> impl Responder {
    let host_addrs = state.registry.host_addresses();
    HttpResponse::Ok().json(json!({
        "count": host_addrs.len(),
        "host_addrs": host_addrs,
    }))
}

/// Deduplicated agent addresses of all live agents.
#[get("/agents")]
pub async fn agents(state: web::Data<AppState>) -> impl Responder {
    let agent_addrs = state.registry.agent_addresses();
    HttpResponse::Ok().json(json!({
        "count": agent_addrs.len(),
        "agent_addrs": agent_addrs,
    }))
}

/// Heuristic count of currently active agents.
#[get("/agents/count")]
pub async fn active_count(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "active_agents": state.registry.active_count(),
        "version": state.registry.current_version(),
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, test};
    use chrono::Utc;
    use meshcheck::{AgentDescriptor, LivenessRegistry, ResultStore};

    use super::*;

    #[actix_web::test]
    async fn directory_lists_live_agents() {
        let registry = Arc::new(LivenessRegistry::default());
        for i in 0..2 {
            registry
                .upsert(AgentDescriptor {
                    namespace: "fleet".into(),
                    node_addr: "10.0.0.1".into(),
                    agent_addr: format!("10.1.0.{i}"),
                    agent_name: format!("agent-{i}"),
                    observed_at: Utc::now(),
                })
                .unwrap();
        }
        let state = web::Data::new(AppState { registry, store: Arc::new(ResultStore::new()) });

        let app = test::init_service(
            App::new().app_data(state).service(hosts).service(agents).service(active_count),
        )
        .await;

        let body: serde_json::Value =
            test::call_and_read_body_json(&app, test::TestRequest::get().uri("/hosts").to_request())
                .await;
        assert_eq!(body["count"], 1); // both agents share one node

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/agents").to_request(),
        )
        .await;
        assert_eq!(body["count"], 2);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get().uri("/agents/count").to_request(),
        )
        .await;
        assert_eq!(body["active_agents"], 2); // versions 1,2 both within the window
    }
}
