use actix_web::web;

mod directory;
mod health;
mod heartbeat;
mod report;
mod results;

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health::health_route).service(
        web::scope("/api/v1")
            .service(heartbeat::heartbeat)
            .service(directory::hosts)
            .service(directory::active_count)
            .service(directory::agents)
            .service(results::save_host_results)
            .service(results::get_host_results)
            .service(results::save_agent_results)
            .service(results::get_agent_results)
            .service(results::save_service_result)
            .service(results::get_service_results)
            .service(report::report),
    );
}
