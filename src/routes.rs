use crate::{
    api::{employee, leave_request},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, error::InternalError, web};
use anyhow::anyhow;
use serde_json::json;

pub type RateLimit = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter shared by every worker.
pub fn build_limiter(requests_per_min: u32) -> anyhow::Result<RateLimit> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Invalid rate limit: {} requests per minute", requests_per_min))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &RateLimit) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .configure(api_routes),
    );
}

fn bad_request_body(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(json!({ "message": message }))
}

/// Every API route, relative to the API prefix.
pub fn api_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, bad_request_body(message)).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        let message = err.to_string();
        InternalError::from_response(err, bad_request_body(message)).into()
    }))
    .service(
        web::scope("/leave-requests")
            // /leave-requests
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::list_leave_requests))
                    .route(web::post().to(leave_request::create_leave_request)),
            )
            // fixed paths before /{id}
            .service(
                web::resource("/filter").route(web::get().to(leave_request::filter_leave_requests)),
            )
            .service(
                web::resource("/violations").route(web::get().to(leave_request::leave_violations)),
            )
            // /leave-requests/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave_request))
                    .route(web::put().to(leave_request::update_leave_request))
                    .route(web::delete().to(leave_request::delete_leave_request)),
            ),
    )
    .service(
        web::scope("/employees")
            .service(web::resource("").route(web::get().to(employee::list_employees)))
            .service(web::resource("/{id}").route(web::get().to(employee::get_employee))),
    );
}
