use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::Context;

mod api;
mod config;
mod db;
mod docs;
mod error;
mod filter;
mod model;
mod repository;
mod routes;
mod rules;
mod service;
#[cfg(test)]
mod test_support;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::repository::{InMemoryStore, MySqlStore};
use crate::rules::LeavePolicy;
use crate::service::LeaveService;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

/// Picks MySQL when `DATABASE_URL` is set, the in-memory store otherwise.
async fn build_service(config: &Config) -> anyhow::Result<LeaveService> {
    let policy = LeavePolicy {
        annual_cap_days: config.annual_leave_cap_days,
    };

    let service = match config.database_url.as_deref() {
        Some(url) => {
            let pool = init_db(url, config.db_max_connections)
                .await
                .context("Failed to connect to database")?;
            db::ensure_schema(&pool)
                .await
                .context("Failed to create tables")?;
            if config.seed_data {
                db::seed(&pool).await.context("Failed to seed database")?;
            }

            let store = Arc::new(MySqlStore::new(pool));
            LeaveService::new(store.clone(), store, policy, config.enforce_rules_on_write)
        }
        None => {
            warn!("DATABASE_URL not set, using the in-memory store");

            // employees are seed-only, so they are always loaded
            let store = InMemoryStore::with_employees(db::seed_employees()?);
            if config.seed_data {
                for leave in db::seed_leave_requests()? {
                    store.put(leave);
                }
            }

            let store = Arc::new(store);
            LeaveService::new(store.clone(), store, policy, config.enforce_rules_on_write)
        }
    };

    Ok(service)
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!(
        addr = %config.server_addr,
        enforce_rules_on_write = config.enforce_rules_on_write,
        "Server starting..."
    );

    let service = Data::new(build_service(&config).await?);
    let limiter = routes::build_limiter(config.rate_api_per_min)?;
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(service.clone())
            .configure(|cfg| routes::configure(cfg, &config, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
