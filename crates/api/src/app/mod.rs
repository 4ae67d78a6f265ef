//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: directory, encoder, token service, notification transport, background tasks
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `extract.rs`: JSON body extractor with the API error shape
//! - `errors.rs`: domain error → HTTP response mapping

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Also starts the background work the config asks for: demo seeding and the
/// periodic purge.
pub async fn build_app(config: &AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(config)?);

    if config.seed_demo_users {
        let seeded = services::seed_demo_users(&services)
            .await
            .context("failed to seed demo users")?;
        tracing::info!(seeded, "demo users seeded");
    }

    if let Some(every) = config.purge_interval {
        services::spawn_purge_task(services.clone(), every);
    }

    let auth_state = middleware::AuthState {
        gate: services.gate().clone(),
    };

    // Protected routes: require a valid bearer token.
    let protected = routes::users::router()
        .merge(routes::admin::router())
        .layer(axum::middleware::from_fn_with_state(auth_state, middleware::auth_middleware));

    Ok(Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::auth::router())
        .merge(protected)
        .layer(Extension(services))
        .layer(ServiceBuilder::new()))
}
