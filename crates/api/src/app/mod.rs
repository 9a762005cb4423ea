//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: repositories, token service, password hashing
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: response shapes and body parsing helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn, routing::get};
use tower::ServiceBuilder;

use crate::config::AppConfig;
use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> anyhow::Result<Router> {
    let services = Arc::new(services::build_services(&config).await?);
    Ok(build_router(services))
}

/// Router over already-built services. Tests use this to inject stores.
pub fn build_router(services: Arc<services::AppServices>) -> Router {
    let auth = AuthState {
        jwt: services.jwt.clone(),
        users: services.users.clone(),
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/users", routes::users::router(auth.clone()))
        .nest("/api/cards", routes::cards::router(auth))
        .fallback(routes::system::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(middleware::log_failed_requests))
                .layer(Extension(services)),
        )
}
