//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: store construction, demo seeding, the SSE change stream
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::{routing::get, Extension, Router};
use secrecy::ExposeSecret;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::config::ApiConfig;
use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: &ApiConfig) -> anyhow::Result<Router> {
    let services = services::build_services(config)
        .await
        .context("failed to initialize the inventory store")?;
    router(services, config)
}

/// Router over already-built services.
pub fn router(services: services::AppServices, config: &ApiConfig) -> anyhow::Result<Router> {
    let jwt = Arc::new(sweetshop_auth::Hs256JwtValidator::new(
        config.jwt_secret.expose_secret().as_bytes(),
    ));
    let auth_state = middleware::AuthState { jwt };

    // Protected routes: require a valid bearer token.
    let protected = routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    let origin: HeaderValue = config
        .cors_origin
        .parse()
        .with_context(|| format!("invalid CORS origin `{}`", config.cors_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let mut app = Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected);

    if !config.simulated_latency.is_zero() {
        tracing::warn!(
            delay_ms = config.simulated_latency.as_millis() as u64,
            "simulated latency enabled (demo only)"
        );
        app = app.layer(axum::middleware::from_fn_with_state(
            config.simulated_latency,
            middleware::simulated_latency,
        ));
    }

    Ok(app.layer(ServiceBuilder::new().layer(cors)))
}
