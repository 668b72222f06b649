use anyhow::Context;
use chrono::{Duration, Utc};
use secrecy::ExposeSecret;

use sweetshop_api::config::ApiConfig;
use sweetshop_auth::{issue_token, JwtClaims, PrincipalId, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::from_env().context("invalid configuration")?;
    sweetshop_observability::init(config.log_format);

    if config.insecure_jwt_secret {
        tracing::warn!("JWT_SECRET not set; using insecure dev default");
    }
    if config.dev_tokens {
        log_dev_tokens(&config)?;
    }

    let app = sweetshop_api::app::build_app(&config).await?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Print a short-lived admin and user token so the UI can be exercised locally.
fn log_dev_tokens(config: &ApiConfig) -> anyhow::Result<()> {
    let secret = config.jwt_secret.expose_secret().as_bytes();
    let now = Utc::now();

    for (role, name) in [(Role::ADMIN, "Demo Admin"), (Role::USER, "Demo Shopper")] {
        let claims = JwtClaims::new(PrincipalId::new(), vec![role.clone()], now, Duration::hours(8))
            .with_name(name);
        let token = issue_token(secret, &claims).context("failed to sign dev token")?;
        tracing::info!(role = %role, token = %token, "dev token");
    }
    Ok(())
}
