//! Runtime configuration, read from the process environment.

use std::net::SocketAddr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

use sweetshop_observability::LogFormat;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for `{key}`: `{value}`")]
    InvalidValue { key: &'static str, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

/// Which inventory backend the server runs on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StoreKind {
    #[default]
    Memory,
    Sqlite,
}

impl std::str::FromStr for StoreKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ConfigError::Validation(format!(
                "unsupported store `{other}` (expected memory|sqlite)"
            ))),
        }
    }
}

#[derive(Debug)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: SecretString,
    /// `true` when `JWT_SECRET` was not supplied and [`DEV_JWT_SECRET`] is in use.
    pub insecure_jwt_secret: bool,
    pub store: StoreKind,
    pub database_url: String,
    pub seed_demo: bool,
    pub cors_origin: String,
    /// Demo-only response delay. Zero disables it.
    pub simulated_latency: Duration,
    pub log_format: LogFormat,
    pub dev_tokens: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: SecretString::from(DEV_JWT_SECRET.to_string()),
            insecure_jwt_secret: true,
            store: StoreKind::Memory,
            database_url: "sqlite://sweetshop.db?mode=rwc".to_string(),
            seed_demo: true,
            cors_origin: "http://localhost:5173".to_string(),
            simulated_latency: Duration::ZERO,
            log_format: LogFormat::Json,
            dev_tokens: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = get("SWEETSHOP_BIND_ADDR") {
            config.bind_addr = parse("SWEETSHOP_BIND_ADDR", &value)?;
        }
        if let Some(value) = get("JWT_SECRET") {
            config.jwt_secret = SecretString::from(value);
            config.insecure_jwt_secret = false;
        }
        if let Some(value) = get("SWEETSHOP_STORE") {
            config.store = value.parse()?;
        }
        if let Some(value) = get("DATABASE_URL") {
            config.database_url = value;
        }
        if let Some(value) = get("SWEETSHOP_SEED_DEMO") {
            config.seed_demo = parse_bool("SWEETSHOP_SEED_DEMO", &value)?;
        }
        if let Some(value) = get("SWEETSHOP_CORS_ORIGIN") {
            config.cors_origin = value;
        }
        if let Some(value) = get("SWEETSHOP_SIMULATED_LATENCY_MS") {
            let millis: u64 = parse("SWEETSHOP_SIMULATED_LATENCY_MS", &value)?;
            config.simulated_latency = Duration::from_millis(millis);
        }
        if let Some(value) = get("SWEETSHOP_LOG_FORMAT") {
            config.log_format = value
                .parse()
                .map_err(|e: sweetshop_observability::UnknownLogFormat| ConfigError::Validation(e.to_string()))?;
        }
        if let Some(value) = get("SWEETSHOP_DEV_TOKENS") {
            config.dev_tokens = parse_bool("SWEETSHOP_DEV_TOKENS", &value)?;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store == StoreKind::Sqlite && !self.database_url.starts_with("sqlite:") {
            return Err(ConfigError::Validation(format!(
                "DATABASE_URL must be a sqlite URL when SWEETSHOP_STORE=sqlite, got `{}`",
                self.database_url
            )));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
