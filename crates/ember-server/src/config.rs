use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";

/// Process settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = get("EMBER_JWT_SECRET").unwrap_or_else(|| {
            warn!("EMBER_JWT_SECRET not set, using the development secret");
            DEV_JWT_SECRET.into()
        });

        let port = match get("EMBER_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("invalid EMBER_PORT '{raw}'"))?,
            None => 3000,
        };

        let token_ttl_hours = match get("EMBER_TOKEN_TTL_HOURS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid EMBER_TOKEN_TTL_HOURS '{raw}'"))?,
            None => 24,
        };
        if token_ttl_hours <= 0 {
            anyhow::bail!("EMBER_TOKEN_TTL_HOURS must be positive");
        }

        Ok(Self {
            host: get("EMBER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: PathBuf::from(get("EMBER_DB_PATH").unwrap_or_else(|| "ember.db".into())),
            jwt_secret,
            token_ttl_hours,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse().with_context(|| format!("invalid listen address '{addr}'"))
    }
}
