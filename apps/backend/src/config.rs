//! Environment configuration

use anyhow::{bail, Context};

/// Runtime settings read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    /// Hour of day (0-23) at which a new study day begins.
    pub daily_reset_hour: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_source(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_source<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL must be set")?;

        let port = match get("PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid PORT: {}", p))?,
            None => 3000,
        };
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(n) => n
                .parse()
                .with_context(|| format!("invalid DATABASE_MAX_CONNECTIONS: {}", n))?,
            None => 10,
        };
        let daily_reset_hour: u32 = match get("DAILY_RESET_HOUR") {
            Some(h) => h
                .parse()
                .with_context(|| format!("invalid DAILY_RESET_HOUR: {}", h))?,
            None => 0,
        };
        if daily_reset_hour > 23 {
            bail!("DAILY_RESET_HOUR must be between 0 and 23");
        }

        Ok(Self {
            database_url,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            max_connections,
            daily_reset_hour,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
