use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::rules::DEFAULT_ANNUAL_CAP_DAYS;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    /// `None` runs on the in-memory store
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub api_prefix: String,

    // Rate limiting
    pub rate_api_per_min: u32,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,

    // Leave policy
    pub enforce_rules_on_write: bool,
    pub annual_leave_cap_days: i64,
    pub seed_data: bool,
}

fn var_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            db_max_connections: var_or("DB_MAX_CONNECTIONS", 5)?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_api_per_min: var_or("RATE_API_PER_MIN", 1000)?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: var_or("LOG_LEVEL", tracing::Level::DEBUG)?,

            enforce_rules_on_write: var_or("ENFORCE_RULES_ON_WRITE", false)?,
            annual_leave_cap_days: var_or("ANNUAL_LEAVE_CAP_DAYS", DEFAULT_ANNUAL_CAP_DAYS)?,
            seed_data: var_or("SEED_DATA", true)?,
        })
    }
}
