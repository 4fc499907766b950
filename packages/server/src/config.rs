use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use url::Url;

use crate::domains::member::DEFAULT_EXPIRY_HOURS;

const DEFAULT_FROM_EMAIL: &str = "no-reply@epclub.pythonanywhere.com";
const DEFAULT_PRUNE_SCHEDULE: &str = "0 0 * * * *";
/// Longest accepted confirmation window (one year)
pub const MAX_EXPIRY_HOURS: i64 = 24 * 365;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Origin embedded in confirmation links
    pub public_base_url: Url,
    pub sendgrid_api_key: Option<String>,
    pub confirmation_from_email: String,
    pub confirmation_expiry_hours: i64,
    /// Cron expression (with seconds) for the prune sweep
    pub prune_schedule: String,
    pub allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse()
            .context("PORT must be a valid number")?;

        let public_base_url = lookup("PUBLIC_BASE_URL")
            .unwrap_or_else(|| format!("http://localhost:{}", port));
        let public_base_url = Url::parse(&public_base_url)
            .with_context(|| format!("PUBLIC_BASE_URL is not a valid URL: {}", public_base_url))?;
        if public_base_url.cannot_be_a_base() {
            bail!("PUBLIC_BASE_URL must be an http(s) origin: {}", public_base_url);
        }

        let confirmation_expiry_hours: i64 = match lookup("CONFIRMATION_EXPIRY_HOURS") {
            Some(value) => value
                .parse()
                .context("CONFIRMATION_EXPIRY_HOURS must be a whole number of hours")?,
            None => DEFAULT_EXPIRY_HOURS,
        };
        if !(1..=MAX_EXPIRY_HOURS).contains(&confirmation_expiry_hours) {
            bail!(
                "CONFIRMATION_EXPIRY_HOURS must be between 1 and {}",
                MAX_EXPIRY_HOURS
            );
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL").context("DATABASE_URL must be set")?,
            port,
            public_base_url,
            sendgrid_api_key: lookup("SENDGRID_API_KEY").filter(|key| !key.is_empty()),
            confirmation_from_email: lookup("CONFIRMATION_FROM_EMAIL")
                .unwrap_or_else(|| DEFAULT_FROM_EMAIL.to_string()),
            confirmation_expiry_hours,
            prune_schedule: lookup("PRUNE_SCHEDULE")
                .unwrap_or_else(|| DEFAULT_PRUNE_SCHEDULE.to_string()),
            allowed_origins: lookup("ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}
