use anyhow::{Context, Result};
use chrono::FixedOffset;
use std::env;

/// Process-level settings read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub skip_migrations: bool,
    /// Offset of the wall clock the daily sweeps are scheduled against.
    pub scheduler_offset: FixedOffset,
    pub default_admin: Option<DefaultAdmin>,
}

/// Admin account created on startup when none with this email exists yet.
#[derive(Clone, Debug)]
pub struct DefaultAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let offset_hours: i32 = env::var("SCHEDULER_UTC_OFFSET_HOURS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(7);
        let scheduler_offset = FixedOffset::east_opt(offset_hours * 3600)
            .context("SCHEDULER_UTC_OFFSET_HOURS must be between -23 and 23")?;

        let default_admin = match (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) {
            (Ok(email), Ok(password)) => Some(DefaultAdmin {
                name: env::var("ADMIN_NAME").unwrap_or_else(|_| "Admin User".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a valid port number")?,
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string())
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            skip_migrations: env::var("SKIP_MIGRATIONS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            scheduler_offset,
            default_admin,
        })
    }
}
