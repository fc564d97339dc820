use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use std::env;

use crate::services::EscalationSettings;

pub const DEFAULT_PAYROLL_TIMEZONE: &str = "America/Mexico_City";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub cors_allowed_origin: String,
    pub payroll_timezone: String,
    pub escalation_interval_secs: u64,
    pub escalation_idle_hours: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://@localhost:5432/leaveflow".to_string()),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            payroll_timezone: env::var("PAYROLL_TIMEZONE")
                .unwrap_or_else(|_| DEFAULT_PAYROLL_TIMEZONE.to_string()),
            escalation_interval_secs: env::var("ESCALATION_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),
            escalation_idle_hours: env::var("ESCALATION_IDLE_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .unwrap_or(24),
        })
    }

    /// Parse the configured IANA timezone used for payroll cutoffs
    pub fn payroll_timezone(&self) -> Result<Tz> {
        self.payroll_timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("Unknown payroll timezone: {}", self.payroll_timezone))
    }

    pub fn escalation_settings(&self) -> EscalationSettings {
        EscalationSettings {
            interval_secs: self.escalation_interval_secs,
            idle_threshold: chrono::Duration::try_hours(self.escalation_idle_hours.max(1))
                .unwrap_or_else(|| chrono::Duration::hours(24)),
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
