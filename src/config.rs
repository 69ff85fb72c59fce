//! Configuration management for Folio server

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Primary store address; memory-only mode when absent
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    /// Bound on the liveness ping and on every primary operation
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AdminConfig {
    /// Argon2 PHC string of the admin PIN
    pub pin_hash: Option<String>,
    /// Plain development PIN, only honoured when explicitly configured
    pub dev_pin: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    pub contact_limit: u32,
    pub contact_window_secs: u64,
    pub pin_limit: u32,
    pub pin_window_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub smtp_from_name: Option<String>,
    pub smtp_use_tls: bool,
    /// Recipient of inquiry notifications; notifications are skipped when unset
    pub notify_to: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BlobConfig {
    pub api_url: String,
    pub token: Option<String>,
    /// Host suffix of URLs served by the blob provider
    pub managed_host: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub blob: BlobConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let config = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Layer on the environment-specific file
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add environment variables (FOLIO__SECTION__KEY)
            .add_source(
                Environment::with_prefix("FOLIO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("admin.pin_hash", env::var("ADMIN_PIN_HASH").ok())?
            .set_override_option("blob.token", env::var("BLOB_READ_WRITE_TOKEN").ok())?
            .set_override_option("email.notify_to", env::var("ADMIN_EMAIL").ok())?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 10,
            min_connections: 0,
            timeout_ms: 5000,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            contact_limit: 3,
            contact_window_secs: 15 * 60,
            pin_limit: 5,
            pin_window_secs: 15 * 60,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: None,
            smtp_password: None,
            smtp_from: "noreply@folio.local".to_string(),
            smtp_from_name: Some("Portfolio Contact".to_string()),
            smtp_use_tls: true,
            notify_to: None,
        }
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            api_url: "https://blob.vercel-storage.com".to_string(),
            token: None,
            managed_host: "blob.vercel-storage.com".to_string(),
            timeout_secs: 30,
        }
    }
}
