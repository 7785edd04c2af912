//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. A `.env` file in the working directory (if present)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::path::PathBuf;

/// Default discovery-document URL for the Google identity provider.
pub const GOOGLE_METADATA_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";

/// Application configuration
///
/// Flat key set mirroring the environment: `DEBUG`, `DATABASE_URL`,
/// `SECRET_KEY`, `ALLOWED_HOSTS`, `TEMPLATES`, `STATIC`, `HOST`, `PORT`,
/// `PUBLIC_URL`, `GOOGLE_CLIENT_ID`, `GOOGLE_CLIENT_SECRET`,
/// `GOOGLE_METADATA_URL`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Verbose error pages instead of the 500 template
    #[serde(default)]
    pub debug: bool,

    /// Loaded for parity with the deployment environment; no route uses it
    #[serde(default)]
    pub database_url: Option<url::Url>,

    /// Session cookie signing secret
    pub secret_key: String,

    /// Comma-separated Host header allow-list; empty allows any host
    #[serde(default)]
    pub allowed_hosts: String,

    /// Directory holding the handlebars templates
    pub templates: PathBuf,

    /// Directory served verbatim under /static
    #[serde(rename = "static")]
    pub static_dir: PathBuf,

    /// Bind address (default "0.0.0.0")
    pub host: String,

    /// Bind port (default 8000)
    pub port: u16,

    /// External base URL used for the OAuth callback. When unset the
    /// callback URL is derived from the request Host header.
    #[serde(default)]
    pub public_url: Option<String>,

    pub google_client_id: String,
    pub google_client_secret: String,

    /// Provider discovery-document URL; overridable for tests
    pub google_metadata_url: String,
}

impl AppConfig {
    /// Load configuration from `.env` and the environment
    ///
    /// # Errors
    /// Returns error if a required key is missing or a value fails to parse
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment};

        // A missing .env file is fine; the environment may be complete.
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .set_default("debug", false)?
            .set_default("allowed_hosts", "")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("google_metadata_url", GOOGLE_METADATA_URL)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    /// Parsed `ALLOWED_HOSTS` entries
    pub fn allowed_hosts(&self) -> Vec<&str> {
        self.allowed_hosts
            .split(',')
            .map(str::trim)
            .filter(|host| !host.is_empty())
            .collect()
    }

    /// Check an incoming Host header against the allow-list
    ///
    /// An empty list or a `*` entry allows any host. Entries of the form
    /// `*.example.com` match any subdomain. Ports are ignored.
    pub fn host_allowed(&self, host: &str) -> bool {
        let patterns = self.allowed_hosts();
        if patterns.is_empty() {
            return true;
        }

        let hostname = host
            .rsplit_once(':')
            .map_or(host, |(name, _port)| name)
            .to_ascii_lowercase();

        patterns.iter().any(|pattern| {
            let pattern = pattern.to_ascii_lowercase();
            pattern == "*"
                || pattern == hostname
                || (pattern.starts_with("*.")
                    && hostname.ends_with(pattern.trim_start_matches('*')))
        })
    }

    fn validate(&self) -> Result<(), crate::error::AppError> {
        const RECOMMENDED_SECRET_BYTES: usize = 32;

        if self.secret_key.is_empty() {
            return Err(crate::error::AppError::Config(
                "secret_key must not be empty".to_string(),
            ));
        }

        if self.secret_key.len() < RECOMMENDED_SECRET_BYTES {
            tracing::warn!(
                bytes = self.secret_key.len(),
                "secret_key is shorter than {} bytes",
                RECOMMENDED_SECRET_BYTES
            );
        }

        Ok(())
    }
}
