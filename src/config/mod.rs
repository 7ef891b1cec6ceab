//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `SITECRAFT` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use sitecraft_cms::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Tables show {} rows per page", config.admin.default_page_size);
//! ```

mod admin;
mod database;
mod error;
mod logging;

pub use admin::AdminConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "SITECRAFT";

/// Root configuration of the admin core
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Hosted database connection
    pub database: DatabaseConfig,

    /// List editor and table behaviour
    #[serde(default)]
    pub admin: AdminConfig,

    /// Log level and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with the `SITECRAFT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `SITECRAFT__DATABASE__URL=...` -> `database.url = ...`
    /// - `SITECRAFT__ADMIN__DRAG_THRESHOLD_PX=8` -> `admin.drag_threshold_px = 8`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.admin.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}
