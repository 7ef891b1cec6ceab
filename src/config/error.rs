//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Page size must be between 1 and {max}, got {actual}")]
    InvalidPageSize { max: u32, actual: u32 },

    #[error("Default page size exceeds max_page_size")]
    DefaultPageSizeTooLarge,

    #[error("Drag threshold must be at most 100 pixels")]
    DragThresholdTooLarge,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
