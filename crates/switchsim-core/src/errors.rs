//! Error types shared across the simulator crates

use thiserror::Error;

/// Invalid or unloadable simulator configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid gateway address: {address}")]
    InvalidGatewayAddress { address: String },

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Configuration loading failed: {0}")]
    Loading(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;
