//! Error handling for the switch simulator CLI

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] switchsim_core::ConfigError),

    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::Runtime(format!("{:#}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_anyhow_errors_keep_their_context() {
        let err: CliError = std::fs::read_dir("/definitely/not/here")
            .context("can't list captures")
            .unwrap_err()
            .into();

        let message = err.to_string();
        assert!(message.starts_with("Runtime error: can't list captures: "));
        assert!(matches!(err, CliError::Runtime(_)));
    }

    #[test]
    fn test_config_errors_convert() {
        let err: CliError = switchsim_core::ConfigError::Validation("count".into()).into();
        assert!(matches!(err, CliError::Config(_)));
    }
}
