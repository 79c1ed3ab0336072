//! Switch simulator CLI library
//!
//! Flag parsing, layered configuration and the run summary behind the
//! `switchsim` binary.

pub mod cli;
pub mod config;
pub mod error;
pub mod summary;

pub use cli::Cli;
pub use config::ConfigOverrides;
pub use error::{CliError, Result};
