//! Command-line interface definitions and parsing

use std::path::PathBuf;

use clap::Parser;

use crate::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path (defaults to ./switchsim.toml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gateway host or host:port
    #[arg(short, long)]
    pub gateway: Option<String>,

    /// Number of switches to simulate
    #[arg(short = 'n', long)]
    pub switches: Option<usize>,

    /// Switch name prefix
    #[arg(short, long)]
    pub title: Option<String>,

    /// Directory for received config messages
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Seconds to wait for each response
    #[arg(long)]
    pub correlation_timeout: Option<u64>,

    /// Talk plain http/ws to the gateway
    #[arg(long)]
    pub plain: bool,

    /// Keep sessions open after the script has been answered
    #[arg(long)]
    pub keep_open: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,
}

impl Cli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            gateway: self.gateway.clone(),
            plain: self.plain,
            switches: self.switches,
            title: self.title.clone(),
            output_dir: self.output_dir.clone(),
            correlation_timeout_secs: self.correlation_timeout,
            keep_open: self.keep_open,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_map_to_overrides() {
        let cli = Cli::parse_from([
            "switchsim",
            "--gateway",
            "127.0.0.1:8443",
            "-n",
            "8",
            "--plain",
            "--correlation-timeout",
            "5",
        ]);
        let overrides = cli.overrides();

        assert_eq!(overrides.gateway.as_deref(), Some("127.0.0.1:8443"));
        assert_eq!(overrides.switches, Some(8));
        assert_eq!(overrides.correlation_timeout_secs, Some(5));
        assert!(overrides.plain);
        assert!(!overrides.keep_open);
        assert!(overrides.title.is_none());
    }

    #[test]
    fn test_no_flags_means_no_overrides() {
        let cli = Cli::parse_from(["switchsim"]);
        assert_eq!(cli.overrides(), ConfigOverrides::default());
        assert!(cli.config.is_none());
    }
}
