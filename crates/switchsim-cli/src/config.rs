//! Layered configuration loading for the switch simulator
//!
//! Sources, lowest priority first:
//! - built-in defaults
//! - a TOML file (`--config`, else `switchsim.toml` if present)
//! - `SWITCHSIM_` environment variables, sections split on `__`
//!   (`SWITCHSIM_GATEWAY__ADDRESS`, `SWITCHSIM_SWITCHES__COUNT`)
//! - command line flags

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use switchsim_core::{ConfigError, ConfigResult, SimulatorConfig};

pub const DEFAULT_CONFIG_FILE: &str = "switchsim.toml";
pub const ENV_PREFIX: &str = "SWITCHSIM_";

/// Values given on the command line; `None` leaves lower layers alone
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub gateway: Option<String>,
    pub plain: bool,
    pub switches: Option<usize>,
    pub title: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub correlation_timeout_secs: Option<u64>,
    pub keep_open: bool,
}

// ----------------------------------------------------------------------------
// Configuration Loading Logic
// ----------------------------------------------------------------------------

/// Load, layer and validate the simulator configuration
pub fn load(config_path: Option<&Path>, overrides: &ConfigOverrides) -> ConfigResult<SimulatorConfig> {
    let file = match config_path {
        Some(path) if !path.exists() => {
            return Err(ConfigError::Loading(format!(
                "config file {} not found",
                path.display()
            )))
        }
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };

    let mut figment = Figment::new()
        .merge(Serialized::defaults(SimulatorConfig::default()))
        .merge(Toml::file(&file))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    if let Some(address) = &overrides.gateway {
        figment = figment.merge(("gateway.address", address));
    }
    if overrides.plain {
        figment = figment.merge(("gateway.tls", false));
    }
    if let Some(count) = overrides.switches {
        figment = figment.merge(("switches.count", count));
    }
    if let Some(title) = &overrides.title {
        figment = figment.merge(("switches.title", title));
    }
    if let Some(dir) = &overrides.output_dir {
        figment = figment.merge(("storage.output_dir", dir));
    }
    if let Some(secs) = overrides.correlation_timeout_secs {
        figment = figment.merge(("session.correlation_timeout_secs", secs));
    }
    if overrides.keep_open {
        figment = figment.merge(("session.complete_after_script", false));
    }

    let config: SimulatorConfig = figment
        .extract()
        .map_err(|e| ConfigError::Loading(format!("Failed to load from {}: {}", file.display(), e)))?;

    config.validate()?;
    Ok(config)
}

/// The configuration as TOML, for `--dump-config`
pub fn render(config: &SimulatorConfig) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| ConfigError::Loading(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn load_in_jail(overrides: &ConfigOverrides) -> figment::Result<SimulatorConfig> {
        load(None, overrides).map_err(|e| e.to_string().into())
    }

    #[test]
    fn test_defaults_without_any_source() {
        Jail::expect_with(|_jail| {
            let config = load_in_jail(&ConfigOverrides::default())?;
            assert_eq!(config, SimulatorConfig::default());
            Ok(())
        });
    }

    #[test]
    fn test_layers_apply_in_priority_order() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [gateway]
                address = "10.0.0.1"

                [switches]
                count = 3
                title = "fromFile"
                "#,
            )?;
            jail.set_env("SWITCHSIM_SWITCHES__COUNT", "7");
            jail.set_env("SWITCHSIM_SESSION__QUEUE_CAPACITY", "4");

            let overrides = ConfigOverrides {
                title: Some("fromFlag".to_string()),
                plain: true,
                ..ConfigOverrides::default()
            };
            let config = load_in_jail(&overrides)?;

            assert_eq!(config.gateway.address, "10.0.0.1");
            assert!(!config.gateway.tls);
            assert_eq!(config.switches.count, 7);
            assert_eq!(config.switches.title, "fromFlag");
            assert_eq!(config.session.queue_capacity, 4);
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_file_must_exist() {
        Jail::expect_with(|_jail| {
            let result = load(Some(Path::new("missing.toml")), &ConfigOverrides::default());
            assert!(matches!(result, Err(ConfigError::Loading(_))));
            Ok(())
        });
    }

    #[test]
    fn test_explicit_config_file_is_used() {
        Jail::expect_with(|jail| {
            jail.create_file("lab.toml", "[session]\ncorrelation_timeout_secs = 12\n")?;
            let config = load(Some(Path::new("lab.toml")), &ConfigOverrides::default())
                .map_err(|e| e.to_string())?;
            assert_eq!(config.session.correlation_timeout_secs, 12);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_result_is_rejected() {
        Jail::expect_with(|_jail| {
            let overrides = ConfigOverrides {
                switches: Some(0),
                ..ConfigOverrides::default()
            };
            assert!(matches!(
                load(None, &overrides),
                Err(ConfigError::Validation(_))
            ));
            Ok(())
        });
    }

    #[test]
    fn test_rendered_config_loads_back() {
        Jail::expect_with(|jail| {
            let overrides = ConfigOverrides {
                keep_open: true,
                output_dir: Some(PathBuf::from("captures")),
                ..ConfigOverrides::default()
            };
            let config = load_in_jail(&overrides)?;
            let rendered = render(&config).map_err(|e| e.to_string())?;
            assert!(rendered.contains("[gateway]"));
            assert!(rendered.contains("[storage]"));

            jail.create_file(DEFAULT_CONFIG_FILE, &rendered)?;
            assert_eq!(load_in_jail(&ConfigOverrides::default())?, config);
            Ok(())
        });
    }
}
