//! Simulator configuration
//!
//! Plain serde structs; layering (file, environment, flags) happens in the
//! CLI. Durations are stored as whole seconds so they read naturally in TOML.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::{ConfigError, ConfigResult};
use crate::types::{GatewayEndpoint, SwitchIdentity};

// ----------------------------------------------------------------------------
// Sections
// ----------------------------------------------------------------------------

/// Where the gateway lives and how to reach it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host or host:port of the gateway
    pub address: String,
    /// Use https/wss; disable only for local gateways
    pub tls: bool,
    /// WebSocket handshake timeout in seconds
    pub handshake_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            address: "172.21.92.97".to_string(),
            tls: true,
            handshake_timeout_secs: 60 * 60,
        }
    }
}

impl GatewayConfig {
    pub fn endpoint(&self) -> ConfigResult<GatewayEndpoint> {
        GatewayEndpoint::from_address(&self.address, self.tls)
    }

    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_secs(self.handshake_timeout_secs)
    }
}

/// The simulated fleet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchesConfig {
    pub count: usize,
    /// Name prefix; switch `i` is named `<title><i>`
    pub title: String,
}

impl Default for SwitchesConfig {
    fn default() -> Self {
        Self {
            count: 1,
            title: "harojianSwitchSimulator".to_string(),
        }
    }
}

impl SwitchesConfig {
    pub fn identities(&self) -> Vec<SwitchIdentity> {
        (0..self.count)
            .map(|index| SwitchIdentity::numbered(&self.title, index))
            .collect()
    }
}

/// Per-session behaviour
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Window for each request/response correlation, in seconds
    pub correlation_timeout_secs: u64,
    /// Capacity of each of the session's queues
    pub queue_capacity: usize,
    /// End the session with success once every scripted request is answered
    pub complete_after_script: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            correlation_timeout_secs: 30,
            queue_capacity: 10,
            complete_after_script: true,
        }
    }
}

impl SessionConfig {
    pub fn correlation_timeout(&self) -> Duration {
        Duration::from_secs(self.correlation_timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory receiving `<switchName>ConfigMessage` files
    pub output_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
        }
    }
}

// ----------------------------------------------------------------------------
// Simulator Configuration
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub gateway: GatewayConfig,
    pub switches: SwitchesConfig,
    pub session: SessionConfig,
    pub storage: StorageConfig,
}

impl SimulatorConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        self.gateway.endpoint()?;

        if self.gateway.handshake_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Handshake timeout must be greater than 0".to_string(),
            ));
        }
        if self.switches.count == 0 {
            return Err(ConfigError::Validation(
                "At least one switch must be simulated".to_string(),
            ));
        }
        if self.switches.title.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Switch title must not be empty".to_string(),
            ));
        }
        if self.session.correlation_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Correlation timeout must be greater than 0".to_string(),
            ));
        }
        if self.session.queue_capacity == 0 {
            return Err(ConfigError::Validation(
                "Queue capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
