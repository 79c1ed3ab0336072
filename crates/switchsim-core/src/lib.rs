//! Switch simulator core
//!
//! Data model, wire schemas and configuration for simulated switches talking
//! to a gateway. The session runtime lives in `switchsim-runtime`; this crate
//! performs no I/O.

pub mod config;
pub mod errors;
pub mod messages;
pub mod types;

pub use config::{GatewayConfig, SessionConfig, SimulatorConfig, StorageConfig, SwitchesConfig};
pub use errors::{ConfigError, ConfigResult};
pub use messages::{session_script, ServerConfigMessage, SwitchPayload, SwitchRegistration};
pub use types::{
    Command, CommandTag, FaultReason, GatewayEndpoint, InboundEnvelope, OutboundMessage,
    SessionOutcome, SessionResult, SwitchIdentity,
};
