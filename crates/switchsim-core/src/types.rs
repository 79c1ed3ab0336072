//! Core data model shared by the session runtime and the CLI
//!
//! Everything here is plain data: identities, gateway endpoints, the closed
//! command set and the terminal outcome of a session.

use core::fmt;
use core::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::ConfigError;
use crate::messages::SwitchPayload;

// ----------------------------------------------------------------------------
// Switch Identity
// ----------------------------------------------------------------------------

/// Name/serial of one simulated switch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchIdentity {
    name: String,
}

impl SwitchIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Identity for switch `index` of a fleet sharing `title`
    pub fn numbered(title: &str, index: usize) -> Self {
        Self::new(format!("{}{}", title, index))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for SwitchIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

// ----------------------------------------------------------------------------
// Gateway Endpoint
// ----------------------------------------------------------------------------

pub const REGISTER_PATH: &str = "/switch_register";
pub const SESSION_PATH: &str = "/switch_wss";

/// Registration and session URLs derived from one gateway address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEndpoint {
    register_url: Url,
    session_url: Url,
}

impl GatewayEndpoint {
    /// `https://{address}/switch_register` and `wss://{address}/switch_wss`
    pub fn secure(address: &str) -> Result<Self, ConfigError> {
        Self::build("https", "wss", address)
    }

    /// `http://` and `ws://` variant for local gateways
    pub fn plain(address: &str) -> Result<Self, ConfigError> {
        Self::build("http", "ws", address)
    }

    pub fn from_address(address: &str, tls: bool) -> Result<Self, ConfigError> {
        if tls {
            Self::secure(address)
        } else {
            Self::plain(address)
        }
    }

    fn build(http_scheme: &str, ws_scheme: &str, address: &str) -> Result<Self, ConfigError> {
        let address = address.trim();
        if address.is_empty() || address.contains('/') {
            return Err(ConfigError::InvalidGatewayAddress {
                address: address.to_string(),
            });
        }

        let parse = |scheme: &str, path: &str| {
            Url::parse(&format!("{}://{}{}", scheme, address, path)).map_err(|_| {
                ConfigError::InvalidGatewayAddress {
                    address: address.to_string(),
                }
            })
        };

        Ok(Self {
            register_url: parse(http_scheme, REGISTER_PATH)?,
            session_url: parse(ws_scheme, SESSION_PATH)?,
        })
    }

    pub fn register_url(&self) -> &Url {
        &self.register_url
    }

    pub fn session_url(&self) -> &Url {
        &self.session_url
    }

    pub fn is_tls(&self) -> bool {
        self.session_url.scheme() == "wss"
    }
}

// ----------------------------------------------------------------------------
// Commands
// ----------------------------------------------------------------------------

/// Protocol commands that take part in request/response correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    CheckIn,
    ConfigMsg,
    AddMapping,
}

impl Command {
    pub const ALL: [Command; 3] = [Command::CheckIn, Command::ConfigMsg, Command::AddMapping];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::CheckIn => "switch/check_in",
            Command::ConfigMsg => "switch/config_msg",
            Command::AddMapping => "switch/add_mapping",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.as_str() == s)
            .ok_or(())
    }
}

/// Value of a `cmd` field as seen on the wire
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CommandTag {
    Recognized(Command),
    Unrecognized(String),
}

impl CommandTag {
    pub fn as_str(&self) -> &str {
        match self {
            CommandTag::Recognized(command) => command.as_str(),
            CommandTag::Unrecognized(raw) => raw,
        }
    }

    pub fn command(&self) -> Option<Command> {
        match self {
            CommandTag::Recognized(command) => Some(*command),
            CommandTag::Unrecognized(_) => None,
        }
    }
}

impl Default for CommandTag {
    fn default() -> Self {
        CommandTag::Unrecognized(String::new())
    }
}

impl From<Command> for CommandTag {
    fn from(command: Command) -> Self {
        CommandTag::Recognized(command)
    }
}

impl From<String> for CommandTag {
    fn from(raw: String) -> Self {
        match raw.parse::<Command>() {
            Ok(command) => CommandTag::Recognized(command),
            Err(()) => CommandTag::Unrecognized(raw),
        }
    }
}

impl From<&str> for CommandTag {
    fn from(raw: &str) -> Self {
        CommandTag::from(raw.to_string())
    }
}

impl From<CommandTag> for String {
    fn from(tag: CommandTag) -> Self {
        match tag {
            CommandTag::Recognized(command) => command.as_str().to_string(),
            CommandTag::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for CommandTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ----------------------------------------------------------------------------
// Messages
// ----------------------------------------------------------------------------

/// A protocol action queued for the Sender
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    pub tag: CommandTag,
    pub payload: SwitchPayload,
}

impl OutboundMessage {
    pub fn new(tag: impl Into<CommandTag>, payload: SwitchPayload) -> Self {
        Self {
            tag: tag.into(),
            payload,
        }
    }
}

/// Minimal view of every frame the gateway sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "responseCode", default)]
    pub response_code: i64,
    /// Missing `cmd` reads as an empty, unrecognized tag
    #[serde(default)]
    pub cmd: CommandTag,
}

// ----------------------------------------------------------------------------
// Session Outcome
// ----------------------------------------------------------------------------

/// Why a session ended in a fault
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FaultReason {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("failed to encode {command} message: {reason}")]
    Encode { command: String, reason: String },
    #[error("failed to decode gateway message: {0}")]
    Decode(String),
    #[error("failed to persist config message: {0}")]
    Persist(String),
    #[error("request {expected} answered by {received}")]
    Mismatch { expected: Command, received: Command },
    #[error("no response to {command} within {waited:?}")]
    Timeout { command: Command, waited: Duration },
}

impl FaultReason {
    /// Correlation faults come from the Validator; everything else is transport level
    pub fn is_correlation(&self) -> bool {
        matches!(self, FaultReason::Mismatch { .. } | FaultReason::Timeout { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionResult {
    /// Every scripted request was answered
    Success,
    /// The gateway closed the connection
    GracefulClose,
    Fault(FaultReason),
}

impl SessionResult {
    pub fn is_fault(&self) -> bool {
        matches!(self, SessionResult::Fault(_))
    }
}

impl fmt::Display for SessionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionResult::Success => f.write_str("success"),
            SessionResult::GracefulClose => f.write_str("closed by gateway"),
            SessionResult::Fault(reason) => write!(f, "fault: {}", reason),
        }
    }
}

/// Terminal result of one switch's session, produced exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub switch_name: String,
    pub result: SessionResult,
}
