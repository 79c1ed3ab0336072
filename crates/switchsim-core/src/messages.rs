//! Gateway wire schemas
//!
//! Field names follow the gateway's JSON exactly, including its mix of
//! camelCase and snake_case keys.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Command, OutboundMessage, SwitchIdentity};

// ----------------------------------------------------------------------------
// Registration
// ----------------------------------------------------------------------------

/// Body of `POST /switch_register`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchRegistration {
    pub serial: String,
    /// Left empty; the gateway substitutes the switch certificate later
    pub crt: String,
}

impl SwitchRegistration {
    pub fn for_switch(identity: &SwitchIdentity) -> Self {
        Self {
            serial: identity.name().to_string(),
            crt: String::new(),
        }
    }
}

// ----------------------------------------------------------------------------
// Switch -> Gateway
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchMessage {
    pub cmd: String,
    #[serde(rename = "switchId")]
    pub switch_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInData {
    #[serde(rename = "agentVersion")]
    pub agent_version: String,
    pub capability: String,
    pub gateway_uuid: String,
    #[serde(rename = "imageName")]
    pub image_name: String,
    pub ip: String,
    #[serde(rename = "modTs")]
    pub mod_ts: String,
    pub role: String,
    pub state: String,
    pub status: String,
    pub switch_name: String,
    #[serde(rename = "systemUpTime")]
    pub system_up_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchCheckInMessage {
    pub cmd: String,
    #[serde(rename = "switchId")]
    pub switch_id: String,
    pub data: CheckInData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingType {
    Vrf,
    Port,
    PortToVrf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddMappingData {
    #[serde(rename = "mappingType")]
    pub mapping_type: MappingType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchAddMappingMessage {
    pub cmd: String,
    #[serde(rename = "switchId")]
    pub switch_id: String,
    pub data: AddMappingData,
}

/// Any message body the Sender can put on the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SwitchPayload {
    CheckIn(SwitchCheckInMessage),
    Plain(SwitchMessage),
    AddMapping(SwitchAddMappingMessage),
    Raw(serde_json::Value),
}

// ----------------------------------------------------------------------------
// Gateway -> Switch
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorBucket {
    pub lo: i64,
    pub hi: i64,
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectorMessage {
    pub decommissioned: bool,
    pub ip: String,
    pub name: String,
    pub updated_at: i64,
    pub collector_id: i64,
    pub healthy: bool,
    pub spine_udp_port: i64,
    pub udp_port: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigOptions {
    #[serde(rename = "exportIntervalMs", default)]
    pub export_interval_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSensor {
    pub dn: String,
    pub exporter_id: i64,
    pub src_port: i64,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfigData {
    pub buckets: Vec<CollectorBucket>,
    pub active: Vec<CollectorMessage>,
    pub deactivated: Vec<CollectorMessage>,
    #[serde(rename = "dataPathDisable")]
    pub data_path_disable: bool,
    #[serde(rename = "cfgOpts")]
    pub cfg_opts: ConfigOptions,
    #[serde(rename = "hwSensors")]
    pub hw_sensors: Vec<HardwareSensor>,
}

/// Typed form of a `switch/config_msg` push
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfigMessage {
    #[serde(rename = "responseCode", default)]
    pub response_code: i64,
    pub cmd: String,
    #[serde(default)]
    pub data: ServerConfigData,
}

// ----------------------------------------------------------------------------
// Message Script
// ----------------------------------------------------------------------------

/// Messages every switch sends once its session is up, in order
pub fn session_script(identity: &SwitchIdentity) -> Vec<OutboundMessage> {
    vec![
        check_in(identity),
        config_request(identity),
        add_mapping(identity, MappingType::Vrf),
        add_mapping(identity, MappingType::Port),
        add_mapping(identity, MappingType::PortToVrf),
    ]
}

pub fn check_in(identity: &SwitchIdentity) -> OutboundMessage {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    let message = SwitchCheckInMessage {
        cmd: Command::CheckIn.as_str().to_string(),
        switch_id: identity.name().to_string(),
        data: CheckInData {
            agent_version: env!("CARGO_PKG_VERSION").to_string(),
            capability: "telemetry".to_string(),
            gateway_uuid: Uuid::new_v4().to_string(),
            image_name: "switch-simulator".to_string(),
            ip: "0.0.0.0".to_string(),
            mod_ts: now_ms.to_string(),
            role: "leaf".to_string(),
            state: "active".to_string(),
            status: "online".to_string(),
            switch_name: identity.name().to_string(),
            system_up_time: "0".to_string(),
        },
    };

    OutboundMessage::new(Command::CheckIn, SwitchPayload::CheckIn(message))
}

pub fn config_request(identity: &SwitchIdentity) -> OutboundMessage {
    let message = SwitchMessage {
        cmd: Command::ConfigMsg.as_str().to_string(),
        switch_id: identity.name().to_string(),
    };

    OutboundMessage::new(Command::ConfigMsg, SwitchPayload::Plain(message))
}

pub fn add_mapping(identity: &SwitchIdentity, mapping_type: MappingType) -> OutboundMessage {
    let vrf = Some("vrf-default".to_string());
    let port = Some("Ethernet1/1".to_string());
    let data = match mapping_type {
        MappingType::Vrf => AddMappingData {
            mapping_type,
            vrf,
            port: None,
        },
        MappingType::Port => AddMappingData {
            mapping_type,
            vrf: None,
            port,
        },
        MappingType::PortToVrf => AddMappingData {
            mapping_type,
            vrf,
            port,
        },
    };

    let message = SwitchAddMappingMessage {
        cmd: Command::AddMapping.as_str().to_string(),
        switch_id: identity.name().to_string(),
        data,
    };

    OutboundMessage::new(Command::AddMapping, SwitchPayload::AddMapping(message))
}
