//! Error types for the session runtime

use std::time::Duration;

use thiserror::Error;

/// Failure of the one-shot HTTPS registration call
#[derive(Error, Debug)]
pub enum RegistrationError {
    #[error("Failed to encode registration request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to build HTTPS client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Registration request failed: {0}")]
    Request(#[source] reqwest::Error),
}

/// Failure on the WebSocket connection
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("WebSocket handshake did not complete within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("WebSocket connect failed: {0}")]
    Connect(#[source] tokio_tungstenite::tungstenite::Error),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Failed to write frame: {0}")]
    Write(String),

    #[error("Failed to read frame: {0}")]
    Read(String),

    #[error("Connection closed")]
    Closed,
}

impl TransportError {
    /// True when the peer ended the connection rather than it breaking
    pub fn is_peer_close(&self) -> bool {
        matches!(self, TransportError::Closed)
    }
}

/// Failure writing a persisted config message
#[derive(Error, Debug)]
#[error("Failed to write {path}: {source}")]
pub struct StoreError {
    pub path: String,
    #[source]
    pub source: std::io::Error,
}

/// Session could not be brought up; no tasks were spawned
#[derive(Error, Debug)]
pub enum EstablishError {
    #[error("Can't make websocket: {0}")]
    Transport(#[from] TransportError),
}
