//! Frame-level access to one gateway WebSocket
//!
//! A connection is split at birth into a [`FrameWriter`] owned by the Sender
//! and a [`FrameReader`] owned by the Receiver, so no frame is ever written
//! and read from the same task.

use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{Connector, MaybeTlsStream, WebSocketStream};
use tracing::debug;

use crate::error::TransportError;

// ----------------------------------------------------------------------------
// Transport Traits
// ----------------------------------------------------------------------------

/// What a successful read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Data(Vec<u8>),
    /// Peer-initiated close
    Close,
}

#[async_trait]
pub trait FrameWriter: Send + 'static {
    /// Write one binary frame
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Send a close frame and shut the write half
    async fn close(&mut self) -> Result<(), TransportError>;
}

#[async_trait]
pub trait FrameReader: Send + 'static {
    async fn read_frame(&mut self) -> Result<Frame, TransportError>;
}

// ----------------------------------------------------------------------------
// WebSocket Transport
// ----------------------------------------------------------------------------

pub type GatewayStream = MaybeTlsStream<TcpStream>;

pub struct WsFrameWriter<S> {
    sink: SplitSink<WebSocketStream<S>, Message>,
}

pub struct WsFrameReader<S> {
    stream: SplitStream<WebSocketStream<S>>,
}

/// Split an open WebSocket into its writer and reader halves
pub fn split<S>(ws: WebSocketStream<S>) -> (WsFrameWriter<S>, WsFrameReader<S>)
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let (sink, stream) = ws.split();
    (WsFrameWriter { sink }, WsFrameReader { stream })
}

/// Dial the gateway session URL
///
/// Certificate verification is off for `wss://`: simulated switches have no
/// trust material of their own.
pub async fn connect(
    url: &url::Url,
    handshake_timeout: Duration,
) -> Result<(WsFrameWriter<GatewayStream>, WsFrameReader<GatewayStream>), TransportError> {
    let connector = if url.scheme() == "wss" {
        let tls = native_tls::TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .danger_accept_invalid_hostnames(true)
            .build()?;
        Some(Connector::NativeTls(tls))
    } else {
        None
    };

    let handshake =
        tokio_tungstenite::connect_async_tls_with_config(url.as_str(), None, false, connector);
    let (ws, response) = tokio::time::timeout(handshake_timeout, handshake)
        .await
        .map_err(|_| TransportError::HandshakeTimeout(handshake_timeout))?
        .map_err(TransportError::Connect)?;

    debug!("Handshake with {} completed: {}", url, response.status());
    Ok(split(ws))
}

#[async_trait]
impl<S> FrameWriter for WsFrameWriter<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        self.sink
            .send(Message::Binary(frame))
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // The peer may already be gone; the close frame is best effort.
        let _ = self.sink.send(Message::Close(None)).await;
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Write(e.to_string()))
    }
}

#[async_trait]
impl<S> FrameReader for WsFrameReader<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_frame(&mut self) -> Result<Frame, TransportError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Binary(bytes))) => return Ok(Frame::Data(bytes)),
                Some(Ok(Message::Text(text))) => return Ok(Frame::Data(text.into_bytes())),
                Some(Ok(Message::Close(_))) => return Ok(Frame::Close),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
                Some(Err(tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed))
                | None => return Err(TransportError::Closed),
                Some(Err(e)) => return Err(TransportError::Read(e.to_string())),
            }
        }
    }
}

// ----------------------------------------------------------------------------
// In-Memory Transport
// ----------------------------------------------------------------------------

#[cfg(any(test, feature = "testing"))]
pub mod memory {
    //! Channel-backed transport standing in for a gateway in tests

    use super::*;
    use tokio::sync::mpsc;

    type Item = Result<Frame, String>;

    pub struct MemoryFrameWriter {
        to_peer: mpsc::Sender<Frame>,
    }

    pub struct MemoryFrameReader {
        from_peer: mpsc::Receiver<Item>,
    }

    /// Gateway side of an in-memory connection
    pub struct MemoryPeer {
        to_switch: mpsc::Sender<Item>,
        from_switch: mpsc::Receiver<Frame>,
    }

    pub fn pair(capacity: usize) -> (MemoryFrameWriter, MemoryFrameReader, MemoryPeer) {
        let (to_peer, from_switch) = mpsc::channel(capacity);
        let (to_switch, from_peer) = mpsc::channel(capacity);
        (
            MemoryFrameWriter { to_peer },
            MemoryFrameReader { from_peer },
            MemoryPeer {
                to_switch,
                from_switch,
            },
        )
    }

    impl MemoryPeer {
        pub async fn send(&self, frame: Vec<u8>) {
            let _ = self.to_switch.send(Ok(Frame::Data(frame))).await;
        }

        pub async fn send_json(&self, value: serde_json::Value) {
            self.send(value.to_string().into_bytes()).await;
        }

        pub async fn send_close(&self) {
            let _ = self.to_switch.send(Ok(Frame::Close)).await;
        }

        /// Make the switch's next read fail with `reason`
        pub async fn send_error(&self, reason: &str) {
            let _ = self.to_switch.send(Err(reason.to_string())).await;
        }

        /// Next frame written by the switch, `None` once its writer is gone
        pub async fn recv(&mut self) -> Option<Frame> {
            self.from_switch.recv().await
        }

        /// Next frame decoded as JSON; `None` on close or garbage
        pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
            match self.recv().await? {
                Frame::Data(bytes) => serde_json::from_slice(&bytes).ok(),
                Frame::Close => None,
            }
        }
    }

    #[async_trait]
    impl FrameWriter for MemoryFrameWriter {
        async fn write_frame(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
            self.to_peer
                .send(Frame::Data(frame))
                .await
                .map_err(|_| TransportError::Write("memory peer dropped".to_string()))
        }

        async fn close(&mut self) -> Result<(), TransportError> {
            let _ = self.to_peer.send(Frame::Close).await;
            Ok(())
        }
    }

    #[async_trait]
    impl FrameReader for MemoryFrameReader {
        async fn read_frame(&mut self) -> Result<Frame, TransportError> {
            match self.from_peer.recv().await {
                Some(Ok(frame)) => Ok(frame),
                Some(Err(reason)) => Err(TransportError::Read(reason)),
                None => Err(TransportError::Read("memory peer dropped".to_string())),
            }
        }
    }
}
