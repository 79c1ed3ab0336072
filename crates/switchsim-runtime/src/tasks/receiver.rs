//! Inbound half of a session

use std::sync::Arc;

use switchsim_core::{
    Command, CommandTag, FaultReason, InboundEnvelope, ServerConfigMessage, SessionResult,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::context::SessionContext;
use crate::store::ConfigMessageStore;
use crate::transport::{Frame, FrameReader};

/// Reads gateway frames, persists config pushes and feeds the Validator
pub struct ReceiverTask<R> {
    ctx: Arc<SessionContext>,
    reader: R,
    received: mpsc::Sender<Command>,
    store: ConfigMessageStore,
}

impl<R: FrameReader> ReceiverTask<R> {
    pub fn new(
        ctx: Arc<SessionContext>,
        reader: R,
        received: mpsc::Sender<Command>,
        store: ConfigMessageStore,
    ) -> Self {
        Self {
            ctx,
            reader,
            received,
            store,
        }
    }

    pub async fn run(mut self) {
        debug!("{}: receiver started", self.ctx.name());

        loop {
            let frame = tokio::select! {
                biased;
                _ = self.ctx.cancelled() => break,
                frame = self.reader.read_frame() => frame,
            };

            let terminal = match frame {
                Ok(Frame::Data(bytes)) => self.handle_frame(bytes).await.err(),
                Ok(Frame::Close) => {
                    info!("{}: close frame received, closing websocket gracefully", self.ctx.name());
                    Some(SessionResult::GracefulClose)
                }
                Err(e) if e.is_peer_close() => {
                    info!("{}: gateway closed the connection", self.ctx.name());
                    Some(SessionResult::GracefulClose)
                }
                Err(e) => Some(SessionResult::Fault(FaultReason::Transport(e.to_string()))),
            };

            if let Some(result) = terminal {
                self.ctx.report(result);
                break;
            }
        }

        debug!("{}: receiver stopped", self.ctx.name());
    }

    async fn handle_frame(&mut self, bytes: Vec<u8>) -> Result<(), SessionResult> {
        let envelope: InboundEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| SessionResult::Fault(FaultReason::Decode(e.to_string())))?;

        info!(
            "{}: gateway {} message received (responseCode {})",
            self.ctx.name(),
            envelope.cmd,
            envelope.response_code
        );

        let command = match envelope.cmd {
            CommandTag::Recognized(command) => command,
            CommandTag::Unrecognized(raw) => {
                info!("{}: ignoring unrecognized command {}", self.ctx.name(), raw);
                return Ok(());
            }
        };

        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => return Ok(()),
            forwarded = self.received.send(command) => {
                if forwarded.is_err() {
                    debug!("{}: validator gone, {} not correlated", self.ctx.name(), command);
                }
            }
        }

        match command {
            Command::ConfigMsg => self.persist_config(&bytes).await,
            Command::CheckIn | Command::AddMapping => Ok(()),
        }
    }

    async fn persist_config(&mut self, bytes: &[u8]) -> Result<(), SessionResult> {
        match serde_json::from_slice::<ServerConfigMessage>(bytes) {
            Ok(config) => debug!(
                "{}: config has {} buckets, {} active and {} deactivated collectors",
                self.ctx.name(),
                config.data.buckets.len(),
                config.data.active.len(),
                config.data.deactivated.len()
            ),
            Err(e) => warn!("{}: config message has unexpected shape: {}", self.ctx.name(), e),
        }

        self.store
            .persist(self.ctx.name(), bytes)
            .await
            .map(|_| ())
            .map_err(|e| SessionResult::Fault(FaultReason::Persist(e.to_string())))
    }
}
