//! Outbound half of a session

use std::sync::Arc;

use switchsim_core::{Command, CommandTag, FaultReason, OutboundMessage, SessionResult};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::context::SessionContext;
use crate::transport::FrameWriter;

/// Drains the outbound queue onto the socket in FIFO order
pub struct SenderTask<W> {
    ctx: Arc<SessionContext>,
    writer: W,
    outbound: mpsc::Receiver<OutboundMessage>,
    sent: mpsc::Sender<Command>,
}

impl<W: FrameWriter> SenderTask<W> {
    pub fn new(
        ctx: Arc<SessionContext>,
        writer: W,
        outbound: mpsc::Receiver<OutboundMessage>,
        sent: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            ctx,
            writer,
            outbound,
            sent,
        }
    }

    pub async fn run(mut self) {
        debug!("{}: sender started", self.ctx.name());

        loop {
            let message = tokio::select! {
                biased;
                _ = self.ctx.cancelled() => break,
                message = self.outbound.recv() => message,
            };

            let Some(message) = message else {
                // Nothing more will be queued; hold the socket until the session ends.
                self.ctx.cancelled().await;
                break;
            };

            if let Err(reason) = self.send(message).await {
                self.ctx.report(SessionResult::Fault(reason));
                break;
            }
        }

        if let Err(e) = self.writer.close().await {
            debug!("{}: close after session end failed: {}", self.ctx.name(), e);
        }
        debug!("{}: sender stopped", self.ctx.name());
    }

    async fn send(&mut self, message: OutboundMessage) -> Result<(), FaultReason> {
        let frame = serde_json::to_vec(&message.payload).map_err(|e| FaultReason::Encode {
            command: message.tag.to_string(),
            reason: e.to_string(),
        })?;

        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => return Ok(()),
            written = self.writer.write_frame(frame) => {
                written.map_err(|e| FaultReason::Transport(e.to_string()))?;
            }
        }
        info!("{}: {} message sent", self.ctx.name(), message.tag);

        match message.tag {
            CommandTag::Recognized(command) => {
                tokio::select! {
                    biased;
                    _ = self.ctx.cancelled() => {}
                    forwarded = self.sent.send(command) => {
                        if forwarded.is_err() {
                            debug!("{}: validator gone, {} not correlated", self.ctx.name(), command);
                        }
                    }
                }
            }
            CommandTag::Unrecognized(raw) => {
                debug!("{}: {} is not correlated", self.ctx.name(), raw);
            }
        }

        Ok(())
    }
}
