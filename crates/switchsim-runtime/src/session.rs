//! One simulated switch's WebSocket session
//!
//! A session owns one connection and the three tasks around it. Whichever
//! task first meets a terminal condition reports the session's outcome and
//! cancels the other two.

use std::sync::Arc;
use std::time::Duration;

use switchsim_core::{
    session_script, GatewayEndpoint, OutboundMessage, SessionConfig, SwitchIdentity,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::context::{OutcomeSender, SessionContext};
use crate::error::EstablishError;
use crate::store::ConfigMessageStore;
use crate::tasks::{ReceiverTask, SenderTask, Validator, ValidatorTask};
use crate::transport::{self, FrameReader, FrameWriter};

// ----------------------------------------------------------------------------
// Session
// ----------------------------------------------------------------------------

/// Everything needed to bring one session up
pub struct Session {
    identity: SwitchIdentity,
    config: SessionConfig,
    store: ConfigMessageStore,
    outcomes: OutcomeSender,
    script: Vec<OutboundMessage>,
}

impl Session {
    /// Session that plays the standard message script
    pub fn new(
        identity: SwitchIdentity,
        config: SessionConfig,
        store: ConfigMessageStore,
        outcomes: OutcomeSender,
    ) -> Self {
        let script = session_script(&identity);
        Self {
            identity,
            config,
            store,
            outcomes,
            script,
        }
    }

    /// Replace the message script
    pub fn with_script(mut self, script: Vec<OutboundMessage>) -> Self {
        self.script = script;
        self
    }

    /// Number of correlations after which the session succeeds
    fn expected_correlations(&self) -> Option<usize> {
        if !self.config.complete_after_script {
            return None;
        }
        let recognized = self
            .script
            .iter()
            .filter(|message| message.tag.command().is_some())
            .count();
        (recognized > 0).then_some(recognized)
    }

    /// Dial the gateway and start the session
    pub async fn establish(
        self,
        endpoint: &GatewayEndpoint,
        handshake_timeout: Duration,
    ) -> Result<SessionHandle, EstablishError> {
        info!("{}: Sending websocket request", self.identity);
        let (writer, reader) = transport::connect(endpoint.session_url(), handshake_timeout).await?;

        info!("{}: Websocket established", self.identity);
        Ok(self.start(writer, reader).await)
    }

    /// Spawn the three tasks over an open connection and queue the script
    pub async fn start<W, R>(self, writer: W, reader: R) -> SessionHandle
    where
        W: FrameWriter,
        R: FrameReader,
    {
        let expected = self.expected_correlations();
        let capacity = self.config.queue_capacity.max(1);
        let ctx = SessionContext::new(self.identity, self.outcomes);

        let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
        let (sent_tx, sent_rx) = mpsc::channel(capacity);
        let (received_tx, received_rx) = mpsc::channel(capacity);

        let sender = SenderTask::new(Arc::clone(&ctx), writer, outbound_rx, sent_tx);
        let receiver = ReceiverTask::new(Arc::clone(&ctx), reader, received_tx, self.store);
        let validator = ValidatorTask::new(
            Arc::clone(&ctx),
            Validator::new(self.config.correlation_timeout(), expected),
            sent_rx,
            received_rx,
        );

        let handle = SessionHandle {
            tasks: vec![
                tokio::spawn(sender.run()),
                tokio::spawn(receiver.run()),
                tokio::spawn(validator.run()),
            ],
            outbound: outbound_tx,
            ctx,
        };

        for message in self.script {
            info!("{}: forwarding {} message to sender", handle.ctx.name(), message.tag);
            if !handle.enqueue(message).await {
                warn!("{}: session ended before the script was queued", handle.ctx.name());
                break;
            }
        }

        handle
    }
}

// ----------------------------------------------------------------------------
// Session Handle
// ----------------------------------------------------------------------------

/// A running session
pub struct SessionHandle {
    ctx: Arc<SessionContext>,
    outbound: mpsc::Sender<OutboundMessage>,
    tasks: Vec<JoinHandle<()>>,
}

impl SessionHandle {
    pub fn identity(&self) -> &SwitchIdentity {
        self.ctx.identity()
    }

    /// Queue a message for the Sender; false once the session has ended
    pub async fn enqueue(&self, message: OutboundMessage) -> bool {
        tokio::select! {
            biased;
            _ = self.ctx.cancelled() => false,
            queued = self.outbound.send(message) => queued.is_ok(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.ctx.has_reported()
    }

    /// Stop the session without an outcome of its own
    pub fn cancel(&self) {
        self.ctx.cancel_token().cancel();
    }

    /// Wait for all three tasks to exit
    pub async fn join(self) {
        let name = self.ctx.name().to_string();
        drop(self.outbound);
        for task in self.tasks {
            if let Err(e) = task.await {
                error!("{}: session task failed: {}", name, e);
            }
        }
    }
}
