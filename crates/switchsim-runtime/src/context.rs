//! Per-session context shared by the Sender, Receiver and Validator

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use switchsim_core::{SessionOutcome, SessionResult, SwitchIdentity};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Channel on which sessions hand their single outcome to the orchestrator
pub type OutcomeSender = mpsc::UnboundedSender<SessionOutcome>;
pub type OutcomeReceiver = mpsc::UnboundedReceiver<SessionOutcome>;

/// Identity, cancellation and the first-wins outcome slot of one session
///
/// Built once per session and shared by reference between its three loops.
#[derive(Debug)]
pub struct SessionContext {
    identity: SwitchIdentity,
    cancel: CancellationToken,
    reported: AtomicBool,
    outcomes: OutcomeSender,
}

impl SessionContext {
    pub fn new(identity: SwitchIdentity, outcomes: OutcomeSender) -> Arc<Self> {
        Arc::new(Self {
            identity,
            cancel: CancellationToken::new(),
            reported: AtomicBool::new(false),
            outcomes,
        })
    }

    pub fn identity(&self) -> &SwitchIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Resolves once the session has a terminal outcome or was cancelled
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn has_reported(&self) -> bool {
        self.reported.load(Ordering::Acquire)
    }

    /// Record the session's terminal result
    ///
    /// Only the first call per session is forwarded; it also cancels every
    /// loop of the session. Returns whether this call won.
    pub fn report(&self, result: SessionResult) -> bool {
        if self
            .reported
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("{}: discarding late outcome ({})", self.name(), result);
            return false;
        }

        match &result {
            SessionResult::Fault(reason) => warn!("{}: session failed: {}", self.name(), reason),
            other => info!("{}: session ended: {}", self.name(), other),
        }

        let outcome = SessionOutcome {
            switch_name: self.name().to_string(),
            result,
        };
        if self.outcomes.send(outcome).is_err() {
            debug!("{}: nobody is waiting for the outcome", self.name());
        }

        self.cancel.cancel();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchsim_core::FaultReason;

    #[tokio::test]
    async fn test_first_report_wins() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(SwitchIdentity::new("sw0"), tx);

        assert!(ctx.report(SessionResult::GracefulClose));
        assert!(!ctx.report(SessionResult::Fault(FaultReason::Transport("late".into()))));
        assert!(ctx.is_cancelled());

        let outcome = rx.recv().await.unwrap();
        assert_eq!(outcome.switch_name, "sw0");
        assert_eq!(outcome.result, SessionResult::GracefulClose);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_concurrent_reports_yield_one_outcome() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let ctx = SessionContext::new(SwitchIdentity::new("sw0"), tx);

        let mut handles = Vec::new();
        for i in 0..8 {
            let ctx = Arc::clone(&ctx);
            handles.push(tokio::spawn(async move {
                ctx.report(SessionResult::Fault(FaultReason::Decode(format!("reporter {}", i))))
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }

        assert_eq!(winners, 1);
        assert!(rx.recv().await.is_some());
        assert!(rx.try_recv().is_err());
    }
}
