//! Request/response correlation
//!
//! The Validator pairs each command the Sender put on the wire with the next
//! command the Receiver got back. Exactly one correlation is outstanding at a
//! time, in send order, under a fixed deadline. Any mismatch or timeout ends
//! the session; there is no reordering tolerance and no recovery.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use switchsim_core::{Command, FaultReason, SessionResult};
use tokio::sync::mpsc;
use tokio::time::{self, Instant};
use tracing::{debug, info};

use crate::context::SessionContext;

// ----------------------------------------------------------------------------
// State Machine
// ----------------------------------------------------------------------------

/// A sent command still waiting for its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCorrelation {
    pub command: Command,
    pub sent_at: Instant,
    pub deadline: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorState {
    Idle,
    AwaitingResponse(PendingCorrelation),
    /// Terminal
    Failed,
}

/// What a successful step of the state machine produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Correlation {
    Matched { command: Command, elapsed: Duration },
    /// The last expected correlation matched
    Completed { command: Command, elapsed: Duration },
}

/// Synchronous core of the Validator; the task only feeds it events
#[derive(Debug)]
pub struct Validator {
    state: ValidatorState,
    window: Duration,
    matched: usize,
    expected: Option<usize>,
}

impl Validator {
    /// `expected` is the number of matches after which the session succeeds
    pub fn new(window: Duration, expected: Option<usize>) -> Self {
        Self {
            state: ValidatorState::Idle,
            window,
            matched: 0,
            expected,
        }
    }

    pub fn state(&self) -> ValidatorState {
        self.state
    }

    pub fn matched(&self) -> usize {
        self.matched
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Idle -> AwaitingResponse; returns the deadline
    ///
    /// Ignored outside Idle, which the task never does.
    pub fn on_sent(&mut self, command: Command, now: Instant) -> Option<Instant> {
        match self.state {
            ValidatorState::Idle => {
                let pending = PendingCorrelation {
                    command,
                    sent_at: now,
                    deadline: now + self.window,
                };
                self.state = ValidatorState::AwaitingResponse(pending);
                Some(pending.deadline)
            }
            ValidatorState::AwaitingResponse(_) | ValidatorState::Failed => None,
        }
    }

    /// A response arrived at `now`
    ///
    /// Only a response strictly before the deadline can match.
    pub fn on_received(
        &mut self,
        received: Command,
        now: Instant,
    ) -> Result<Option<Correlation>, FaultReason> {
        let pending = match self.state {
            ValidatorState::AwaitingResponse(pending) => pending,
            ValidatorState::Idle | ValidatorState::Failed => return Ok(None),
        };

        if now >= pending.deadline {
            return Err(self.on_deadline());
        }

        if received != pending.command {
            self.state = ValidatorState::Failed;
            return Err(FaultReason::Mismatch {
                expected: pending.command,
                received,
            });
        }

        self.state = ValidatorState::Idle;
        self.matched += 1;
        let elapsed = now.duration_since(pending.sent_at);

        if self.expected == Some(self.matched) {
            Ok(Some(Correlation::Completed {
                command: received,
                elapsed,
            }))
        } else {
            Ok(Some(Correlation::Matched {
                command: received,
                elapsed,
            }))
        }
    }

    /// The deadline of the pending correlation elapsed
    pub fn on_deadline(&mut self) -> FaultReason {
        let command = match self.state {
            ValidatorState::AwaitingResponse(pending) => pending.command,
            // Unreachable from the task; keep the state terminal anyway.
            ValidatorState::Idle | ValidatorState::Failed => {
                self.state = ValidatorState::Failed;
                return FaultReason::Transport("deadline fired without a pending request".into());
            }
        };

        self.state = ValidatorState::Failed;
        FaultReason::Timeout {
            command,
            waited: self.window,
        }
    }
}

// ----------------------------------------------------------------------------
// Validator Task
// ----------------------------------------------------------------------------

/// Runs the [`Validator`] against the Sender's and Receiver's queues
///
/// The received queue is drained in every state so the Receiver never waits
/// on correlation. Responses seen while Idle are kept in `backlog`, oldest
/// first, and checked against the next sent command.
pub struct ValidatorTask {
    ctx: Arc<SessionContext>,
    validator: Validator,
    sent: mpsc::Receiver<Command>,
    received: mpsc::Receiver<Command>,
    backlog: VecDeque<Command>,
}

impl ValidatorTask {
    pub fn new(
        ctx: Arc<SessionContext>,
        validator: Validator,
        sent: mpsc::Receiver<Command>,
        received: mpsc::Receiver<Command>,
    ) -> Self {
        Self {
            ctx,
            validator,
            sent,
            received,
            backlog: VecDeque::new(),
        }
    }

    pub async fn run(mut self) {
        let name = self.ctx.name().to_string();
        debug!("{}: validator started", name);

        loop {
            let command = tokio::select! {
                biased;
                _ = self.ctx.cancelled() => break,
                command = self.sent.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
                received = self.received.recv() => match received {
                    Some(received) => {
                        debug!("{}: {} arrived with nothing pending, holding it", name, received);
                        self.backlog.push_back(received);
                        continue;
                    }
                    // Receiver is gone; the session already has its outcome
                    None => break,
                },
            };

            let deadline = match self.validator.on_sent(command, Instant::now()) {
                Some(deadline) => deadline,
                None => break,
            };
            debug!("{}: awaiting response to {}", name, command);

            let step = match self.backlog.pop_front() {
                Some(received) => self.validator.on_received(received, Instant::now()),
                None => tokio::select! {
                    biased;
                    _ = self.ctx.cancelled() => break,
                    received = self.received.recv() => match received {
                        Some(received) => self.validator.on_received(received, Instant::now()),
                        None => break,
                    },
                    _ = time::sleep_until(deadline) => Err(self.validator.on_deadline()),
                },
            };

            match step {
                Ok(Some(Correlation::Matched { command, elapsed })) => {
                    info!(
                        "{}: request {} and response {} matched after {:?}",
                        name, command, command, elapsed
                    );
                }
                Ok(Some(Correlation::Completed { command, elapsed })) => {
                    info!(
                        "{}: request {} and response {} matched after {:?}; script complete",
                        name, command, command, elapsed
                    );
                    self.ctx.report(SessionResult::Success);
                    break;
                }
                Ok(None) => {}
                Err(reason) => {
                    self.ctx.report(SessionResult::Fault(reason));
                    break;
                }
            }
        }

        debug!(
            "{}: validator stopped in {:?} after {} matches",
            name,
            self.validator.state(),
            self.validator.matched()
        );
    }
}
