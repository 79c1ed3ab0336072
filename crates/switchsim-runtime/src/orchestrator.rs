//! Drives a fleet of simulated switches through registration and session
//!
//! Each switch registers over HTTPS, then opens its WebSocket session. The
//! orchestrator waits for exactly one outcome per established session.
//! Switches that fail either step are logged and left out of the wait.

use std::time::Duration;

use switchsim_core::{
    ConfigError, GatewayEndpoint, SessionConfig, SessionOutcome, SessionResult, SimulatorConfig,
    SwitchIdentity,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::context::OutcomeSender;
use crate::registration::RegistrationClient;
use crate::session::{Session, SessionHandle};
use crate::store::ConfigMessageStore;

// ----------------------------------------------------------------------------
// Run Report
// ----------------------------------------------------------------------------

/// What happened to every switch of one run
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<SessionOutcome>,
    pub registration_failures: Vec<String>,
    pub establish_failures: Vec<String>,
}

impl RunReport {
    pub fn successes(&self) -> usize {
        self.count(|result| matches!(result, SessionResult::Success))
    }

    pub fn graceful_closes(&self) -> usize {
        self.count(|result| matches!(result, SessionResult::GracefulClose))
    }

    pub fn faults(&self) -> impl Iterator<Item = &SessionOutcome> {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.result.is_fault())
    }

    /// True when no switch failed at any stage
    pub fn is_clean(&self) -> bool {
        self.registration_failures.is_empty()
            && self.establish_failures.is_empty()
            && self.faults().next().is_none()
    }

    fn count(&self, predicate: impl Fn(&SessionResult) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| predicate(&outcome.result))
            .count()
    }
}

enum Setup {
    Established(SessionHandle),
    RegistrationFailed(String),
    EstablishFailed(String),
}

// ----------------------------------------------------------------------------
// Orchestrator
// ----------------------------------------------------------------------------

pub struct Orchestrator {
    identities: Vec<SwitchIdentity>,
    endpoint: GatewayEndpoint,
    handshake_timeout: Duration,
    session: SessionConfig,
    store: ConfigMessageStore,
}

impl Orchestrator {
    pub fn new(config: &SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            identities: config.switches.identities(),
            endpoint: config.gateway.endpoint()?,
            handshake_timeout: config.gateway.handshake_timeout(),
            session: config.session.clone(),
            store: ConfigMessageStore::new(config.storage.output_dir.clone()),
        })
    }

    pub fn endpoint(&self) -> &GatewayEndpoint {
        &self.endpoint
    }

    /// Run every switch and block until each established session has ended
    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();

        let registrar = match RegistrationClient::new(self.endpoint.register_url().clone()) {
            Ok(registrar) => registrar,
            Err(e) => {
                error!("Can't build registration client: {}", e);
                report.registration_failures = self
                    .identities
                    .iter()
                    .map(|identity| identity.name().to_string())
                    .collect();
                return report;
            }
        };

        info!(
            "Start switch registration for {} switches against {}",
            self.identities.len(),
            self.endpoint.register_url()
        );

        let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
        let mut setups = JoinSet::new();
        for identity in &self.identities {
            setups.spawn(self.set_up(identity.clone(), registrar.clone(), outcome_tx.clone()));
        }
        drop(outcome_tx);

        let mut sessions = Vec::new();
        while let Some(joined) = setups.join_next().await {
            match joined {
                Ok(Setup::Established(handle)) => sessions.push(handle),
                Ok(Setup::RegistrationFailed(name)) => report.registration_failures.push(name),
                Ok(Setup::EstablishFailed(name)) => report.establish_failures.push(name),
                Err(e) => error!("Switch setup task failed: {}", e),
            }
        }
        info!(
            "Registration procedure all done: {} sessions established",
            sessions.len()
        );

        while report.outcomes.len() < sessions.len() {
            match outcome_rx.recv().await {
                Some(outcome) => {
                    info!("{}: websocket closed ({})", outcome.switch_name, outcome.result);
                    report.outcomes.push(outcome);
                }
                None => {
                    warn!(
                        "Outcome channel closed with {} of {} outcomes",
                        report.outcomes.len(),
                        sessions.len()
                    );
                    break;
                }
            }
        }

        for session in sessions {
            session.join().await;
        }
        info!("All websockets closed");

        report
    }

    fn set_up(
        &self,
        identity: SwitchIdentity,
        registrar: RegistrationClient,
        outcomes: OutcomeSender,
    ) -> impl std::future::Future<Output = Setup> + Send + 'static {
        let endpoint = self.endpoint.clone();
        let handshake_timeout = self.handshake_timeout;
        let session = Session::new(
            identity.clone(),
            self.session.clone(),
            self.store.clone(),
            outcomes,
        );

        async move {
            if let Err(e) = registrar.register(&identity).await {
                warn!("{}: https request failed: {}", identity, e);
                return Setup::RegistrationFailed(identity.name().to_string());
            }
            info!("{}: https request succeeded", identity);

            match session.establish(&endpoint, handshake_timeout).await {
                Ok(handle) => Setup::Established(handle),
                Err(e) => {
                    warn!("{}: websocket request failed: {}", identity, e);
                    Setup::EstablishFailed(identity.name().to_string())
                }
            }
        }
    }
}
