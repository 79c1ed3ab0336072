//! Switch simulator runtime
//!
//! This crate runs simulated switches against a gateway:
//! - `RegistrationClient`: the one-shot HTTPS registration
//! - `transport`: frame-level WebSocket access, split into writer and reader
//! - `tasks`: the Sender, Receiver and Validator loops of a session
//! - `Session`: wires one connection to its three loops
//! - `Orchestrator`: runs a fleet and collects one outcome per session

pub mod context;
pub mod error;
pub mod orchestrator;
pub mod registration;
pub mod session;
pub mod store;
pub mod tasks;
pub mod transport;

pub use context::{OutcomeReceiver, OutcomeSender, SessionContext};
pub use error::{EstablishError, RegistrationError, StoreError, TransportError};
pub use orchestrator::{Orchestrator, RunReport};
pub use registration::RegistrationClient;
pub use session::{Session, SessionHandle};
pub use store::ConfigMessageStore;
pub use transport::{Frame, FrameReader, FrameWriter};

// Re-export core types for convenience
pub use switchsim_core::{
    Command, CommandTag, FaultReason, GatewayEndpoint, OutboundMessage, SessionConfig,
    SessionOutcome, SessionResult, SimulatorConfig, SwitchIdentity,
};
