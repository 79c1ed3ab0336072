//! The three loops that drive one session
//!
//! - `SenderTask`: sole writer of the socket
//! - `ReceiverTask`: sole reader of the socket
//! - `ValidatorTask`: sole owner of the correlation state
//!
//! They talk only through bounded queues and stop when the session's
//! cancellation token fires.

pub mod receiver;
pub mod sender;
pub mod validator;

pub use receiver::ReceiverTask;
pub use sender::SenderTask;
pub use validator::{Correlation, PendingCorrelation, Validator, ValidatorState, ValidatorTask};
