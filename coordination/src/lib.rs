//! Session coordination library
//!
//! The deterministic half of the bot: everything that decides, nothing that
//! talks to the client.
//!
//! - [`phase`]: the client lifecycle phases and how raw phase strings parse
//! - [`session`]: the state one orchestrator owns while leveling an account
//! - [`escalation`]: error counters, their ceilings, and restart decisions
//! - [`error`] / [`outcome`]: the SessionError tier and handler results
//! - [`resilience`]: paced retries and wall-clock deadlines on tokio's clock
//! - [`events`]: the worker → supervisor event channel and its aggregate

pub mod account;
pub mod error;
pub mod escalation;
pub mod events;
pub mod outcome;
pub mod phase;
pub mod resilience;
pub mod session;

pub use account::Account;
pub use error::SessionError;
pub use escalation::{ErrorCounters, EscalationEngine, EscalationLimits, RestartDecision};
pub use events::{Aggregate, EventBus, EventReceiver, EventSink, SessionEvent, WorkerId};
pub use outcome::HandlerOutcome;
pub use phase::Phase;
pub use resilience::{Deadline, RetryExhausted, RetryPolicy};
pub use session::Session;
