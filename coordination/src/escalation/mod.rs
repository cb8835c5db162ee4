//! Escalation: bounded counters and the ceilings that turn them into restarts
//!
//! Three independent counters live in every [`Session`](crate::session::Session):
//!
//! ```text
//! stuck_phase     same non-queue phase polled again      ─► 20 ─► SessionError::PhaseStuck
//! in_game_errors  failed poll while a game is running    ─► 15 ─► SessionError::GameUnresponsive
//! session_restarts  any SessionError reaching the loop   ─►  5 ─► process exit
//! ```
//!
//! Crossing a ceiling is the only trigger for the matching escalation.

pub mod engine;
pub mod state;

pub use engine::{EscalationEngine, RestartDecision};
pub use state::{ErrorCounters, EscalationLimits};
