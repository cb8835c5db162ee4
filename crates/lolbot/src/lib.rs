//! Unattended client session orchestration.
//!
//! The deterministic model (phases, counters, events) lives in the
//! `coordination` crate. This crate holds everything that talks to the
//! outside world and the loop that ties it together.

pub mod accounts;
pub mod client_api;
pub mod config;
pub mod game_config;
pub mod handlers;
pub mod launcher;
pub mod orchestrator;
pub mod state_machine;
pub mod supervisor;
pub mod surface;

pub use orchestrator::{Collaborators, Orchestrator, OrchestratorError};
pub use supervisor::Supervisor;
