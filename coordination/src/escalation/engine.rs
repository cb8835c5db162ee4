//! Escalation engine: deterministic decisions over the session counters
//!
//! Consumes phase observations and error signals, updates the
//! [`ErrorCounters`] held in a [`Session`], and decides when a condition has
//! crossed its ceiling. No I/O and no clocks live here.

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::escalation::state::EscalationLimits;
use crate::phase::Phase;
use crate::session::Session;

/// What the orchestrator should do after a SessionError was counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestartDecision {
    /// Tear the client down and try again with the same account.
    Restart { attempt: u32 },
    /// The restart budget is spent; stop the process.
    Exhausted { attempts: u32 },
}

/// Owns the ceilings, not the counters.
#[derive(Debug, Clone, Default)]
pub struct EscalationEngine {
    limits: EscalationLimits,
}

impl EscalationEngine {
    /// Create a new engine with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom limits
    pub fn with_limits(limits: EscalationLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &EscalationLimits {
        &self.limits
    }

    /// Record a freshly polled phase and run the stuck-phase guard.
    ///
    /// A repeat of a phase that should have moved on bumps the stuck-phase
    /// counter; any change, or a phase that legitimately persists, clears it.
    /// Reaching `max_phase_repeats` yields [`SessionError::PhaseStuck`].
    pub fn observe_phase(&self, session: &mut Session, phase: Phase) -> Result<(), SessionError> {
        let persists = phase.persists_across_polls();
        let repeated = session.record_phase(phase);

        if !repeated || persists {
            session.counters.clear_stuck_phase();
            return Ok(());
        }

        let repeats = session.counters.record_repeat();
        if repeats >= self.limits.max_phase_repeats {
            let phase = session.phase.clone().unwrap_or(Phase::None);
            return Err(SessionError::PhaseStuck { phase, repeats });
        }
        Ok(())
    }

    /// Count one SessionError against the restart budget.
    pub fn record_session_error(&self, session: &mut Session) -> RestartDecision {
        let attempt = session.counters.record_session_error();
        if attempt >= self.limits.max_session_errors {
            RestartDecision::Exhausted { attempts: attempt }
        } else {
            session.reset_for_restart();
            RestartDecision::Restart { attempt }
        }
    }

    /// Count one failed poll inside a running game.
    pub fn record_game_error(&self, session: &mut Session) -> Result<(), SessionError> {
        let errors = session.counters.record_game_error();
        if errors >= self.limits.max_game_errors {
            return Err(SessionError::GameUnresponsive { errors });
        }
        Ok(())
    }
}
