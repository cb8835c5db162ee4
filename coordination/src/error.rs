//! Session-tier error taxonomy.
//!
//! A [`SessionError`] means the running client instance is in a state the bot
//! cannot recover from in place. The orchestrator answers it by restarting the
//! client while keeping the account's progress. Transient API failures never
//! become a `SessionError` on their own; only bounded retries running out do.

use std::time::Duration;

use thiserror::Error;

use crate::phase::Phase;

/// Why the current client instance has to be restarted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Unknown phase: {0}")]
    UnknownPhase(String),

    #[error("Transition error. Phase {phase} will not change after {repeats} polls")]
    PhaseStuck { phase: Phase, repeats: u32 },

    #[error("Could not get phase after {attempts} attempts: {cause}")]
    PhaseUnavailable { attempts: u32, cause: String },

    #[error("Queue timeout after {}s in matchmaking", .waited.as_secs())]
    QueueTimeout { waited: Duration },

    #[error("Champ select did not finish within {}s", .waited.as_secs())]
    ChampSelectTimeout { waited: Duration },

    #[error("Game unresponsive after {errors} consecutive failed polls")]
    GameUnresponsive { errors: u32 },

    #[error("Game still in progress after {}s", .waited.as_secs())]
    GameTimeout { waited: Duration },

    #[error("Waiting for stats timeout after {polls} polls")]
    StatsTimeout { polls: u32 },

    #[error("Could not exit play-again screen after {attempts} attempts")]
    PostGameStuck { attempts: u32 },
}

impl SessionError {
    /// Short machine-readable code, used as a structured log field and in
    /// supervisor events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPhase(_) => "unknown_phase",
            Self::PhaseStuck { .. } => "phase_stuck",
            Self::PhaseUnavailable { .. } => "phase_unavailable",
            Self::QueueTimeout { .. } => "queue_timeout",
            Self::ChampSelectTimeout { .. } => "champ_select_timeout",
            Self::GameUnresponsive { .. } => "game_unresponsive",
            Self::GameTimeout { .. } => "game_timeout",
            Self::StatsTimeout { .. } => "stats_timeout",
            Self::PostGameStuck { .. } => "post_game_stuck",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_cause() {
        let err = SessionError::PhaseUnavailable {
            attempts: 15,
            cause: "connection refused".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("15"));
        assert!(msg.contains("connection refused"));
    }

    #[test]
    fn test_stuck_message_names_phase() {
        let err = SessionError::PhaseStuck {
            phase: Phase::Lobby,
            repeats: 20,
        };
        assert_eq!(
            err.to_string(),
            "Transition error. Phase Lobby will not change after 20 polls"
        );
        assert_eq!(err.code(), "phase_stuck");
    }

    #[test]
    fn test_timeouts_render_seconds() {
        let err = SessionError::QueueTimeout {
            waited: Duration::from_secs(900),
        };
        assert!(err.to_string().contains("900s"));
    }

    #[test]
    fn test_implements_std_error() {
        fn assert_std_error<E: std::error::Error>(_: &E) {}
        assert_std_error(&SessionError::StatsTimeout { polls: 60 });
    }
}
