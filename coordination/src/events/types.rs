//! Event types reported by orchestrators to their supervisor
//!
//! Workers never touch shared counters; everything the supervisor tallies
//! arrives as one of these events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Index of the orchestrator that produced an event.
pub type WorkerId = usize;

/// All supervisor-facing session events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A game finished and the client left the post-game screen
    GameCompleted {
        worker: WorkerId,
        games_completed: u64,
        timestamp: DateTime<Utc>,
    },

    /// The worker's current restart count changed
    ErrorCount {
        worker: WorkerId,
        session_restarts: u32,
        timestamp: DateTime<Utc>,
    },

    /// A SessionError was counted and the client is being restarted
    Restarting {
        worker: WorkerId,
        code: String,
        reason: String,
        attempt: u32,
        timestamp: DateTime<Utc>,
    },

    /// An account reached its target level
    AccountLeveled {
        worker: WorkerId,
        username: String,
        level: u32,
        timestamp: DateTime<Utc>,
    },

    /// The worker's loop returned and it will not produce more events
    Terminated {
        worker: WorkerId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

impl SessionEvent {
    /// Get the event type as a string
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::GameCompleted { .. } => "game_completed",
            Self::ErrorCount { .. } => "error_count",
            Self::Restarting { .. } => "restarting",
            Self::AccountLeveled { .. } => "account_leveled",
            Self::Terminated { .. } => "terminated",
        }
    }

    pub fn worker(&self) -> WorkerId {
        match self {
            Self::GameCompleted { worker, .. }
            | Self::ErrorCount { worker, .. }
            | Self::Restarting { worker, .. }
            | Self::AccountLeveled { worker, .. }
            | Self::Terminated { worker, .. } => *worker,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::GameCompleted { timestamp, .. }
            | Self::ErrorCount { timestamp, .. }
            | Self::Restarting { timestamp, .. }
            | Self::AccountLeveled { timestamp, .. }
            | Self::Terminated { timestamp, .. } => *timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SessionEvent::Restarting {
            worker: 2,
            code: "phase_stuck".to_string(),
            reason: "Transition error".to_string(),
            attempt: 1,
            timestamp: Utc::now(),
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"restarting\""));

        let parsed: SessionEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type(), "restarting");
        assert_eq!(parsed.worker(), 2);
    }
}
