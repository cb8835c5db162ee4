//! Escalation state: error counters and the ceilings they are checked against

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ceilings, attempt counts and wall-clock bounds for one session.
///
/// Durations are kept as whole seconds so the struct reads naturally from a
/// `[limits]` table in the bot's TOML config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationLimits {
    /// SessionErrors tolerated before the process gives up
    pub max_session_errors: u32,
    /// Consecutive identical, non-persistent phase observations before a restart
    pub max_phase_repeats: u32,
    /// Consecutive failed polls while a game is running
    pub max_game_errors: u32,
    /// Attempts at reading the phase before the client is declared unreachable
    pub phase_poll_attempts: u32,
    /// Wall-clock bound on one matchmaking wait
    pub queue_timeout_secs: u64,
    /// Whether polls that fail during matchmaking still count towards the
    /// queue timeout (false restarts the clock on every failed poll)
    pub queue_timeout_counts_outages: bool,
    /// Polls (2s apart) spent waiting for post-game stats
    pub stats_polls: u32,
    /// Attempts at leaving the post-game lobby
    pub post_game_attempts: u32,
    /// Attempts at rejoining a running game
    pub reconnect_attempts: u32,
    /// Attempts at honoring a teammate
    pub honor_attempts: u32,
    /// Wall-clock bound on one champion-select handler run
    pub champ_select_timeout_secs: u64,
    /// Wall-clock bound on waiting out one game
    pub max_game_secs: u64,
}

impl Default for EscalationLimits {
    fn default() -> Self {
        Self {
            max_session_errors: 5,
            max_phase_repeats: 20,
            max_game_errors: 15,
            phase_poll_attempts: 15,
            queue_timeout_secs: 15 * 60,
            queue_timeout_counts_outages: true,
            stats_polls: 60,
            post_game_attempts: 15,
            reconnect_attempts: 3,
            honor_attempts: 3,
            champ_select_timeout_secs: 10 * 60,
            max_game_secs: 90 * 60,
        }
    }
}

impl EscalationLimits {
    pub fn queue_timeout(&self) -> Duration {
        Duration::from_secs(self.queue_timeout_secs)
    }

    pub fn champ_select_timeout(&self) -> Duration {
        Duration::from_secs(self.champ_select_timeout_secs)
    }

    pub fn max_game_duration(&self) -> Duration {
        Duration::from_secs(self.max_game_secs)
    }
}

/// The three independent escalation counters of one orchestrator.
///
/// All counters saturate instead of wrapping and are only ever cleared by
/// the condition they track resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorCounters {
    /// SessionErrors since the last successfully leveled account
    pub session_restarts: u32,
    /// Consecutive repeats of the same non-persistent phase
    pub stuck_phase: u32,
    /// Consecutive failed polls inside a running game
    pub in_game_errors: u32,
}

impl ErrorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the restart counter and return its new value.
    pub fn record_session_error(&mut self) -> u32 {
        self.session_restarts = self.session_restarts.saturating_add(1);
        self.session_restarts
    }

    /// Bump the stuck-phase counter and return its new value.
    pub fn record_repeat(&mut self) -> u32 {
        self.stuck_phase = self.stuck_phase.saturating_add(1);
        self.stuck_phase
    }

    /// Bump the in-game error counter and return its new value.
    pub fn record_game_error(&mut self) -> u32 {
        self.in_game_errors = self.in_game_errors.saturating_add(1);
        self.in_game_errors
    }

    pub fn clear_stuck_phase(&mut self) {
        self.stuck_phase = 0;
    }

    pub fn clear_game_errors(&mut self) {
        self.in_game_errors = 0;
    }

    /// Clear the per-instance counters after a restart. The restart counter
    /// itself survives.
    pub fn reset_for_restart(&mut self) {
        self.stuck_phase = 0;
        self.in_game_errors = 0;
    }

    /// Clear everything after an account finished leveling.
    pub fn reset_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_clear(&self) -> bool {
        *self == Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = EscalationLimits::default();
        assert_eq!(limits.max_session_errors, 5);
        assert_eq!(limits.max_phase_repeats, 20);
        assert_eq!(limits.phase_poll_attempts, 15);
        assert_eq!(limits.queue_timeout(), Duration::from_secs(900));
        assert_eq!(limits.stats_polls, 60);
        assert_eq!(limits.post_game_attempts, 15);
        assert_eq!(limits.reconnect_attempts, 3);
        assert_eq!(limits.honor_attempts, 3);
    }

    #[test]
    fn test_partial_limits_table_keeps_defaults() {
        let limits: EscalationLimits =
            serde_json::from_str(r#"{"max_session_errors": 2}"#).unwrap();
        assert_eq!(limits.max_session_errors, 2);
        assert_eq!(limits.max_phase_repeats, 20);
    }

    #[test]
    fn test_restart_reset_keeps_restart_count() {
        let mut counters = ErrorCounters::new();
        counters.record_session_error();
        counters.record_repeat();
        counters.record_game_error();

        counters.reset_for_restart();
        assert_eq!(counters.session_restarts, 1);
        assert_eq!(counters.stuck_phase, 0);
        assert_eq!(counters.in_game_errors, 0);

        counters.reset_all();
        assert!(counters.is_clear());
    }

    #[test]
    fn test_counters_saturate() {
        let mut counters = ErrorCounters {
            stuck_phase: u32::MAX,
            ..ErrorCounters::default()
        };
        assert_eq!(counters.record_repeat(), u32::MAX);
    }
}
