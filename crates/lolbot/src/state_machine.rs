//! Orchestrator lifecycle: explicit states and legal transition guards.
//!
//! The phase loop itself is driven by the client; this machine tracks the
//! coarser lifecycle around it (which account, which client instance, why
//! the last one was torn down) so a run can be reconstructed from its
//! transition log.

use std::fmt;
use std::time::Instant;

use serde::{Deserialize, Serialize};

/// Transition records kept for the log; older ones are dropped.
pub const MAX_RECORDED_TRANSITIONS: usize = 64;

/// Lifecycle states of one orchestrator.
///
/// Every run starts at `Setup` and ends at `Terminated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Priming auth and overwriting the game settings.
    Setup,
    /// Asking the store for an account below the target level.
    AcquiringAccount,
    /// Starting the client and logging in.
    Launching,
    /// Polling phases and dispatching handlers.
    Leveling,
    /// The account reached its target level and the client was closed.
    Completed,
    /// A SessionError was counted; the client is being torn down.
    Restarting,
    /// The run is over. Terminal.
    Terminated,
}

impl LifecycleState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "Setup"),
            Self::AcquiringAccount => write!(f, "AcquiringAccount"),
            Self::Launching => write!(f, "Launching"),
            Self::Leveling => write!(f, "Leveling"),
            Self::Completed => write!(f, "Completed"),
            Self::Restarting => write!(f, "Restarting"),
            Self::Terminated => write!(f, "Terminated"),
        }
    }
}

/// Legal edges of the lifecycle graph:
/// ```text
/// Setup → AcquiringAccount
/// AcquiringAccount → Launching
/// Launching → Leveling
/// Leveling → Completed | Restarting
/// Completed → AcquiringAccount
/// Restarting → AcquiringAccount
/// (any non-terminal) → Terminated
/// ```
fn is_legal_transition(from: LifecycleState, to: LifecycleState) -> bool {
    use LifecycleState::*;

    if to == Terminated && !from.is_terminal() {
        return true;
    }

    matches!(
        (from, to),
        (Setup, AcquiringAccount)
            | (AcquiringAccount, Launching)
            | (Launching, Leveling)
            | (Leveling, Completed)
            | (Leveling, Restarting)
            | (Completed, AcquiringAccount)
            | (Restarting, AcquiringAccount)
    )
}

/// A single recorded transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: LifecycleState,
    pub to: LifecycleState,
    /// Client instances launched so far.
    pub launches: u32,
    /// Milliseconds since the machine was created.
    pub elapsed_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct IllegalTransition {
    pub from: LifecycleState,
    pub to: LifecycleState,
}

impl fmt::Display for IllegalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Illegal lifecycle transition: {} → {}", self.from, self.to)
    }
}

impl std::error::Error for IllegalTransition {}

pub struct StateMachine {
    current: LifecycleState,
    launches: u32,
    created_at: Instant,
    /// The most recent transitions, at most [`MAX_RECORDED_TRANSITIONS`].
    transitions: Vec<TransitionRecord>,
    total_transitions: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            current: LifecycleState::Setup,
            launches: 0,
            created_at: Instant::now(),
            transitions: Vec::new(),
            total_transitions: 0,
        }
    }

    pub fn current(&self) -> LifecycleState {
        self.current
    }

    pub fn launches(&self) -> u32 {
        self.launches
    }

    pub fn advance(
        &mut self,
        to: LifecycleState,
        reason: Option<&str>,
    ) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.current, to) {
            return Err(IllegalTransition {
                from: self.current,
                to,
            });
        }
        if to == LifecycleState::Launching {
            self.launches += 1;
        }

        let record = TransitionRecord {
            from: self.current,
            to,
            launches: self.launches,
            elapsed_ms: self.created_at.elapsed().as_millis() as u64,
            reason: reason.map(String::from),
        };

        tracing::debug!(
            from = %self.current,
            to = %to,
            launches = self.launches,
            reason = reason.unwrap_or(""),
            "Lifecycle transition"
        );

        self.transitions.push(record);
        if self.transitions.len() > MAX_RECORDED_TRANSITIONS {
            let excess = self.transitions.len() - MAX_RECORDED_TRANSITIONS;
            self.transitions.drain(..excess);
        }
        self.total_transitions += 1;
        self.current = to;
        Ok(())
    }

    /// Move to `Terminated`. Legal from every non-terminal state.
    pub fn terminate(&mut self, reason: &str) -> Result<(), IllegalTransition> {
        self.advance(LifecycleState::Terminated, Some(reason))
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_terminal()
    }

    /// The retained tail of the transition log, oldest first.
    pub fn transitions(&self) -> &[TransitionRecord] {
        &self.transitions
    }

    /// Transitions made over the machine's lifetime, including dropped ones.
    pub fn total_transitions(&self) -> u64 {
        self.total_transitions
    }

    /// `Setup → current (Nms, N transitions) [A → B → …]`, listing only the
    /// retained records.
    pub fn summary(&self) -> String {
        let states: Vec<String> = self.transitions.iter().map(|t| t.to.to_string()).collect();
        let mut out = format!(
            "{} → {} ({}ms, {} transitions)",
            LifecycleState::Setup,
            self.current,
            self.created_at.elapsed().as_millis(),
            self.total_transitions,
        );
        if !states.is_empty() {
            let dropped = self.total_transitions > self.transitions.len() as u64;
            let prefix = if dropped { "... → " } else { "" };
            out.push_str(&format!(" [{prefix}{}]", states.join(" → ")));
        }
        out
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leveling() -> StateMachine {
        let mut sm = StateMachine::new();
        sm.advance(LifecycleState::AcquiringAccount, None).unwrap();
        sm.advance(LifecycleState::Launching, None).unwrap();
        sm.advance(LifecycleState::Leveling, None).unwrap();
        sm
    }

    #[test]
    fn test_initial_state() {
        let sm = StateMachine::new();
        assert_eq!(sm.current(), LifecycleState::Setup);
        assert!(!sm.is_terminal());
        assert_eq!(sm.launches(), 0);
    }

    #[test]
    fn test_account_cycle() {
        let mut sm = leveling();
        sm.advance(LifecycleState::Completed, Some("leveled")).unwrap();
        sm.advance(LifecycleState::AcquiringAccount, None).unwrap();
        sm.advance(LifecycleState::Launching, None).unwrap();
        assert_eq!(sm.launches(), 2);
        assert_eq!(sm.transitions().len(), 6);
    }

    #[test]
    fn test_restart_loop_counts_launches() {
        let mut sm = leveling();
        for _ in 0..3 {
            sm.advance(LifecycleState::Restarting, Some("phase_stuck"))
                .unwrap();
            sm.advance(LifecycleState::AcquiringAccount, None).unwrap();
            sm.advance(LifecycleState::Launching, None).unwrap();
            sm.advance(LifecycleState::Leveling, None).unwrap();
        }
        assert_eq!(sm.launches(), 4);
    }

    #[test]
    fn test_terminate_from_any_state() {
        for state in [
            LifecycleState::Setup,
            LifecycleState::AcquiringAccount,
            LifecycleState::Launching,
            LifecycleState::Leveling,
            LifecycleState::Completed,
            LifecycleState::Restarting,
        ] {
            let mut sm = StateMachine {
                current: state,
                launches: 0,
                created_at: Instant::now(),
                transitions: Vec::new(),
                total_transitions: 0,
            };
            assert!(sm.terminate("test").is_ok());
            assert!(sm.is_terminal());
        }
    }

    #[test]
    fn test_cannot_leave_terminated() {
        let mut sm = StateMachine::new();
        sm.terminate("setup failed").unwrap();
        let err = sm
            .advance(LifecycleState::AcquiringAccount, None)
            .unwrap_err();
        assert_eq!(err.from, LifecycleState::Terminated);
        assert!(sm.terminate("again").is_err());
    }

    #[test]
    fn test_illegal_skip() {
        let mut sm = StateMachine::new();
        assert!(sm.advance(LifecycleState::Leveling, None).is_err());
        let mut sm = leveling();
        assert!(sm.advance(LifecycleState::Launching, None).is_err());
    }

    #[test]
    fn test_record_reason_and_summary() {
        let mut sm = leveling();
        sm.advance(LifecycleState::Restarting, Some("queue_timeout"))
            .unwrap();
        assert_eq!(
            sm.transitions().last().unwrap().reason.as_deref(),
            Some("queue_timeout")
        );
        let summary = sm.summary();
        assert!(summary.contains("Restarting"));
        assert!(summary.contains("4 transitions"));
    }

    #[test]
    fn test_transition_log_keeps_recent_records() {
        let mut sm = leveling();
        for _ in 0..100 {
            sm.advance(LifecycleState::Completed, Some("leveled")).unwrap();
            sm.advance(LifecycleState::AcquiringAccount, None).unwrap();
            sm.advance(LifecycleState::Launching, None).unwrap();
            sm.advance(LifecycleState::Leveling, None).unwrap();
        }
        assert_eq!(sm.transitions().len(), MAX_RECORDED_TRANSITIONS);
        assert_eq!(sm.total_transitions(), 403);
        assert_eq!(sm.launches(), 101);
        let last = sm.transitions().last().unwrap();
        assert_eq!(last.to, LifecycleState::Leveling);
        assert_eq!(last.launches, 101);

        let summary = sm.summary();
        assert!(summary.contains("403 transitions"));
        assert!(summary.contains("[... → "));
        assert_eq!(summary.matches(" → ").count(), MAX_RECORDED_TRANSITIONS + 1);
    }
}
