//! Mutable state of one leveling session.
//!
//! A `Session` is created when an orchestrator starts, mutated only by that
//! orchestrator's loop and the handlers it passes it to, and dropped when the
//! loop exits. Nothing else reads or writes it.

use crate::account::Account;
use crate::escalation::ErrorCounters;
use crate::phase::Phase;

#[derive(Debug, Clone, Default)]
pub struct Session {
    /// Phase seen on the latest successful poll.
    pub phase: Option<Phase>,
    /// Phase seen on the poll before that.
    pub previous_phase: Option<Phase>,
    pub counters: ErrorCounters,
    /// Account being leveled by the current client instance.
    pub account: Option<Account>,
    /// Games finished by this orchestrator over its whole lifetime.
    pub games_completed: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shift the phase window forward. Returns whether the new phase equals
    /// the one seen on the previous poll.
    pub fn record_phase(&mut self, phase: Phase) -> bool {
        self.previous_phase = self.phase.take();
        let repeated = self.previous_phase.as_ref() == Some(&phase);
        self.phase = Some(phase);
        repeated
    }

    /// Whether the phase was already observed on the poll before the current
    /// one. Handlers use this to log only on entering a phase.
    pub fn phase_repeated(&self) -> bool {
        self.phase.is_some() && self.phase == self.previous_phase
    }

    pub fn begin_account(&mut self, account: Account) {
        self.account = Some(account);
    }

    pub fn record_game_completed(&mut self) -> u64 {
        self.games_completed += 1;
        self.games_completed
    }

    /// Forget everything tied to the client instance that is being torn
    /// down. The restart counter and the games tally survive.
    pub fn reset_for_restart(&mut self) {
        self.phase = None;
        self.previous_phase = None;
        self.counters.reset_for_restart();
    }

    /// Clear state after an account finished leveling.
    pub fn finish_account(&mut self) {
        self.phase = None;
        self.previous_phase = None;
        self.account = None;
        self.counters.reset_all();
    }
}
