//! Event channel between orchestrators and their supervisor
//!
//! Many producers, one consumer: every orchestrator holds a cloned
//! [`EventSink`], the supervisor owns the receiving end and folds events
//! into an [`Aggregate`].

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::mpsc;
use tracing::debug;

use super::types::{SessionEvent, WorkerId};

/// Sending half handed to each orchestrator.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSink {
    /// Publish an event to the supervisor. A supervisor that has already
    /// gone away is not an error for the worker.
    pub fn publish(&self, event: SessionEvent) {
        let event_type = event.event_type();
        if self.sender.send(event).is_err() {
            debug!(event_type, "Event dropped (no supervisor)");
        }
    }
}

/// Receiving half owned by the supervisor.
pub struct EventBus {
    sender: mpsc::UnboundedSender<SessionEvent>,
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// A new producer handle.
    pub fn sink(&self) -> EventSink {
        EventSink {
            sender: self.sender.clone(),
        }
    }

    /// Drop the bus's own sender so [`EventReceiver::recv`] returns `None`
    /// once every handed-out sink is gone.
    pub fn close_producers(self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiver left after the bus stopped producing sinks.
pub struct EventReceiver {
    receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl EventReceiver {
    pub async fn recv(&mut self) -> Option<SessionEvent> {
        self.receiver.recv().await
    }
}

/// Totals the supervisor keeps across all workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    pub games_completed: u64,
    /// Latest restart count reported by each worker.
    pub errors_by_worker: BTreeMap<WorkerId, u32>,
    pub leveled_accounts: Vec<String>,
    pub terminated: BTreeSet<WorkerId>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::GameCompleted { .. } => self.games_completed += 1,
            SessionEvent::ErrorCount {
                worker,
                session_restarts,
                ..
            } => {
                self.errors_by_worker.insert(*worker, *session_restarts);
            }
            SessionEvent::Restarting {
                worker, attempt, ..
            } => {
                self.errors_by_worker.insert(*worker, *attempt);
            }
            SessionEvent::AccountLeveled { username, .. } => {
                self.leveled_accounts.push(username.clone());
            }
            SessionEvent::Terminated { worker, .. } => {
                self.terminated.insert(*worker);
            }
        }
    }

    /// Sum of the current restart counts of every worker.
    pub fn total_errors(&self) -> u32 {
        self.errors_by_worker.values().sum()
    }
}
