//! Lobby, matchmaking and ready check.

use std::time::Duration;

use coordination::{Deadline, HandlerOutcome, Phase, Session, SessionError};
use tokio::time::sleep;
use tracing::{debug, info};

use super::PhaseHandlers;
use crate::config::lobby_name;

const LOBBY_SETTLE: Duration = Duration::from_secs(3);
const QUEUE_SETTLE: Duration = Duration::from_secs(1);
const QUEUE_POLL: Duration = Duration::from_secs(1);

impl PhaseHandlers {
    /// Create the configured lobby, start the queue, and wait out any dodge
    /// penalty. An API failure at any step abandons the attempt; the next
    /// poll brings the bot back here.
    pub(crate) async fn start_matchmaking(&mut self) -> HandlerOutcome {
        match lobby_name(self.lobby) {
            Some(name) => info!(lobby = name, "Creating lobby"),
            None => info!(queue_id = self.lobby, "Creating lobby"),
        }
        if let Err(e) = self.api.create_lobby(self.lobby).await {
            debug!(error = %e, "Lobby creation failed");
            return HandlerOutcome::Retry;
        }
        sleep(LOBBY_SETTLE).await;

        info!("Starting queue");
        if let Err(e) = self.api.start_matchmaking().await {
            debug!(error = %e, "Queue start failed");
            return HandlerOutcome::Retry;
        }
        sleep(QUEUE_SETTLE).await;

        match self.api.get_dodge_timer().await {
            Ok(remaining) if !remaining.is_zero() => {
                info!(remaining_secs = remaining.as_secs(), "Dodge timer");
                sleep(remaining).await;
                HandlerOutcome::Continue
            }
            Ok(_) => HandlerOutcome::Continue,
            Err(e) => {
                debug!(error = %e, "Dodge timer unavailable");
                HandlerOutcome::Retry
            }
        }
    }

    /// Wait until the client leaves matchmaking.
    pub(crate) async fn queue(&mut self) -> HandlerOutcome {
        info!("Waiting for Ready Check");
        let limits = self.engine.limits();
        let mut deadline = Deadline::after(limits.queue_timeout());
        let counts_outages = limits.queue_timeout_counts_outages;
        loop {
            match self.api.get_phase().await {
                Ok(Phase::Matchmaking) => {}
                Ok(_) => return HandlerOutcome::Continue,
                Err(e) => {
                    debug!(error = %e, "Phase poll failed in queue");
                    if !counts_outages {
                        deadline.restart();
                    }
                }
            }
            if deadline.expired() {
                return HandlerOutcome::Session(SessionError::QueueTimeout {
                    waited: deadline.elapsed(),
                });
            }
            sleep(QUEUE_POLL).await;
        }
    }

    /// Accept the ready check. Logged once per ready check.
    pub(crate) async fn accept_match(&mut self, session: &Session) -> HandlerOutcome {
        if session.previous_phase != Some(Phase::ReadyCheck) {
            info!("Accepting match");
        }
        if let Err(e) = self.api.accept_match().await {
            debug!(error = %e, "Accept failed");
        }
        HandlerOutcome::Continue
    }
}
