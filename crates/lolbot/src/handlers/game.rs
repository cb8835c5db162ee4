//! The running game.

use std::time::Duration;

use async_trait::async_trait;
use coordination::{Deadline, EscalationEngine, HandlerOutcome, Phase, RetryPolicy, Session, SessionError};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::PhaseHandlers;
use crate::client_api::ClientApi;

const GAME_POLL: Duration = Duration::from_secs(5);
const RECONNECT_RETRY: Duration = Duration::from_secs(2);
const RECONNECT_SETTLE: Duration = Duration::from_secs(3);

/// Whatever happens while the phase is `InProgress`.
#[async_trait]
pub trait GameDriver: Send + Sync {
    /// Return once the game is over. Failed polls count against the
    /// in-game error ceiling through `engine`.
    async fn play_game(
        &self,
        api: &dyn ClientApi,
        engine: &EscalationEngine,
        session: &mut Session,
    ) -> HandlerOutcome;
}

/// Sits out the game without touching it.
#[derive(Debug, Clone, Copy, Default)]
pub struct AwaitGameEnd;

#[async_trait]
impl GameDriver for AwaitGameEnd {
    async fn play_game(
        &self,
        api: &dyn ClientApi,
        engine: &EscalationEngine,
        session: &mut Session,
    ) -> HandlerOutcome {
        info!("Game in progress");
        let deadline = Deadline::after(engine.limits().max_game_duration());
        loop {
            match api.get_phase().await {
                Ok(Phase::InProgress) => session.counters.clear_game_errors(),
                Ok(phase) => {
                    session.counters.clear_game_errors();
                    info!(%phase, "Game over");
                    return HandlerOutcome::Continue;
                }
                Err(e) => {
                    debug!(error = %e, "Phase poll failed in game");
                    if let Err(err) = engine.record_game_error(session) {
                        return err.into();
                    }
                }
            }
            if deadline.expired() {
                return HandlerOutcome::Session(SessionError::GameTimeout {
                    waited: deadline.elapsed(),
                });
            }
            sleep(GAME_POLL).await;
        }
    }
}

impl PhaseHandlers {
    pub(crate) async fn reconnect(&mut self) -> HandlerOutcome {
        info!("Reconnecting to game");
        let policy = RetryPolicy::new(self.engine.limits().reconnect_attempts, RECONNECT_RETRY);
        let api = &self.api;
        match policy.retry(|_| api.game_reconnect()).await {
            Ok(()) => sleep(RECONNECT_SETTLE).await,
            Err(e) => warn!(error = %e, "Could not reconnect to game"),
        }
        HandlerOutcome::Continue
    }
}
