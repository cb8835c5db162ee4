//! Phase handlers: one action routine per client phase.
//!
//! [`PhaseHandlers::dispatch`] is the whole dispatch table: an exhaustive
//! match on [`Phase`], so a new phase cannot be added without deciding how
//! the bot reacts to it.
//!
//! | Phase                | Handler                                  |
//! |----------------------|------------------------------------------|
//! | None, Lobby          | create lobby, start queue, wait out dodge |
//! | Matchmaking          | wait for a ready check (bounded)          |
//! | ReadyCheck           | accept                                    |
//! | ChampSelect          | hover then lock a champion                |
//! | InProgress           | [`game::GameDriver`]                      |
//! | Reconnect            | rejoin the running game                   |
//! | WaitingForStats      | wait for stats (bounded)                  |
//! | PreEndOfGame         | honor, clear reward popups                |
//! | EndOfGame            | back into queue (bounded)                 |
//! | Unknown              | SessionError                              |
//!
//! Handlers never return transient API failures. They absorb them, retry
//! within their own bounds, and report what the orchestrator should do next
//! as a [`HandlerOutcome`].

pub mod champ_select;
pub mod game;
pub mod post_game;
pub mod queue;

use std::sync::Arc;

use coordination::{EscalationEngine, HandlerOutcome, Phase, SessionError, Session};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::client_api::{ChampionId, ClientApi};
use crate::surface::ActionSurface;
use game::GameDriver;

pub use champ_select::{candidate_order, PickQueue};
pub use game::AwaitGameEnd;
pub use post_game::pick_honor_index;

pub struct PhaseHandlers {
    api: Arc<dyn ClientApi>,
    surface: Arc<dyn ActionSurface>,
    driver: Arc<dyn GameDriver>,
    engine: EscalationEngine,
    lobby: u32,
    champs: Vec<ChampionId>,
    rng: StdRng,
}

impl PhaseHandlers {
    pub fn new(
        api: Arc<dyn ClientApi>,
        surface: Arc<dyn ActionSurface>,
        driver: Arc<dyn GameDriver>,
        engine: EscalationEngine,
        lobby: u32,
        champs: Vec<ChampionId>,
    ) -> Self {
        Self {
            api,
            surface,
            driver,
            engine,
            lobby,
            champs,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Replace the honor-target randomness, for reproducible runs.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub async fn dispatch(&mut self, session: &mut Session, phase: &Phase) -> HandlerOutcome {
        debug!(%phase, "Dispatching phase handler");
        match phase {
            Phase::None | Phase::Lobby => self.start_matchmaking().await,
            Phase::Matchmaking => self.queue().await,
            Phase::ReadyCheck => self.accept_match(session).await,
            Phase::ChampSelect => self.champ_select().await,
            Phase::InProgress => {
                self.driver
                    .play_game(self.api.as_ref(), &self.engine, session)
                    .await
            }
            Phase::Reconnect => self.reconnect().await,
            Phase::WaitingForStats => self.wait_for_stats().await,
            Phase::PreEndOfGame => self.pre_end_of_game().await,
            Phase::EndOfGame => self.end_of_game(session).await,
            Phase::Unknown(raw) => HandlerOutcome::Session(SessionError::UnknownPhase(raw.clone())),
        }
    }
}
