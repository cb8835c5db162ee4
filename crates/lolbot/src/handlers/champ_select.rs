//! Champion select: hover a champion, then lock it in.

use std::time::Duration;

use coordination::{Deadline, HandlerOutcome, SessionError};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::PhaseHandlers;
use crate::client_api::ChampionId;

const LOCKED_PACE: Duration = Duration::from_secs(2);
const WAITING_PACE: Duration = Duration::from_secs(1);

/// Order in which champions are tried: configured champions the client
/// offers, in configured order, then every other offered champion.
pub fn candidate_order(priority: &[ChampionId], pickable: &[ChampionId]) -> Vec<ChampionId> {
    let mut order: Vec<ChampionId> = priority
        .iter()
        .copied()
        .filter(|id| pickable.contains(id))
        .collect();
    for id in pickable {
        if !order.contains(id) {
            order.push(*id);
        }
    }
    order
}

/// Position in the candidate list. Moves only after a hover went through,
/// so a failed request retries the same champion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PickQueue {
    index: usize,
}

impl PickQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Champion to hover next. Wraps around once every candidate was tried.
    pub fn current(&self, candidates: &[ChampionId]) -> Option<ChampionId> {
        if candidates.is_empty() {
            return None;
        }
        candidates.get(self.index % candidates.len()).copied()
    }

    pub fn advance(&mut self) {
        self.index = self.index.wrapping_add(1);
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl PhaseHandlers {
    /// Runs for as long as champ-select data is readable; the client stops
    /// serving it once the game loads.
    pub(crate) async fn champ_select(&mut self) -> HandlerOutcome {
        info!("Locking in champ");
        let deadline = Deadline::after(self.engine.limits().champ_select_timeout());
        let mut picks = PickQueue::new();

        loop {
            if deadline.expired() {
                return HandlerOutcome::Session(SessionError::ChampSelectTimeout {
                    waited: deadline.elapsed(),
                });
            }

            let data = match self.api.get_champ_select_data().await {
                Ok(data) => data,
                Err(e) => {
                    debug!(error = %e, "Champ select over");
                    return HandlerOutcome::Continue;
                }
            };
            let pickable = match self.api.get_available_champion_ids().await {
                Ok(ids) => ids,
                Err(e) => {
                    debug!(error = %e, "Champ select over");
                    return HandlerOutcome::Continue;
                }
            };

            let Some(action) = data.local_action() else {
                sleep(WAITING_PACE).await;
                continue;
            };

            if action.champion_id == 0 {
                let candidates = candidate_order(&self.champs, &pickable);
                let Some(champion) = picks.current(&candidates) else {
                    warn!("No pickable champion");
                    sleep(WAITING_PACE).await;
                    continue;
                };
                match self.api.hover_champion(action.id, champion).await {
                    Ok(()) => {
                        debug!(champion, "Hovered");
                        picks.advance();
                    }
                    Err(e) => debug!(champion, error = %e, "Hover failed"),
                }
            } else if !action.completed {
                if let Err(e) = self.api.lock_in_champion(action.id, action.champion_id).await {
                    debug!(champion = action.champion_id, error = %e, "Lock in failed");
                }
            } else {
                sleep(LOCKED_PACE).await;
            }
        }
    }
}
