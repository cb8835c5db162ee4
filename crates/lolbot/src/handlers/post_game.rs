//! Everything between the end of a game and the next queue.

use std::time::Duration;

use coordination::{HandlerOutcome, Phase, Session, SessionError};
use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::PhaseHandlers;
use crate::surface::{ActionError, CLIENT_WINDOW};

// Click positions as ratios of the client window.
const POST_GAME_OK_RATIO: (f64, f64) = (0.4996, 0.9397);
const POST_GAME_SELECT_CHAMP_RATIO: (f64, f64) = (0.4977, 0.5333);
const POPUP_SEND_EMAIL_X_RATIO: (f64, f64) = (0.6960, 0.1238);

const STATS_POLL: Duration = Duration::from_secs(2);
const POST_GAME_SETTLE: Duration = Duration::from_secs(3);
const HONOR_SCREEN_WAIT: Duration = Duration::from_secs(60);
const HONOR_SETTLE: Duration = Duration::from_secs(2);
const PLAY_AGAIN_PACE: Duration = Duration::from_secs(1);
const REWARD_CLICKS: usize = 3;

/// Index of the teammate to honor among `candidates`, or `None` when there
/// is nobody to honor.
pub fn pick_honor_index<R: Rng + ?Sized>(candidates: usize, rng: &mut R) -> Option<usize> {
    if candidates == 0 {
        return None;
    }
    Some(rng.random_range(0..candidates))
}

impl PhaseHandlers {
    pub(crate) async fn wait_for_stats(&mut self) -> HandlerOutcome {
        info!("Waiting for stats");
        let polls = self.engine.limits().stats_polls;
        for _ in 0..polls {
            sleep(STATS_POLL).await;
            match self.api.get_phase().await {
                Ok(Phase::WaitingForStats) => {}
                Ok(_) => return HandlerOutcome::Continue,
                Err(e) => debug!(error = %e, "Phase poll failed waiting for stats"),
            }
        }
        HandlerOutcome::Session(SessionError::StatsTimeout { polls })
    }

    /// Honor a teammate and click through level-up and reward popups.
    pub(crate) async fn pre_end_of_game(&mut self) -> HandlerOutcome {
        info!("Honoring teammates and accepting rewards");
        sleep(POST_GAME_SETTLE).await;
        if let Err(e) = self.clear_post_game().await {
            warn!(error = %e, "Post-game screen not ready");
            sleep(POST_GAME_SETTLE).await;
        }
        HandlerOutcome::Continue
    }

    async fn clear_post_game(&mut self) -> Result<(), ActionError> {
        if !self.surface.window_exists(CLIENT_WINDOW).await {
            return Err(ActionError::WindowNotFound(CLIENT_WINDOW.to_string()));
        }
        self.surface.focus_window(CLIENT_WINDOW).await?;

        self.click(POPUP_SEND_EMAIL_X_RATIO, Duration::from_secs(2)).await?;
        if !self.honor_player().await {
            // Let the honor screen time out by itself.
            sleep(HONOR_SCREEN_WAIT).await;
        }
        self.click(POPUP_SEND_EMAIL_X_RATIO, Duration::from_secs(2)).await?;
        for _ in 0..REWARD_CLICKS {
            self.click(POST_GAME_SELECT_CHAMP_RATIO, Duration::from_secs(1)).await?;
            self.click(POST_GAME_OK_RATIO, Duration::from_secs(1)).await?;
        }
        self.click(POPUP_SEND_EMAIL_X_RATIO, Duration::from_secs(1)).await
    }

    async fn click(&self, ratio: (f64, f64), pause: Duration) -> Result<(), ActionError> {
        self.surface
            .click_at_relative(ratio, CLIENT_WINDOW, pause)
            .await
    }

    /// Honor one random teammate. `false` when nobody could be honored.
    pub(crate) async fn honor_player(&mut self) -> bool {
        let attempts = self.engine.limits().honor_attempts;
        for attempt in 1..=attempts {
            let players = match self.api.get_players_to_honor().await {
                Ok(players) => players,
                Err(e) => {
                    warn!(attempt, error = %e, "Honor ballot unavailable");
                    continue;
                }
            };
            let Some(index) = pick_honor_index(players.len(), &mut self.rng) else {
                warn!("No players to honor");
                return false;
            };
            match self.api.honor_player(players[index].summoner_id).await {
                Ok(()) => {
                    sleep(HONOR_SETTLE).await;
                    return true;
                }
                Err(e) => warn!(attempt, error = %e, "Honor failed"),
            }
        }
        warn!("Honor failure");
        false
    }

    /// Leave the post-game lobby, alternating play-again with a fresh queue
    /// start. Reaching any other phase means the game is done.
    pub(crate) async fn end_of_game(&mut self, session: &mut Session) -> HandlerOutcome {
        info!("Getting back into queue");
        let attempts = self.engine.limits().post_game_attempts;
        let mut play_again_next = true;
        for attempt in 1..=attempts {
            match self.api.get_phase().await {
                Ok(Phase::EndOfGame) => {}
                Ok(_) => {
                    let games = session.record_game_completed();
                    info!(games, "Game complete");
                    return HandlerOutcome::Continue;
                }
                Err(e) => {
                    debug!(attempt, error = %e, "Phase poll failed after game");
                    continue;
                }
            }

            if play_again_next {
                if let Err(e) = self.api.play_again().await {
                    debug!(attempt, error = %e, "Play again failed");
                    continue;
                }
            } else if self.start_matchmaking().await == HandlerOutcome::Retry {
                debug!(attempt, "Requeue from post-game failed");
            }
            play_again_next = !play_again_next;
            sleep(PLAY_AGAIN_PACE).await;
        }
        HandlerOutcome::Session(SessionError::PostGameStuck { attempts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_honor_index_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for k in 1..=10 {
            for _ in 0..50 {
                let index = pick_honor_index(k, &mut rng).unwrap();
                assert!(index < k);
            }
        }
    }

    #[test]
    fn test_no_candidates_means_no_index() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(pick_honor_index(0, &mut rng), None);
    }

    #[test]
    fn test_single_candidate_is_always_chosen() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(pick_honor_index(1, &mut rng), Some(0));
    }
}
