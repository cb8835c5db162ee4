//! Local client API: the queries and commands the bot issues.
//!
//! [`ClientApi`] is the seam between the orchestrator and the running client.
//! Every failure, whether the client is not up yet, the connection dropped, or
//! a response did not decode, surfaces as an [`ApiError`]. Handlers treat it as
//! transient and decide locally whether to retry, ignore, or give up.

pub mod lcu;
pub mod lockfile;

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use coordination::Phase;
use serde::Deserialize;
use thiserror::Error;

pub use lcu::LcuClient;
pub use lockfile::Lockfile;

/// Champion identifier as used by the client. `0` means no champion.
pub type ChampionId = u32;

/// Transient failure talking to the client.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("client lockfile unavailable at {path}: {reason}")]
    Lockfile { path: PathBuf, reason: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("unexpected response from {endpoint}: {detail}")]
    Malformed { endpoint: String, detail: String },
}

/// One pick/ban action in the champ-select session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectAction {
    pub id: i64,
    pub actor_cell_id: i64,
    #[serde(default)]
    pub champion_id: ChampionId,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "type", default)]
    pub action_type: String,
}

/// Snapshot of the champ-select session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChampSelectSession {
    #[serde(default)]
    pub actions: Vec<Vec<ChampSelectAction>>,
    pub local_player_cell_id: i64,
}

impl ChampSelectSession {
    /// The local player's action in the first action group, if it is their turn.
    pub fn local_action(&self) -> Option<&ChampSelectAction> {
        self.actions
            .first()?
            .iter()
            .find(|action| action.actor_cell_id == self.local_player_cell_id)
    }
}

/// A teammate that can receive an honor after the game.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HonorCandidate {
    pub summoner_id: u64,
}

/// Everything the orchestrator needs from the running client.
#[async_trait]
pub trait ClientApi: Send + Sync {
    /// Drop any cached credentials so the next call picks up a freshly
    /// launched client.
    fn reset_auth(&self);

    async fn get_phase(&self) -> Result<Phase, ApiError>;

    /// Remaining matchmaking penalty. Zero when there is none.
    async fn get_dodge_timer(&self) -> Result<Duration, ApiError>;

    async fn create_lobby(&self, queue_id: u32) -> Result<(), ApiError>;

    async fn start_matchmaking(&self) -> Result<(), ApiError>;

    async fn accept_match(&self) -> Result<(), ApiError>;

    async fn get_champ_select_data(&self) -> Result<ChampSelectSession, ApiError>;

    async fn get_available_champion_ids(&self) -> Result<Vec<ChampionId>, ApiError>;

    async fn hover_champion(&self, action_id: i64, champion: ChampionId) -> Result<(), ApiError>;

    async fn lock_in_champion(&self, action_id: i64, champion: ChampionId) -> Result<(), ApiError>;

    async fn game_reconnect(&self) -> Result<(), ApiError>;

    async fn get_summoner_level(&self) -> Result<u32, ApiError>;

    async fn get_display_name(&self) -> Result<String, ApiError>;

    async fn get_players_to_honor(&self) -> Result<Vec<HonorCandidate>, ApiError>;

    async fn honor_player(&self, summoner_id: u64) -> Result<(), ApiError>;

    async fn play_again(&self) -> Result<(), ApiError>;
}
