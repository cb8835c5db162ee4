//! [`ClientApi`] over the game client's local HTTPS API.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use coordination::Phase;
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::lockfile::{local_http_client, Lockfile, AUTH_USER};
use super::{ApiError, ChampSelectSession, ChampionId, ClientApi, HonorCandidate};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const HONOR_CATEGORY: &str = "HEART";

pub struct LcuClient {
    http: reqwest::Client,
    lockfile: PathBuf,
    credentials: Mutex<Option<Lockfile>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentSummoner {
    #[serde(default)]
    summoner_level: u32,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    game_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HonorBallot {
    #[serde(default, alias = "eligiblePlayers")]
    eligible_allies: Vec<HonorCandidate>,
}

impl LcuClient {
    /// Client for the game installed at `league_dir`.
    pub fn new(league_dir: &Path) -> Result<Self, ApiError> {
        Ok(Self {
            http: local_http_client(REQUEST_TIMEOUT)?,
            lockfile: league_dir.join("lockfile"),
            credentials: Mutex::new(None),
        })
    }

    async fn credentials(&self) -> Result<Lockfile, ApiError> {
        if let Some(cached) = self.cached() {
            return Ok(cached);
        }
        let fresh = Lockfile::read(&self.lockfile).await?;
        debug!(port = fresh.port, pid = fresh.pid, "Read client lockfile");
        *self.credentials.lock().unwrap_or_else(|p| p.into_inner()) = Some(fresh.clone());
        Ok(fresh)
    }

    fn cached(&self) -> Option<Lockfile> {
        self.credentials
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Response, ApiError> {
        let creds = self.credentials().await?;
        let url = format!("{}{}", creds.base_url(), endpoint);
        let mut request = self
            .http
            .request(method, &url)
            .basic_auth(AUTH_USER, Some(&creds.password));
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                // A restarted client writes a new port and password.
                self.reset_auth();
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        let response = self.send(Method::GET, endpoint, None).await?;
        response.json().await.map_err(|e| ApiError::Malformed {
            endpoint: endpoint.to_string(),
            detail: e.to_string(),
        })
    }

    async fn post(&self, endpoint: &str, body: Option<Value>) -> Result<(), ApiError> {
        self.send(Method::POST, endpoint, body).await.map(drop)
    }

    async fn current_summoner(&self) -> Result<CurrentSummoner, ApiError> {
        self.get_json("/lol-summoner/v1/current-summoner").await
    }
}

/// `errors[0].penaltyTimeRemaining` from the matchmaking search state.
fn penalty_remaining(search: &Value) -> Duration {
    let secs = search
        .get("errors")
        .and_then(|errors| errors.get(0))
        .and_then(|error| error.get("penaltyTimeRemaining"))
        .and_then(Value::as_f64)
        .unwrap_or(0.0);
    if secs.is_finite() && secs > 0.0 {
        Duration::from_secs_f64(secs)
    } else {
        Duration::ZERO
    }
}

#[async_trait]
impl ClientApi for LcuClient {
    fn reset_auth(&self) {
        *self.credentials.lock().unwrap_or_else(|p| p.into_inner()) = None;
    }

    async fn get_phase(&self) -> Result<Phase, ApiError> {
        let endpoint = "/lol-gameflow/v1/gameflow-phase";
        let response = self.send(Method::GET, endpoint, None).await?;
        let raw = response.text().await?;
        Ok(Phase::parse(&raw))
    }

    async fn get_dodge_timer(&self) -> Result<Duration, ApiError> {
        let search: Value = self.get_json("/lol-matchmaking/v1/search").await?;
        Ok(penalty_remaining(&search))
    }

    async fn create_lobby(&self, queue_id: u32) -> Result<(), ApiError> {
        self.post("/lol-lobby/v2/lobby", Some(json!({ "queueId": queue_id })))
            .await
    }

    async fn start_matchmaking(&self) -> Result<(), ApiError> {
        self.post("/lol-lobby/v2/lobby/matchmaking/search", None)
            .await
    }

    async fn accept_match(&self) -> Result<(), ApiError> {
        self.post("/lol-matchmaking/v1/ready-check/accept", None)
            .await
    }

    async fn get_champ_select_data(&self) -> Result<ChampSelectSession, ApiError> {
        self.get_json("/lol-champ-select/v1/session").await
    }

    async fn get_available_champion_ids(&self) -> Result<Vec<ChampionId>, ApiError> {
        self.get_json("/lol-champ-select/v1/pickable-champion-ids")
            .await
    }

    async fn hover_champion(&self, action_id: i64, champion: ChampionId) -> Result<(), ApiError> {
        let endpoint = format!("/lol-champ-select/v1/session/actions/{action_id}");
        self.send(
            Method::PATCH,
            &endpoint,
            Some(json!({ "championId": champion })),
        )
        .await
        .map(drop)
    }

    async fn lock_in_champion(&self, action_id: i64, champion: ChampionId) -> Result<(), ApiError> {
        let endpoint = format!("/lol-champ-select/v1/session/actions/{action_id}");
        self.send(
            Method::PATCH,
            &endpoint,
            Some(json!({ "championId": champion, "completed": true })),
        )
        .await
        .map(drop)
    }

    async fn game_reconnect(&self) -> Result<(), ApiError> {
        self.post("/lol-gameflow/v1/reconnect", None).await
    }

    async fn get_summoner_level(&self) -> Result<u32, ApiError> {
        Ok(self.current_summoner().await?.summoner_level)
    }

    async fn get_display_name(&self) -> Result<String, ApiError> {
        let summoner = self.current_summoner().await?;
        if summoner.display_name.is_empty() {
            Ok(summoner.game_name)
        } else {
            Ok(summoner.display_name)
        }
    }

    async fn get_players_to_honor(&self) -> Result<Vec<HonorCandidate>, ApiError> {
        let ballot: HonorBallot = self.get_json("/lol-honor-v2/v1/ballot").await?;
        Ok(ballot.eligible_allies)
    }

    async fn honor_player(&self, summoner_id: u64) -> Result<(), ApiError> {
        self.post(
            "/lol-honor-v2/v1/honor-player",
            Some(json!({ "summonerId": summoner_id, "honorCategory": HONOR_CATEGORY })),
        )
        .await
    }

    async fn play_again(&self) -> Result<(), ApiError> {
        self.post("/lol-lobby/v2/play-again", None).await
    }
}
