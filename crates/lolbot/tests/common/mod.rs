//! Recording collaborators for orchestrator and handler tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use coordination::{Account, Phase};
use lolbot::accounts::{AccountStore, AccountsError};
use lolbot::client_api::{
    ApiError, ChampSelectAction, ChampSelectSession, ChampionId, ClientApi, HonorCandidate,
};
use lolbot::config::BotConfig;
use lolbot::handlers::AwaitGameEnd;
use lolbot::launcher::{ClientLauncher, LaunchError};
use lolbot::surface::{ActionError, ActionSurface};
use lolbot::Collaborators;

pub fn unavailable(endpoint: &str) -> ApiError {
    ApiError::Status {
        endpoint: endpoint.to_string(),
        status: 503,
    }
}

#[derive(Debug, Default)]
struct ChampSelectState {
    hovered: ChampionId,
    completed: bool,
    reads_after_lock: u32,
}

/// Client API that answers phase polls from a script.
///
/// Once the script runs out, phase polls return `fallback` (or fail when
/// there is none) and the summoner is reported at `final_level`.
pub struct ScriptedApi {
    phases: Mutex<VecDeque<Phase>>,
    fallback: Mutex<Option<Phase>>,
    pub final_level: u32,
    pub display_name: String,
    pub pickable: Vec<ChampionId>,
    pub honor_candidates: Vec<HonorCandidate>,
    hover_failures: AtomicU32,
    phase_failures: AtomicU32,
    dodge_timer: Duration,
    fail_lobby: bool,
    champ: Mutex<ChampSelectState>,
    calls: Mutex<Vec<&'static str>>,
    hovers: Mutex<Vec<ChampionId>>,
    locks: Mutex<Vec<ChampionId>>,
    honored: Mutex<Vec<u64>>,
    fail_all: bool,
}

impl ScriptedApi {
    pub fn new(phases: impl IntoIterator<Item = Phase>) -> Self {
        Self {
            phases: Mutex::new(phases.into_iter().collect()),
            fallback: Mutex::new(None),
            final_level: 30,
            display_name: "alice".into(),
            pickable: vec![18, 99],
            honor_candidates: vec![
                HonorCandidate { summoner_id: 11 },
                HonorCandidate { summoner_id: 12 },
            ],
            hover_failures: AtomicU32::new(0),
            phase_failures: AtomicU32::new(0),
            dodge_timer: Duration::ZERO,
            fail_lobby: false,
            champ: Mutex::new(ChampSelectState::default()),
            calls: Mutex::new(Vec::new()),
            hovers: Mutex::new(Vec::new()),
            locks: Mutex::new(Vec::new()),
            honored: Mutex::new(Vec::new()),
            fail_all: false,
        }
    }

    /// Every call fails, as if the client were gone.
    pub fn unreachable() -> Self {
        Self {
            fail_all: true,
            ..Self::new([])
        }
    }

    pub fn with_fallback(self, phase: Phase) -> Self {
        *self.fallback.lock().unwrap() = Some(phase);
        self
    }

    pub fn with_hover_failures(self, failures: u32) -> Self {
        self.hover_failures.store(failures, Ordering::SeqCst);
        self
    }

    /// The next `failures` phase polls fail before the script resumes.
    pub fn with_phase_failures(self, failures: u32) -> Self {
        self.phase_failures.store(failures, Ordering::SeqCst);
        self
    }

    pub fn with_dodge_timer(mut self, remaining: Duration) -> Self {
        self.dodge_timer = remaining;
        self
    }

    /// Lobby creation is refused.
    pub fn with_failing_lobby(mut self) -> Self {
        self.fail_lobby = true;
        self
    }

    pub fn with_display_name(mut self, name: &str) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn without_honor_candidates(mut self) -> Self {
        self.honor_candidates.clear();
        self
    }

    pub fn remaining(&self) -> usize {
        self.phases.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }

    pub fn hovers(&self) -> Vec<ChampionId> {
        self.hovers.lock().unwrap().clone()
    }

    pub fn locks(&self) -> Vec<ChampionId> {
        self.locks.lock().unwrap().clone()
    }

    pub fn honored(&self) -> Vec<u64> {
        self.honored.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.fail_all {
            Err(unavailable(call))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClientApi for ScriptedApi {
    fn reset_auth(&self) {
        self.calls.lock().unwrap().push("reset_auth");
    }

    async fn get_phase(&self) -> Result<Phase, ApiError> {
        self.record("get_phase")?;
        let failures = self.phase_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.phase_failures.store(failures - 1, Ordering::SeqCst);
            return Err(unavailable("get_phase"));
        }
        if let Some(phase) = self.phases.lock().unwrap().pop_front() {
            return Ok(phase);
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| unavailable("get_phase"))
    }

    async fn get_dodge_timer(&self) -> Result<Duration, ApiError> {
        self.record("get_dodge_timer")?;
        Ok(self.dodge_timer)
    }

    async fn create_lobby(&self, _queue_id: u32) -> Result<(), ApiError> {
        self.record("create_lobby")?;
        if self.fail_lobby {
            return Err(unavailable("create_lobby"));
        }
        Ok(())
    }

    async fn start_matchmaking(&self) -> Result<(), ApiError> {
        self.record("start_matchmaking")
    }

    async fn accept_match(&self) -> Result<(), ApiError> {
        self.record("accept_match")
    }

    async fn get_champ_select_data(&self) -> Result<ChampSelectSession, ApiError> {
        self.record("get_champ_select_data")?;
        let mut state = self.champ.lock().unwrap();
        if state.completed {
            // One read showing the locked pick, then champ select is over.
            if state.reads_after_lock >= 1 {
                return Err(unavailable("get_champ_select_data"));
            }
            state.reads_after_lock += 1;
        }
        Ok(ChampSelectSession {
            actions: vec![vec![ChampSelectAction {
                id: 7,
                actor_cell_id: 0,
                champion_id: state.hovered,
                completed: state.completed,
                action_type: "pick".into(),
            }]],
            local_player_cell_id: 0,
        })
    }

    async fn get_available_champion_ids(&self) -> Result<Vec<ChampionId>, ApiError> {
        self.record("get_available_champion_ids")?;
        Ok(self.pickable.clone())
    }

    async fn hover_champion(&self, _action_id: i64, champion: ChampionId) -> Result<(), ApiError> {
        self.record("hover_champion")?;
        self.hovers.lock().unwrap().push(champion);
        let failures = self.hover_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.hover_failures.store(failures - 1, Ordering::SeqCst);
            return Err(unavailable("hover_champion"));
        }
        self.champ.lock().unwrap().hovered = champion;
        Ok(())
    }

    async fn lock_in_champion(&self, _action_id: i64, champion: ChampionId) -> Result<(), ApiError> {
        self.record("lock_in_champion")?;
        self.locks.lock().unwrap().push(champion);
        self.champ.lock().unwrap().completed = true;
        Ok(())
    }

    async fn game_reconnect(&self) -> Result<(), ApiError> {
        self.record("game_reconnect")
    }

    async fn get_summoner_level(&self) -> Result<u32, ApiError> {
        self.record("get_summoner_level")?;
        if self.remaining() == 0 {
            Ok(self.final_level)
        } else {
            Ok(1)
        }
    }

    async fn get_display_name(&self) -> Result<String, ApiError> {
        self.record("get_display_name")?;
        Ok(self.display_name.clone())
    }

    async fn get_players_to_honor(&self) -> Result<Vec<HonorCandidate>, ApiError> {
        self.record("get_players_to_honor")?;
        Ok(self.honor_candidates.clone())
    }

    async fn honor_player(&self, summoner_id: u64) -> Result<(), ApiError> {
        self.record("honor_player")?;
        self.honored.lock().unwrap().push(summoner_id);
        Ok(())
    }

    async fn play_again(&self) -> Result<(), ApiError> {
        self.record("play_again")
    }
}

/// Surface where the client window always exists and every click lands.
#[derive(Default)]
pub struct RecordingSurface {
    clicks: Mutex<Vec<(f64, f64)>>,
    pub missing_window: bool,
}

impl RecordingSurface {
    pub fn without_window() -> Self {
        Self {
            missing_window: true,
            ..Self::default()
        }
    }

    pub fn clicks(&self) -> usize {
        self.clicks.lock().unwrap().len()
    }
}

#[async_trait]
impl ActionSurface for RecordingSurface {
    async fn window_exists(&self, _title: &str) -> bool {
        !self.missing_window
    }

    async fn focus_window(&self, title: &str) -> Result<(), ActionError> {
        if self.missing_window {
            return Err(ActionError::WindowNotFound(title.to_string()));
        }
        Ok(())
    }

    async fn click_at_relative(
        &self,
        ratio: (f64, f64),
        _title: &str,
        _pause: Duration,
    ) -> Result<(), ActionError> {
        self.clicks.lock().unwrap().push(ratio);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<String>>,
    closes: AtomicU32,
    pub fail: bool,
}

impl RecordingLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> Vec<String> {
        self.launches.lock().unwrap().clone()
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientLauncher for RecordingLauncher {
    async fn launch(&self, account: &Account) -> Result<(), LaunchError> {
        self.launches.lock().unwrap().push(account.username.clone());
        if self.fail {
            return Err(LaunchError::NotReady {
                what: "Game client",
                waited: Duration::from_secs(180),
            });
        }
        Ok(())
    }

    async fn close_all(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory account store.
pub struct MemoryStore {
    accounts: Mutex<Vec<Account>>,
    saves: Mutex<Vec<Account>>,
}

impl MemoryStore {
    pub fn new(accounts: impl IntoIterator<Item = Account>) -> Self {
        Self {
            accounts: Mutex::new(accounts.into_iter().collect()),
            saves: Mutex::new(Vec::new()),
        }
    }

    pub fn saves(&self) -> Vec<Account> {
        self.saves.lock().unwrap().clone()
    }
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn next_account(&self, max_level: u32) -> Result<Account, AccountsError> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.is_eligible(max_level))
            .cloned()
            .ok_or(AccountsError::NoEligibleAccount { max_level })
    }

    async fn save_or_update(&self, account: &Account) -> Result<(), AccountsError> {
        self.saves.lock().unwrap().push(account.clone());
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.username == account.username) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        Ok(())
    }
}

/// Config pointing the game directory at `league_dir`.
pub fn test_config(league_dir: &std::path::Path) -> BotConfig {
    BotConfig {
        league_dir: league_dir.to_path_buf(),
        champs: vec![21, 18],
        ..BotConfig::default()
    }
}

pub struct Harness {
    pub api: Arc<ScriptedApi>,
    pub surface: Arc<RecordingSurface>,
    pub launcher: Arc<RecordingLauncher>,
    pub store: Arc<MemoryStore>,
}

impl Harness {
    pub fn new(api: ScriptedApi) -> Self {
        Self {
            api: Arc::new(api),
            surface: Arc::new(RecordingSurface::default()),
            launcher: Arc::new(RecordingLauncher::default()),
            store: Arc::new(MemoryStore::new([Account::new("alice", "pw", 1)])),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            api: self.api.clone(),
            surface: self.surface.clone(),
            launcher: self.launcher.clone(),
            accounts: self.store.clone(),
            driver: Arc::new(AwaitGameEnd),
        }
    }
}
