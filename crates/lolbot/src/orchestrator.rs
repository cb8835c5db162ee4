//! Session orchestrator: one client, one account at a time, forever.
//!
//! ```text
//! setup ─▶ ┌─ acquire account ─▶ launch ─▶ leveling loop ─┐
//!          │                                              │
//!          ├── leveled: close client, reset counters ◀────┤
//!          └── SessionError: count, close client ◀────────┘
//!                 └─ ceiling reached ─▶ stop
//! ```
//!
//! The leveling loop is `poll_phase` followed by a handler dispatch until
//! the account reaches the target level. Three escalation tiers apply:
//! transient [`ApiError`](crate::client_api::ApiError)s stay inside
//! handlers, [`SessionError`]s restart the client, and everything in
//! [`OrchestratorError`] ends the run.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use coordination::{
    EscalationEngine, EventSink, HandlerOutcome, Phase, RestartDecision, RetryPolicy, Session,
    SessionError, SessionEvent, WorkerId,
};
use rand::rngs::StdRng;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::accounts::{AccountStore, AccountsError};
use crate::client_api::{ClientApi, LcuClient};
use crate::config::BotConfig;
use crate::game_config::overwrite_game_config;
use crate::handlers::game::GameDriver;
use crate::handlers::{AwaitGameEnd, PhaseHandlers};
use crate::launcher::{ClientLauncher, LaunchError, ProcessLauncher};
use crate::state_machine::{LifecycleState, StateMachine};
use crate::surface::{ActionSurface, XdotoolSurface};

/// Pause between phase reads, and after each successful one.
const PHASE_POLL_PACE: Duration = Duration::from_millis(1500);

/// Why an orchestrator stopped. Every variant ends the run.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Max errors reached after {attempts} session errors (last: {last})")]
    MaxErrorsReached { attempts: u32, last: SessionError },

    #[error("Launcher error: {0}")]
    Launch(#[from] LaunchError),

    #[error("Setup failed: {0:#}")]
    Setup(anyhow::Error),

    #[error("Account store: {0}")]
    Accounts(#[from] AccountsError),

    #[error("{0}")]
    Fatal(String),
}

/// The external collaborators an orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn ClientApi>,
    pub surface: Arc<dyn ActionSurface>,
    pub launcher: Arc<dyn ClientLauncher>,
    pub accounts: Arc<dyn AccountStore>,
    pub driver: Arc<dyn GameDriver>,
}

impl Collaborators {
    /// The real client, launcher and automation helper for the install in
    /// `config`, drawing accounts from `accounts`.
    pub fn from_config(config: &BotConfig, accounts: Arc<dyn AccountStore>) -> anyhow::Result<Self> {
        let api = LcuClient::new(&config.league_dir).context("Failed to build client API")?;
        Ok(Self {
            api: Arc::new(api),
            surface: Arc::new(XdotoolSurface::new(&config.xdotool_bin)),
            launcher: Arc::new(ProcessLauncher::from_config(config)),
            accounts,
            driver: Arc::new(AwaitGameEnd),
        })
    }
}

/// Leveling loop exits other than success.
enum Interruption {
    Session(SessionError),
    Fatal(String),
}

pub struct Orchestrator {
    worker: WorkerId,
    config: BotConfig,
    api: Arc<dyn ClientApi>,
    launcher: Arc<dyn ClientLauncher>,
    accounts: Arc<dyn AccountStore>,
    handlers: PhaseHandlers,
    engine: EscalationEngine,
    session: Session,
    machine: StateMachine,
    events: EventSink,
}

impl Orchestrator {
    pub fn new(
        worker: WorkerId,
        config: BotConfig,
        collaborators: Collaborators,
        events: EventSink,
    ) -> Self {
        let engine = EscalationEngine::with_limits(config.limits.clone());
        let handlers = PhaseHandlers::new(
            Arc::clone(&collaborators.api),
            collaborators.surface,
            collaborators.driver,
            engine.clone(),
            config.lobby,
            config.champs.clone(),
        );
        Self {
            worker,
            config,
            api: collaborators.api,
            launcher: collaborators.launcher,
            accounts: collaborators.accounts,
            handlers,
            engine,
            session: Session::new(),
            machine: StateMachine::new(),
            events,
        }
    }

    /// Seed the handlers' randomness.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.handlers = self.handlers.with_rng(rng);
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn lifecycle(&self) -> &StateMachine {
        &self.machine
    }

    /// Level accounts until something stops the run. Never returns `Ok`.
    pub async fn run(&mut self) -> Result<Infallible, OrchestratorError> {
        let err = match self.run_loop().await {
            Ok(never) => match never {},
            Err(err) => err,
        };
        let reason = err.to_string();
        if let Err(e) = self.machine.terminate(&reason) {
            debug!(error = %e, "Lifecycle already terminated");
        }
        self.events.publish(SessionEvent::Terminated {
            worker: self.worker,
            reason,
            timestamp: Utc::now(),
        });
        info!(lifecycle = %self.machine.summary(), "Orchestrator stopped");
        Err(err)
    }

    async fn run_loop(&mut self) -> Result<Infallible, OrchestratorError> {
        self.setup().await?;
        loop {
            self.publish_error_count();
            self.advance(LifecycleState::AcquiringAccount, None)?;
            let account = match self.accounts.next_account(self.config.max_level).await {
                Ok(account) => account,
                Err(e) => {
                    error!(error = %e, "No account to level. Exiting");
                    return Err(e.into());
                }
            };
            info!(username = %account.username, level = account.level, "Account acquired");
            self.session.begin_account(account.clone());

            self.advance(LifecycleState::Launching, Some(&account.username))?;
            if let Err(e) = self.launcher.launch(&account).await {
                error!(error = %e, "Launcher Error. Exiting");
                return Err(e.into());
            }
            self.api.reset_auth();

            self.advance(LifecycleState::Leveling, None)?;
            match self.leveling_loop().await {
                Ok(()) => {
                    self.launcher.close_all().await;
                    self.session.finish_account();
                    self.advance(LifecycleState::Completed, Some(&account.username))?;
                }
                Err(Interruption::Session(err)) => self.restart_after(err).await?,
                Err(Interruption::Fatal(reason)) => {
                    error!(%reason, "Unknown Error. Exiting");
                    return Err(OrchestratorError::Fatal(reason));
                }
            }
        }
    }

    async fn setup(&mut self) -> Result<(), OrchestratorError> {
        info!(
            max_level = self.config.max_level,
            lobby = self.config.lobby,
            "LoL Bot starting"
        );
        self.api.reset_auth();
        overwrite_game_config(&self.config.league_dir)
            .await
            .map_err(OrchestratorError::Setup)?;
        Ok(())
    }

    /// Count `err` against the restart budget and tear the client down.
    async fn restart_after(&mut self, err: SessionError) -> Result<(), OrchestratorError> {
        error!(code = err.code(), "{err}");
        match self.engine.record_session_error(&mut self.session) {
            RestartDecision::Exhausted { attempts } => {
                self.publish_error_count();
                error!(attempts, "Max errors reached. Exiting");
                Err(OrchestratorError::MaxErrorsReached {
                    attempts,
                    last: err,
                })
            }
            RestartDecision::Restart { attempt } => {
                warn!(attempt, max = self.engine.limits().max_session_errors, "Restarting client");
                self.events.publish(SessionEvent::Restarting {
                    worker: self.worker,
                    code: err.code().to_string(),
                    reason: err.to_string(),
                    attempt,
                    timestamp: Utc::now(),
                });
                self.advance(LifecycleState::Restarting, Some(err.code()))?;
                self.launcher.close_all().await;
                Ok(())
            }
        }
    }

    async fn leveling_loop(&mut self) -> Result<(), Interruption> {
        while !self.account_leveled().await? {
            let phase = self.poll_phase().await.map_err(Interruption::Session)?;
            let games_before = self.session.games_completed;

            match self.handlers.dispatch(&mut self.session, &phase).await {
                HandlerOutcome::Continue => {}
                HandlerOutcome::Retry => debug!(%phase, "Handler gave up this round"),
                HandlerOutcome::Session(err) => return Err(Interruption::Session(err)),
                HandlerOutcome::Fatal(reason) => return Err(Interruption::Fatal(reason)),
            }

            if self.session.games_completed > games_before {
                self.events.publish(SessionEvent::GameCompleted {
                    worker: self.worker,
                    games_completed: self.session.games_completed,
                    timestamp: Utc::now(),
                });
            }
        }
        Ok(())
    }

    /// Read the phase (with retries) and run the stuck-phase guard.
    async fn poll_phase(&mut self) -> Result<Phase, SessionError> {
        let policy = RetryPolicy::new(self.engine.limits().phase_poll_attempts, PHASE_POLL_PACE);
        let api = &self.api;
        let phase = policy
            .retry(|_| api.get_phase())
            .await
            .map_err(|e| SessionError::PhaseUnavailable {
                attempts: e.attempts,
                cause: e.last.map(|err| err.to_string()).unwrap_or_default(),
            })?;

        self.engine.observe_phase(&mut self.session, phase.clone())?;
        if !phase.is_known() {
            warn!(%phase, "Unrecognized phase");
        } else if self.session.phase_repeated() {
            debug!(%phase, repeats = self.session.counters.stuck_phase, "Phase unchanged");
        } else {
            info!(%phase, "Phase changed");
        }
        sleep(PHASE_POLL_PACE).await;
        Ok(phase)
    }

    /// Whether the account reached the target level. Persists the new level
    /// once, and only when the client is logged into that account.
    async fn account_leveled(&mut self) -> Result<bool, Interruption> {
        let target = self.config.max_level;
        let level = match self.api.get_summoner_level().await {
            Ok(level) => level,
            Err(e) => {
                debug!(error = %e, "Summoner level unavailable");
                return Ok(false);
            }
        };
        if level < target {
            return Ok(false);
        }
        let display_name = match self.api.get_display_name().await {
            Ok(name) => name,
            Err(e) => {
                debug!(error = %e, "Display name unavailable");
                return Ok(false);
            }
        };

        if let Some(account) = self.session.account.as_mut() {
            if account.username == display_name {
                account.level = target;
                self.accounts
                    .save_or_update(account)
                    .await
                    .map_err(|e| Interruption::Fatal(format!("Could not save leveled account: {e}")))?;
                self.events.publish(SessionEvent::AccountLeveled {
                    worker: self.worker,
                    username: account.username.clone(),
                    level: target,
                    timestamp: Utc::now(),
                });
            } else {
                warn!(%display_name, "Logged-in name differs from account, level not saved");
            }
        }
        info!(level, "Account successfully leveled");
        Ok(true)
    }

    fn advance(&mut self, to: LifecycleState, reason: Option<&str>) -> Result<(), OrchestratorError> {
        self.machine
            .advance(to, reason)
            .map_err(|e| OrchestratorError::Fatal(e.to_string()))
    }

    fn publish_error_count(&self) {
        self.events.publish(SessionEvent::ErrorCount {
            worker: self.worker,
            session_restarts: self.session.counters.session_restarts,
            timestamp: Utc::now(),
        });
    }
}
