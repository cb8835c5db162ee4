//! Starting and stopping the client processes.
//!
//! ```text
//! launch(account)
//!   remove old lockfiles
//!   spawn Riot client ─▶ wait for Riot lockfile ─▶ PUT credentials (3 tries)
//!                                                        │
//!         Ok(()) ◀─ wait for game lockfile ◀─────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use coordination::{Account, Deadline, RetryPolicy};
use serde_json::json;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::client_api::lockfile::{local_http_client, Lockfile, AUTH_USER};
use crate::config::BotConfig;

const RIOT_READY_TIMEOUT: Duration = Duration::from_secs(120);
const CLIENT_READY_TIMEOUT: Duration = Duration::from_secs(180);
const LOCKFILE_POLL: Duration = Duration::from_secs(2);
const LOGIN_ATTEMPTS: u32 = 3;
const LOGIN_RETRY_DELAY: Duration = Duration::from_secs(5);
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Every process name belonging to the client, in kill order.
const CLIENT_PROCESSES: [&str; 5] = [
    "League of Legends",
    "LeagueClientUx",
    "LeagueClient",
    "RiotClientUx",
    "RiotClientServices",
];

/// The client could not be brought up. Fatal for the orchestrator.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("could not start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{what} not ready after {}s", .waited.as_secs())]
    NotReady { what: &'static str, waited: Duration },

    #[error("login failed after {attempts} attempts: {reason}")]
    Login { attempts: u32, reason: String },
}

#[async_trait]
pub trait ClientLauncher: Send + Sync {
    /// Start the client and log `account` in. Returns once the game client's
    /// API is reachable.
    async fn launch(&self, account: &Account) -> Result<(), LaunchError>;

    /// Kill every client process. Failures are ignored.
    async fn close_all(&self);
}

/// [`ClientLauncher`] that drives the real client binaries.
pub struct ProcessLauncher {
    riot_client_bin: PathBuf,
    riot_lockfile: PathBuf,
    league_lockfile: PathBuf,
}

impl ProcessLauncher {
    pub fn from_config(config: &BotConfig) -> Self {
        let exe = if cfg!(windows) {
            "RiotClientServices.exe"
        } else {
            "RiotClientServices"
        };
        let riot_lockfile = config.riot_lockfile.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .map(|dir| dir.join("Riot Games").join("Riot Client"))
                .unwrap_or_else(|| config.riot_client_dir.clone())
                .join("Config")
                .join("lockfile")
        });
        Self {
            riot_client_bin: config.riot_client_dir.join(exe),
            riot_lockfile,
            league_lockfile: config.league_dir.join("lockfile"),
        }
    }

    /// Remove lockfiles a killed or crashed client left behind. Their port
    /// and password are dead, so only a freshly written file may be trusted.
    async fn clear_lockfiles(&self) {
        for path in [&self.riot_lockfile, &self.league_lockfile] {
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed old lockfile"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Could not remove old lockfile"),
            }
        }
    }

    async fn wait_for_lockfile(
        path: &Path,
        what: &'static str,
        limit: Duration,
    ) -> Result<Lockfile, LaunchError> {
        let deadline = Deadline::after(limit);
        loop {
            if let Ok(lock) = Lockfile::read(path).await {
                debug!(what, port = lock.port, "Lockfile found");
                return Ok(lock);
            }
            if deadline.expired() {
                return Err(LaunchError::NotReady {
                    what,
                    waited: deadline.elapsed(),
                });
            }
            sleep(LOCKFILE_POLL).await;
        }
    }

    async fn login(riot: &Lockfile, account: &Account) -> Result<(), LaunchError> {
        let http = local_http_client(Duration::from_secs(10)).map_err(|e| LaunchError::Login {
            attempts: 0,
            reason: e.to_string(),
        })?;
        let url = format!("{}/rso-auth/v1/session/credentials", riot.base_url());
        let body = json!({
            "username": account.username,
            "password": account.password,
            "persistLogin": false,
        });
        let (http, url, body) = (&http, &url, &body);

        RetryPolicy::new(LOGIN_ATTEMPTS, LOGIN_RETRY_DELAY)
            .retry(|_| async move {
                let response = http
                    .put(url)
                    .basic_auth(AUTH_USER, Some(&riot.password))
                    .json(body)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;
                if response.status().is_success() {
                    Ok(())
                } else {
                    Err(format!("HTTP {}", response.status()))
                }
            })
            .await
            .map_err(|e| LaunchError::Login {
                attempts: e.attempts,
                reason: e.last.unwrap_or_default(),
            })
    }
}

#[async_trait]
impl ClientLauncher for ProcessLauncher {
    async fn launch(&self, account: &Account) -> Result<(), LaunchError> {
        info!(username = %account.username, "Launching client");
        self.clear_lockfiles().await;
        Command::new(&self.riot_client_bin)
            .args([
                "--launch-product=league_of_legends",
                "--launch-patchline=live",
            ])
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                path: self.riot_client_bin.clone(),
                source,
            })?;

        let riot =
            Self::wait_for_lockfile(&self.riot_lockfile, "Riot client", RIOT_READY_TIMEOUT).await?;
        Self::login(&riot, account).await?;
        info!("Logged in, waiting for game client");
        Self::wait_for_lockfile(&self.league_lockfile, "Game client", CLIENT_READY_TIMEOUT).await?;
        info!("Client ready");
        Ok(())
    }

    async fn close_all(&self) {
        info!("Closing client processes");
        for name in CLIENT_PROCESSES {
            let result = if cfg!(windows) {
                let image = format!("{name}.exe");
                Command::new("taskkill")
                    .args(["/F", "/IM", image.as_str()])
                    .output()
                    .await
            } else {
                Command::new("pkill").args(["-f", name]).output().await
            };
            match result {
                Ok(output) => debug!(process = name, status = %output.status, "Kill issued"),
                Err(e) => warn!(process = name, error = %e, "Could not run kill command"),
            }
        }
        sleep(SHUTDOWN_GRACE).await;
        self.clear_lockfiles().await;
    }
}
