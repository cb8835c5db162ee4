use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use coordination::EscalationLimits;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Queue ids the client accepts when creating a lobby.
pub const LOBBIES: [(&str, u32); 12] = [
    ("Draft Pick", 400),
    ("Ranked Solo/Duo", 420),
    ("Blind Pick", 430),
    ("Ranked Flex", 440),
    ("ARAM", 450),
    ("Intro Bots", 870),
    ("Beginner Bots", 880),
    ("Intermediate Bots", 890),
    ("Normal TFT", 1090),
    ("Ranked TFT", 1100),
    ("Hyper Roll TFT", 1130),
    ("Double Up TFT", 1160),
];

/// Display name of a queue id.
pub fn lobby_name(queue_id: u32) -> Option<&'static str> {
    LOBBIES
        .iter()
        .find(|(_, id)| *id == queue_id)
        .map(|(name, _)| *name)
}

/// Top-level bot configuration, read from `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Game install directory (holds the client lockfile and `Config/`).
    pub league_dir: PathBuf,
    /// Riot client install directory.
    pub riot_client_dir: PathBuf,
    /// Riot client lockfile (None = the per-user Riot Client config dir).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub riot_lockfile: Option<PathBuf>,
    /// Queue id of the lobby to create.
    pub lobby: u32,
    /// Level at which an account is done.
    pub max_level: u32,
    /// Champions to try first in champ select, in order.
    pub champs: Vec<u32>,
    /// In-game chat lines. Nothing reads them; the field is kept so existing
    /// config files still load unchanged.
    pub dialog: Vec<String>,
    /// Account file (None = `accounts.json` next to the config file).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accounts_path: Option<PathBuf>,
    /// Automation helper used for clicks.
    pub xdotool_bin: PathBuf,
    pub limits: EscalationLimits,
    /// One entry per parallel worker. Empty means a single worker on the
    /// top-level install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub workers: Vec<WorkerInstall>,
}

/// A separate client install driven by one worker (`[[workers]]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerInstall {
    pub league_dir: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub riot_client_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub riot_lockfile: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            league_dir: PathBuf::from("C:/Riot Games/League of Legends"),
            riot_client_dir: PathBuf::from("C:/Riot Games/Riot Client"),
            riot_lockfile: None,
            lobby: 880,
            max_level: 30,
            champs: vec![21, 18, 22, 67],
            dialog: [
                "mid ples",
                "plannin on goin mid team",
                "mid por favor",
                "bienvenidos, mid",
                "howdy, mid",
                "goin mid",
                "mid",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            accounts_path: None,
            xdotool_bin: PathBuf::from("xdotool"),
            limits: EscalationLimits::default(),
            workers: Vec::new(),
        }
    }
}

/// Per-user directory holding the config and account files.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lolbot")
}

pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

impl BotConfig {
    /// Load `path`, creating it with defaults when missing. An unreadable
    /// file falls back to defaults. Environment overrides apply last.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match toml::from_str(&raw) {
                Ok(config) => config,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Config unparsable, using defaults");
                    Self::default()
                }
            }
        } else {
            let config = Self::default();
            config.save(path)?;
            info!(path = %path.display(), "Wrote default config");
            config
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Apply `LOLBOT_*` overrides. Unparsable numbers are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("LOLBOT_LEAGUE_DIR") {
            self.league_dir = PathBuf::from(dir);
        }
        if let Some(lobby) = lookup("LOLBOT_LOBBY").and_then(|v| v.parse().ok()) {
            self.lobby = lobby;
        }
        if let Some(level) = lookup("LOLBOT_MAX_LEVEL").and_then(|v| v.parse().ok()) {
            self.max_level = level;
        }
    }

    /// Account file, resolved against the config directory.
    pub fn accounts_path(&self) -> PathBuf {
        self.accounts_path
            .clone()
            .unwrap_or_else(|| config_dir().join("accounts.json"))
    }

    /// The config each of `count` workers runs with.
    ///
    /// Workers never share an install: the game config overwrite, the
    /// lockfiles and the launched processes all belong to one client.
    pub fn worker_configs(&self, count: usize) -> Result<Vec<BotConfig>> {
        if self.workers.is_empty() {
            if count > 1 {
                bail!("{count} workers need a [[workers]] entry each, none configured");
            }
            return Ok(vec![self.clone()]);
        }
        if count > self.workers.len() {
            bail!(
                "{count} workers requested but only {} [[workers]] entries configured",
                self.workers.len()
            );
        }

        let mut seen = HashSet::new();
        let mut configs = Vec::with_capacity(count);
        for (worker, install) in self.workers.iter().take(count).enumerate() {
            if !seen.insert(install.league_dir.clone()) {
                bail!(
                    "worker {worker} reuses install {}",
                    install.league_dir.display()
                );
            }
            configs.push(self.for_install(install));
        }
        Ok(configs)
    }

    fn for_install(&self, install: &WorkerInstall) -> BotConfig {
        BotConfig {
            league_dir: install.league_dir.clone(),
            riot_client_dir: install
                .riot_client_dir
                .clone()
                .unwrap_or_else(|| self.riot_client_dir.clone()),
            riot_lockfile: install
                .riot_lockfile
                .clone()
                .or_else(|| self.riot_lockfile.clone()),
            workers: Vec::new(),
            ..self.clone()
        }
    }
}
