//! Client lifecycle phases as reported by the gameflow endpoint.
//!
//! The client reports its phase as a bare string. Parsing never fails:
//! anything the bot does not recognise becomes [`Phase::Unknown`] so the
//! orchestrator can escalate it as a session error instead of crashing.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The client's current lifecycle stage in the matchmaking/game flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Phase {
    /// No lobby, sitting on the home screen.
    None,
    /// In a lobby, not queued.
    Lobby,
    /// Queued and waiting for a match.
    Matchmaking,
    /// Match found, waiting for every player to accept.
    ReadyCheck,
    /// Picking champions.
    ChampSelect,
    /// Game running.
    InProgress,
    /// Game running but this client dropped out of it.
    Reconnect,
    /// Game over, server still computing results.
    WaitingForStats,
    /// Honor / level-up / mission screens before the lobby returns.
    PreEndOfGame,
    /// Post-game lobby with the play-again button.
    EndOfGame,
    /// Any phase string the bot has no handler for.
    Unknown(String),
}

impl Phase {
    /// Parse the raw gameflow string. Surrounding quotes and whitespace are
    /// tolerated because the endpoint returns a JSON string literal.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().trim_matches('"') {
            "None" => Self::None,
            "Lobby" => Self::Lobby,
            "Matchmaking" => Self::Matchmaking,
            "ReadyCheck" => Self::ReadyCheck,
            "ChampSelect" => Self::ChampSelect,
            "InProgress" => Self::InProgress,
            "Reconnect" => Self::Reconnect,
            "WaitingForStats" => Self::WaitingForStats,
            "PreEndOfGame" => Self::PreEndOfGame,
            "EndOfGame" => Self::EndOfGame,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// The wire name of this phase.
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "None",
            Self::Lobby => "Lobby",
            Self::Matchmaking => "Matchmaking",
            Self::ReadyCheck => "ReadyCheck",
            Self::ChampSelect => "ChampSelect",
            Self::InProgress => "InProgress",
            Self::Reconnect => "Reconnect",
            Self::WaitingForStats => "WaitingForStats",
            Self::PreEndOfGame => "PreEndOfGame",
            Self::EndOfGame => "EndOfGame",
            Self::Unknown(raw) => raw.as_str(),
        }
    }

    /// Phases that legitimately repeat across consecutive polls and so are
    /// exempt from stuck-phase detection.
    pub fn persists_across_polls(&self) -> bool {
        matches!(self, Self::Matchmaking | Self::ReadyCheck)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Phase {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Phase {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Phase> for String {
    fn from(phase: Phase) -> Self {
        phase.as_str().to_string()
    }
}
