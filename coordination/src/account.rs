use std::fmt;

use serde::{Deserialize, Serialize};

/// A leveling account as kept by the account store.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub level: u32,
}

impl Account {
    pub fn new(username: impl Into<String>, password: impl Into<String>, level: u32) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            level,
        }
    }

    /// Whether this account still needs leveling towards `target`.
    pub fn is_eligible(&self, target: u32) -> bool {
        self.level < target
    }
}

// Passwords never reach the logs.
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("level", &self.level)
            .finish()
    }
}
