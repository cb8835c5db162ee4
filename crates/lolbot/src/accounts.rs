//! Account persistence.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use coordination::{Account, WorkerId};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AccountsError {
    #[error("no account below level {max_level}")]
    NoEligibleAccount { max_level: u32 },

    #[error("account file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("account file {} is malformed: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    /// First account still below `max_level`.
    async fn next_account(&self, max_level: u32) -> Result<Account, AccountsError>;

    /// Replace the stored account with the same username, or append it.
    async fn save_or_update(&self, account: &Account) -> Result<(), AccountsError>;
}

/// Accounts kept as a pretty-printed JSON array.
///
/// Workers share one store through [`JsonAccountStore::lease_for`], which
/// keeps two workers from leveling the same account.
pub struct JsonAccountStore {
    path: PathBuf,
    // Serializes read-modify-write cycles of every handle on this store.
    write_lock: Mutex<()>,
    leases: std::sync::Mutex<HashMap<String, WorkerId>>,
}

impl JsonAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            leases: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Handle for `worker` that only hands out accounts no other worker holds.
    pub fn lease_for(self: &Arc<Self>, worker: WorkerId) -> LeasedAccounts {
        LeasedAccounts {
            store: Arc::clone(self),
            worker,
        }
    }

    /// First eligible account not leased to another worker. The worker's
    /// previous lease, if any, moves to the returned account.
    async fn next_unleased(
        &self,
        worker: WorkerId,
        max_level: u32,
    ) -> Result<Account, AccountsError> {
        let accounts = self.load().await?;
        let mut leases = self.leases.lock().unwrap_or_else(|p| p.into_inner());
        let account = accounts
            .into_iter()
            .filter(|account| account.is_eligible(max_level))
            .find(|account| {
                leases
                    .get(&account.username)
                    .map_or(true, |holder| *holder == worker)
            })
            .ok_or(AccountsError::NoEligibleAccount { max_level })?;
        leases.retain(|_, holder| *holder != worker);
        leases.insert(account.username.clone(), worker);
        debug!(worker, username = %account.username, "Account leased");
        Ok(account)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored accounts. A missing file is an empty store.
    pub async fn load(&self) -> Result<Vec<Account>, AccountsError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(AccountsError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&raw).map_err(|source| AccountsError::Malformed {
            path: self.path.clone(),
            source,
        })
    }

    async fn store(&self, accounts: &[Account]) -> Result<(), AccountsError> {
        let io_err = |source| AccountsError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(accounts).map_err(|source| {
            AccountsError::Malformed {
                path: self.path.clone(),
                source,
            }
        })?;
        tokio::fs::write(&self.path, json).await.map_err(io_err)
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn next_account(&self, max_level: u32) -> Result<Account, AccountsError> {
        self.load()
            .await?
            .into_iter()
            .find(|account| account.is_eligible(max_level))
            .ok_or(AccountsError::NoEligibleAccount { max_level })
    }

    async fn save_or_update(&self, account: &Account) -> Result<(), AccountsError> {
        let _guard = self.write_lock.lock().await;
        let mut accounts = self.load().await?;
        match accounts.iter_mut().find(|a| a.username == account.username) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.store(&accounts).await?;
        debug!(username = %account.username, level = account.level, "Account saved");
        Ok(())
    }
}

/// One worker's view of a shared [`JsonAccountStore`].
pub struct LeasedAccounts {
    store: Arc<JsonAccountStore>,
    worker: WorkerId,
}

#[async_trait]
impl AccountStore for LeasedAccounts {
    async fn next_account(&self, max_level: u32) -> Result<Account, AccountsError> {
        self.store.next_unleased(self.worker, max_level).await
    }

    async fn save_or_update(&self, account: &Account) -> Result<(), AccountsError> {
        self.store.save_or_update(account).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_has_no_eligible_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        assert!(store.load().await.unwrap().is_empty());
        let err = store.next_account(30).await.unwrap_err();
        assert!(matches!(err, AccountsError::NoEligibleAccount { max_level: 30 }));
    }

    #[tokio::test]
    async fn test_next_account_skips_leveled() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("accounts.json"));
        store.save_or_update(&Account::new("done", "pw", 30)).await.unwrap();
        store.save_or_update(&Account::new("fresh", "pw", 4)).await.unwrap();

        let next = store.next_account(30).await.unwrap();
        assert_eq!(next.username, "fresh");
    }

    #[tokio::test]
    async fn test_save_or_update_replaces_by_username() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonAccountStore::new(dir.path().join("nested").join("accounts.json"));
        store.save_or_update(&Account::new("alice", "pw", 1)).await.unwrap();
        store.save_or_update(&Account::new("bob", "pw", 1)).await.unwrap();
        store.save_or_update(&Account::new("alice", "pw", 30)).await.unwrap();

        let all = store.load().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].username, "alice");
        assert_eq!(all[0].level, 30);
    }

    #[tokio::test]
    async fn test_malformed_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = JsonAccountStore::new(&path);
        assert!(matches!(
            store.next_account(30).await.unwrap_err(),
            AccountsError::Malformed { .. }
        ));
    }

    #[tokio::test]
    async fn test_level_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.json");
        std::fs::write(&path, r#"[{"username":"new","password":"pw"}]"#).unwrap();
        let store = JsonAccountStore::new(&path);
        assert_eq!(store.next_account(30).await.unwrap().level, 0);
    }

    #[tokio::test]
    async fn test_workers_lease_distinct_accounts() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonAccountStore::new(dir.path().join("accounts.json")));
        store.save_or_update(&Account::new("alice", "pw", 1)).await.unwrap();
        store.save_or_update(&Account::new("bob", "pw", 1)).await.unwrap();
        let first = store.lease_for(0);
        let second = store.lease_for(1);

        assert_eq!(first.next_account(30).await.unwrap().username, "alice");
        assert_eq!(second.next_account(30).await.unwrap().username, "bob");
        // After a restart a worker gets its own account back.
        assert_eq!(first.next_account(30).await.unwrap().username, "alice");

        // Once alice is done, bob stays with the other worker.
        first.save_or_update(&Account::new("alice", "pw", 30)).await.unwrap();
        assert!(matches!(
            first.next_account(30).await.unwrap_err(),
            AccountsError::NoEligibleAccount { max_level: 30 }
        ));
        assert_eq!(store.load().await.unwrap()[0].level, 30);
    }

    #[tokio::test]
    async fn test_concurrent_saves_through_shared_store_all_land() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonAccountStore::new(dir.path().join("accounts.json")));
        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let accounts = store.lease_for(worker);
                tokio::spawn(async move {
                    accounts
                        .save_or_update(&Account::new(format!("user{worker}"), "pw", 1))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(store.load().await.unwrap().len(), 8);
    }
}
