//! Game settings overwrite.
//!
//! Every file in `<league_dir>/Config` is removed and replaced by one
//! low-resource `game.cfg`, so the game starts windowed, muted and cheap
//! to render on every launch.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

/// Bundled settings written on every start.
pub const GAME_CFG_TEMPLATE: &str = include_str!("../resources/game.cfg");

/// Replace the game's settings. Returns the written file.
pub async fn overwrite_game_config(league_dir: &Path) -> Result<PathBuf> {
    info!("Overwriting game configs");
    let folder = league_dir.join("Config");
    tokio::fs::create_dir_all(&folder)
        .await
        .with_context(|| format!("Failed to create {}", folder.display()))?;

    let mut entries = tokio::fs::read_dir(&folder)
        .await
        .with_context(|| format!("Failed to list {}", folder.display()))?;
    while let Some(entry) = entries
        .next_entry()
        .await
        .with_context(|| format!("Failed to list {}", folder.display()))?
    {
        let path = entry.path();
        let is_file = match entry.file_type().await {
            Ok(kind) => kind.is_file() || kind.is_symlink(),
            Err(_) => false,
        };
        if !is_file {
            continue;
        }
        if let Err(e) = tokio::fs::remove_file(&path).await {
            error!(path = %path.display(), error = %e, "Failed to delete config file");
        }
    }

    let target = folder.join("game.cfg");
    tokio::fs::write(&target, GAME_CFG_TEMPLATE)
        .await
        .with_context(|| format!("Failed to write {}", target.display()))?;
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_overwrite_replaces_files_and_keeps_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("Config");
        std::fs::create_dir_all(config.join("Champions")).unwrap();
        std::fs::write(config.join("PersistedSettings.json"), "{}").unwrap();
        std::fs::write(config.join("game.cfg"), "[General]\nWidth=3840").unwrap();

        let written = overwrite_game_config(dir.path()).await.unwrap();

        assert_eq!(written, config.join("game.cfg"));
        assert!(!config.join("PersistedSettings.json").exists());
        assert!(config.join("Champions").is_dir());
        assert_eq!(std::fs::read_to_string(&written).unwrap(), GAME_CFG_TEMPLATE);
    }

    #[tokio::test]
    async fn test_creates_missing_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let written = overwrite_game_config(dir.path()).await.unwrap();
        assert!(written.exists());
    }
}
