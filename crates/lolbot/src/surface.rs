//! UI automation: clicking inside the client window.
//!
//! Positions are ratios of the window's size so the same constants work at
//! any client resolution.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::sleep;
use tracing::debug;

/// Title of the client's main window.
pub const CLIENT_WINDOW: &str = "League of Legends";

#[derive(Debug, Error)]
pub enum ActionError {
    #[error("window '{0}' not found")]
    WindowNotFound(String),

    #[error("automation failed: {0}")]
    AutomationFailed(String),
}

/// Synthetic input against a named window.
#[async_trait]
pub trait ActionSurface: Send + Sync {
    async fn window_exists(&self, title: &str) -> bool;

    async fn focus_window(&self, title: &str) -> Result<(), ActionError>;

    /// Click at `ratio` (x, y in `0.0..=1.0`) of the window's size, then
    /// wait `pause`.
    async fn click_at_relative(
        &self,
        ratio: (f64, f64),
        title: &str,
        pause: Duration,
    ) -> Result<(), ActionError>;
}

/// Window position and size on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowGeometry {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl WindowGeometry {
    /// Parse `xdotool getwindowgeometry --shell` output.
    pub fn parse_shell(output: &str) -> Option<Self> {
        let mut x = None;
        let mut y = None;
        let mut width = None;
        let mut height = None;
        for line in output.lines() {
            let Some((key, value)) = line.trim().split_once('=') else {
                continue;
            };
            let value = value.trim().parse::<i64>().ok();
            match key {
                "X" => x = value,
                "Y" => y = value,
                "WIDTH" => width = value,
                "HEIGHT" => height = value,
                _ => {}
            }
        }
        Some(Self {
            x: x?,
            y: y?,
            width: width?,
            height: height?,
        })
    }

    /// Absolute screen point at `ratio` of the window.
    pub fn point_at(&self, ratio: (f64, f64)) -> (i64, i64) {
        let (rx, ry) = ratio;
        (
            self.x + (self.width as f64 * rx).round() as i64,
            self.y + (self.height as f64 * ry).round() as i64,
        )
    }
}

/// [`ActionSurface`] backed by the `xdotool` binary.
pub struct XdotoolSurface {
    bin: PathBuf,
}

impl XdotoolSurface {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self { bin: bin.into() }
    }

    async fn run(&self, args: &[&str]) -> Result<String, ActionError> {
        let output = Command::new(&self.bin)
            .args(args)
            .output()
            .await
            .map_err(|e| ActionError::AutomationFailed(format!("{}: {e}", self.bin.display())))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ActionError::AutomationFailed(format!(
                "{} {} exited with {}: {}",
                self.bin.display(),
                args.join(" "),
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// First window id whose name matches `title`.
    async fn find_window(&self, title: &str) -> Result<String, ActionError> {
        let found = self
            .run(&["search", "--name", title])
            .await
            .map_err(|_| ActionError::WindowNotFound(title.to_string()))?;
        found
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(String::from)
            .ok_or_else(|| ActionError::WindowNotFound(title.to_string()))
    }
}

#[async_trait]
impl ActionSurface for XdotoolSurface {
    async fn window_exists(&self, title: &str) -> bool {
        self.find_window(title).await.is_ok()
    }

    async fn focus_window(&self, title: &str) -> Result<(), ActionError> {
        let id = self.find_window(title).await?;
        self.run(&["windowactivate", "--sync", id.as_str()]).await?;
        Ok(())
    }

    async fn click_at_relative(
        &self,
        ratio: (f64, f64),
        title: &str,
        pause: Duration,
    ) -> Result<(), ActionError> {
        let id = self.find_window(title).await?;
        let shell = self.run(&["getwindowgeometry", "--shell", id.as_str()]).await?;
        let geometry = WindowGeometry::parse_shell(&shell).ok_or_else(|| {
            ActionError::AutomationFailed(format!("unreadable geometry for window {id}"))
        })?;
        let (x, y) = geometry.point_at(ratio);
        debug!(window = %title, x, y, "Click");
        let (x, y) = (x.to_string(), y.to_string());
        self.run(&["mousemove", "--sync", x.as_str(), y.as_str()]).await?;
        self.run(&["click", "1"]).await?;
        sleep(pause).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shell_geometry() {
        let out = "WINDOW=62914567\nX=320\nY=180\nWIDTH=1280\nHEIGHT=720\nSCREEN=0\n";
        let geometry = WindowGeometry::parse_shell(out).unwrap();
        assert_eq!(
            geometry,
            WindowGeometry {
                x: 320,
                y: 180,
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn test_parse_shell_requires_all_fields() {
        assert!(WindowGeometry::parse_shell("X=1\nY=2\nWIDTH=3\n").is_none());
        assert!(WindowGeometry::parse_shell("X=a\nY=2\nWIDTH=3\nHEIGHT=4").is_none());
    }

    #[test]
    fn test_point_at_ratio() {
        let geometry = WindowGeometry {
            x: 100,
            y: 50,
            width: 1000,
            height: 500,
        };
        assert_eq!(geometry.point_at((0.5, 0.5)), (600, 300));
        assert_eq!(geometry.point_at((0.0, 1.0)), (100, 550));
    }

    #[tokio::test]
    async fn test_missing_binary_means_no_window() {
        let surface = XdotoolSurface::new("/nonexistent/xdotool");
        assert!(!surface.window_exists(CLIENT_WINDOW).await);
        let err = surface.focus_window(CLIENT_WINDOW).await.unwrap_err();
        assert!(matches!(err, ActionError::WindowNotFound(_)));
    }
}
