//! Client lockfile: `name:pid:port:password:protocol`.
//!
//! Both the Riot client and the game client write one while running. It is
//! the only source of the port and password for their local HTTPS APIs.

use std::path::Path;
use std::time::Duration;

use super::ApiError;

/// Username the local APIs expect for basic auth.
pub const AUTH_USER: &str = "riot";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    pub name: String,
    pub pid: u32,
    pub port: u16,
    pub password: String,
    pub protocol: String,
}

impl Lockfile {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().splitn(5, ':');
        let name = parts.next()?.to_string();
        let pid = parts.next()?.parse().ok()?;
        let port = parts.next()?.parse().ok()?;
        let password = parts.next()?.to_string();
        let protocol = parts.next()?.to_string();
        if password.is_empty() || protocol.is_empty() {
            return None;
        }
        Some(Self {
            name,
            pid,
            port,
            password,
            protocol,
        })
    }

    pub async fn read(path: &Path) -> Result<Self, ApiError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ApiError::Lockfile {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::parse(&raw).ok_or_else(|| ApiError::Lockfile {
            path: path.to_path_buf(),
            reason: "malformed contents".into(),
        })
    }

    pub fn base_url(&self) -> String {
        format!("{}://127.0.0.1:{}", self.protocol, self.port)
    }
}

/// HTTP client for the local APIs, which serve a self-signed certificate.
pub fn local_http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .danger_accept_invalid_certs(true)
        .timeout(timeout)
        .build()
}
