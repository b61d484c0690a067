// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process configuration, loaded from a TOML file with environment
//! overrides. Mirrors the cadences and timeouts named throughout §4.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: String, #[source] source: std::io::Error },
    #[error("failed to parse config file {path}: {source}")]
    Parse { path: String, #[source] source: toml::de::Error },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bind address for the backend gRPC surface (C12).
    pub grpc_listen: String,
    /// Bind address for the REST façade (C11).
    pub rest_listen: String,
    /// Path to the append-only write-ahead log the Persistent Store replays
    /// on startup and appends to thereafter.
    pub wal_path: String,
    /// Cadence of the per-agent Dispatch Workflow (C6). Default 60s (Q2).
    pub dispatch_interval_secs: u64,
    /// Cadence of the per-agent Health-Check Workflow (C8). Default 30s.
    pub health_check_interval_secs: u64,
    /// Orphan threshold: an in-progress job not updated within this window
    /// is reclaimed by Preprocess step 2. Default 5 minutes.
    pub orphan_threshold_secs: u64,
    /// Timeout waiting for a `HEARTBEAT` ack to a scheduled
    /// `HEALTH_CHECK_PING`. Default 5 seconds.
    pub health_check_ack_timeout_secs: u64,
    /// Timeout for the synchronous reconnect-endpoint ping. Default 10s.
    pub reconnect_ping_timeout_secs: u64,
    /// Heartbeat timeout for the streaming `execute_job` activity — silence
    /// longer than this cancels and retries. Default 5 minutes.
    pub execute_heartbeat_timeout_secs: u64,
    /// `RUST_LOG`-style filter directive used when no `RUST_LOG` env var is set.
    pub log_filter: String,
    /// In-memory API-key table seeded at startup: `{api_key -> org_id}`.
    pub api_keys: Vec<ApiKeyEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKeyEntry {
    pub api_key: String,
    pub org_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            grpc_listen: "0.0.0.0:7701".to_string(),
            rest_listen: "0.0.0.0:7700".to_string(),
            wal_path: "dispatchd.wal".to_string(),
            dispatch_interval_secs: 60,
            health_check_interval_secs: 30,
            orphan_threshold_secs: 300,
            health_check_ack_timeout_secs: 5,
            reconnect_ping_timeout_secs: 10,
            execute_heartbeat_timeout_secs: 300,
            log_filter: "info".to_string(),
            api_keys: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn dispatch_interval(&self) -> Duration {
        Duration::from_secs(self.dispatch_interval_secs)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn orphan_threshold(&self) -> Duration {
        Duration::from_secs(self.orphan_threshold_secs)
    }

    pub fn health_check_ack_timeout(&self) -> Duration {
        Duration::from_secs(self.health_check_ack_timeout_secs)
    }

    pub fn reconnect_ping_timeout(&self) -> Duration {
        Duration::from_secs(self.reconnect_ping_timeout_secs)
    }

    pub fn execute_heartbeat_timeout(&self) -> Duration {
        Duration::from_secs(self.execute_heartbeat_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_spec_cadences() {
        let config = Config::default();
        assert_eq!(config.dispatch_interval_secs, 60);
        assert_eq!(config.health_check_interval_secs, 30);
        assert_eq!(config.orphan_threshold_secs, 300);
    }

    #[test]
    fn load_with_no_path_returns_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.grpc_listen, "0.0.0.0:7701");
    }

    #[test]
    fn load_parses_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dispatchd.toml");
        std::fs::write(&path, "dispatch_interval_secs = 5\n").unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.dispatch_interval_secs, 5);
        assert_eq!(config.health_check_interval_secs, 30);
    }

    #[test]
    fn load_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not valid = [[[").unwrap();
        assert!(Config::load(Some(&path)).is_err());
    }
}
