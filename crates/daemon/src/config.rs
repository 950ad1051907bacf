// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed daemon configuration (§10.3), merged in priority order: CLI flags
//! > environment variables (`_HUB_CS`, `EDGEPROXY_*`) > a JSON config file
//! > built-in defaults. Nothing here is read more than once — `proxyd`
//! resolves a `ProxyConfig` at startup and threads it through
//! [`crate::bootstrap::run`].

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use edgeproxy_browse::BrowseTimings;
use serde::Deserialize;

use crate::cli::Cli;
use crate::error::DaemonError;

const DEFAULT_CONNECTION_STRING_ENV: &str = "_HUB_CS";

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub connection_string: String,
    pub name: String,
    pub local_registry_path: PathBuf,
    pub hub_registry_path: PathBuf,
    pub inflight_cap: usize,
    pub browse_timings: BrowseTimings,
    pub browse_fs_enabled: bool,
    pub scan_enabled: bool,
    pub browse_listen_addr: SocketAddr,
    pub heartbeat_interval: Duration,
    pub telemetry_log_interval: Duration,
}

/// The on-disk config file's shape — every field optional, since any of
/// them may instead come from a CLI flag, an environment variable, or the
/// built-in default (§10.3's priority order).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    connection_string: Option<String>,
    name: Option<String>,
    local_registry_path: Option<PathBuf>,
    hub_registry_path: Option<PathBuf>,
    inflight_cap: Option<usize>,
    stream_timeout_ms: Option<u64>,
    sd_backoff_interval_ms: Option<u64>,
    sd_reset_interval_ms: Option<u64>,
    browse_fs_enabled: Option<bool>,
    scan_enabled: Option<bool>,
    browse_listen_addr: Option<SocketAddr>,
    heartbeat_interval_ms: Option<u64>,
    telemetry_log_interval_ms: Option<u64>,
}

impl ProxyConfig {
    /// Resolves a config file path: `--config`, else `$EDGEPROXY_CONFIG`,
    /// else `<config dir>/edgeproxy/config.json`, else `None` (no file).
    fn resolve_config_path(cli: &Cli) -> Option<PathBuf> {
        if let Some(path) = &cli.config {
            return Some(path.clone());
        }
        if let Ok(path) = std::env::var("EDGEPROXY_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("edgeproxy").join("config.json"))
    }

    fn load_config_file(path: Option<&PathBuf>) -> Result<ConfigFile, DaemonError> {
        let Some(path) = path else { return Ok(ConfigFile::default()) };
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                serde_json::from_str(&contents).map_err(|e| DaemonError::Config(format!("{path:?}: {e}")))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Merges CLI flags, environment, the config file, and defaults into
    /// one resolved configuration.
    pub fn load(cli: &Cli) -> Result<Self, DaemonError> {
        let config_path = Self::resolve_config_path(cli);
        let file = Self::load_config_file(config_path.as_ref())?;

        let connection_string = cli
            .connection_string
            .clone()
            .or_else(|| std::env::var(DEFAULT_CONNECTION_STRING_ENV).ok())
            .or(file.connection_string)
            .ok_or_else(|| {
                DaemonError::Config(format!(
                    "no connection string: pass --connection-string, set {DEFAULT_CONNECTION_STRING_ENV}, or configure one in the config file"
                ))
            })?;

        let name = cli
            .name
            .clone()
            .or_else(|| std::env::var("EDGEPROXY_NAME").ok())
            .or(file.name)
            .unwrap_or_else(|| "proxy".to_string());

        let local_registry_path = env_path("EDGEPROXY_LOCAL_REGISTRY")
            .or(file.local_registry_path)
            .unwrap_or_else(|| PathBuf::from("ns.local.json"));
        let hub_registry_path = env_path("EDGEPROXY_HUB_REGISTRY")
            .or(file.hub_registry_path)
            .unwrap_or_else(|| PathBuf::from("ns.hub.json"));

        let inflight_cap = env_parsed("EDGEPROXY_INFLIGHT_CAP")
            .or(file.inflight_cap)
            .unwrap_or(edgeproxy_wire::DEFAULT_MAX_INFLIGHT);

        let defaults = BrowseTimings::default();
        let browse_timings = BrowseTimings {
            stream_timeout: env_parsed("EDGEPROXY_STREAM_TIMEOUT_MS")
                .or(file.stream_timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.stream_timeout),
            sd_backoff_interval: env_parsed("EDGEPROXY_SD_BACKOFF_MS")
                .or(file.sd_backoff_interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.sd_backoff_interval),
            sd_reset_interval: env_parsed("EDGEPROXY_SD_RESET_MS")
                .or(file.sd_reset_interval_ms)
                .map(Duration::from_millis)
                .unwrap_or(defaults.sd_reset_interval),
        };

        let browse_fs_enabled = file.browse_fs_enabled.unwrap_or(true);
        let scan_enabled = file.scan_enabled.unwrap_or(true);

        let browse_listen_addr = env_parsed::<SocketAddr>("EDGEPROXY_BROWSE_ADDR")
            .or(file.browse_listen_addr)
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 0)));

        let heartbeat_interval = env_parsed("EDGEPROXY_HEARTBEAT_MS")
            .or(file.heartbeat_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_secs(10));

        let telemetry_log_interval = env_parsed("EDGEPROXY_TELEMETRY_MS")
            .or(file.telemetry_log_interval_ms)
            .map(Duration::from_millis)
            .unwrap_or_else(|| Duration::from_secs(2));

        Ok(ProxyConfig {
            connection_string,
            name,
            local_registry_path,
            hub_registry_path,
            inflight_cap,
            browse_timings,
            browse_fs_enabled,
            scan_enabled,
            browse_listen_addr,
            heartbeat_interval,
            telemetry_log_interval,
        })
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key).ok().map(PathBuf::from)
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
