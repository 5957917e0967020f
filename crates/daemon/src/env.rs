// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Sentinel set on the successor process during graceful re-exec so it
/// skips the "already running" probe (it has the same pid as its
/// predecessor).
pub const REEXEC_ENV: &str = "SP_DAEMON_REEXEC";

/// Resolve the config directory: SP_CONFIG_DIR > ~/.config/sp
pub fn config_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SP_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoConfigDir)?;
    Ok(PathBuf::from(home).join(".config/sp"))
}

/// Resolve the ssh directory: SP_SSH_DIR > ~/.ssh
pub fn ssh_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("SP_SSH_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoConfigDir)?;
    Ok(PathBuf::from(home).join(".ssh"))
}

/// Whether this process is a re-exec successor.
pub fn is_reexec() -> bool {
    std::env::var(REEXEC_ENV).is_ok_and(|v| !v.is_empty())
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    std::env::var("SP_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5))
}

/// How long the daemon may sit with no requests, no subscribers, and no
/// proxies before shutting itself down.
pub fn idle_timeout() -> Duration {
    std::env::var("SP_IDLE_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30 * 60))
}

/// Log filter (tracing env-filter syntax).
pub fn log_filter() -> String {
    std::env::var("SP_LOG").unwrap_or_else(|_| "info".to_string())
}

/// Provider API base for the reachability probe.
pub fn api_base() -> String {
    std::env::var("SP_API_BASE").unwrap_or_else(|_| "https://api.sprites.dev".to_string())
}
