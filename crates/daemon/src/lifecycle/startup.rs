// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: singleton enforcement, socket binding, session
//! reconciliation.

use std::io::Write;
use std::sync::Arc;

use sp_core::SyncStatus;
use sp_store::Store;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::daemon::Daemon;
use crate::{env, process};

use super::{Config, LifecycleError};

/// Result of daemon startup: the shared daemon state plus the socket
/// listener to hand to the listener task.
pub struct StartupResult {
    pub daemon: Arc<Daemon>,
    pub listener: UnixListener,
}

impl std::fmt::Debug for StartupResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupResult").finish_non_exhaustive()
    }
}

/// Start the daemon.
pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.config_dir)?;

    // 1. Singleton check, then claim the pid file. A re-exec successor
    // skips the probe: it has the same pid as its predecessor.
    if env::is_reexec() {
        info!("re-exec successor starting");
    } else {
        check_not_running(&config)?;
    }
    write_pid_file(&config)?;

    // 2. Open the store (idempotent schema).
    let store = Store::open(&config.db_path)?;

    // 3. Remove a stale socket and bind last, after validation passes.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    let daemon = Daemon::with_real_adapters(config, store);

    // 4. Sessions recorded by a previous run whose proxies are gone are
    // marked disconnected; the health monitor recovers them.
    reconcile_sessions(&daemon);

    info!("daemon started");
    Ok(StartupResult { daemon, listener })
}

/// Signal-0 probe against the pid recorded at the pid path.
fn check_not_running(config: &Config) -> Result<(), LifecycleError> {
    let Ok(content) = std::fs::read_to_string(&config.pid_path) else {
        return Ok(());
    };
    let Ok(pid) = content.trim().parse::<u32>() else {
        return Ok(());
    };
    if pid != std::process::id() && process::pid_alive(pid) {
        return Err(LifecycleError::AlreadyRunning(pid));
    }
    Ok(())
}

fn write_pid_file(config: &Config) -> Result<(), LifecycleError> {
    let mut file = std::fs::File::create(&config.pid_path)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(())
}

fn reconcile_sessions(daemon: &Arc<Daemon>) {
    let sessions = match daemon.store.list_sessions() {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!(error = %e, "startup session reconciliation failed");
            return;
        }
    };
    for session in sessions {
        if process::pid_alive(session.proxy_pid) {
            // The proxy outlived the previous daemon; sync may well still
            // be flowing. Leave it; the monitor keeps watching the pid.
            info!(sprite = %session.sprite_name, pid = session.proxy_pid, "adopted surviving proxy");
            continue;
        }
        warn!(sprite = %session.sprite_name, "proxy did not survive restart");
        daemon.publish_sync_status(
            &session.sprite_name,
            SyncStatus::Disconnected,
            "proxy did not survive daemon restart",
        );
    }
}

#[cfg(test)]
#[path = "startup_tests.rs"]
mod tests;
