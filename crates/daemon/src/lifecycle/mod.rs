// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, self-upgrade.

mod startup;
pub mod upgrade;

pub use startup::{startup, StartupResult};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::daemon::Daemon;
use crate::{engine, env, listener};

/// Daemon configuration: every path the daemon owns.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root config directory (e.g. ~/.config/sp)
    pub config_dir: PathBuf,
    /// Path to the Unix socket
    pub socket_path: PathBuf,
    /// Path to the pid file
    pub pid_path: PathBuf,
    /// Path to the database
    pub db_path: PathBuf,
    /// Path to the user ssh config the transport manages blocks in
    pub ssh_config_path: PathBuf,
    /// Public key candidates for sprite setup, in preference order
    pub ssh_pubkey_paths: Vec<PathBuf>,
    /// Provider API base for the reachability probe
    pub api_base: String,
}

impl Config {
    /// Load configuration for the user-level daemon.
    ///
    /// Fixed paths under `~/.config/sp/`; one daemon serves all sprites
    /// for a user.
    pub fn load() -> Result<Self, LifecycleError> {
        let config_dir = env::config_dir()?;
        let ssh_dir = env::ssh_dir()?;
        Ok(Self {
            socket_path: config_dir.join("sp.sock"),
            pid_path: config_dir.join("sp.pid"),
            db_path: config_dir.join("sp.db"),
            ssh_config_path: ssh_dir.join("config"),
            ssh_pubkey_paths: vec![
                ssh_dir.join("id_ed25519.pub"),
                ssh_dir.join("id_rsa.pub"),
            ],
            api_base: env::api_base(),
            config_dir,
        })
    }

    /// All paths rooted under one directory; used by tests.
    pub fn for_dir(dir: &std::path::Path) -> Self {
        Self {
            config_dir: dir.to_path_buf(),
            socket_path: dir.join("sp.sock"),
            pid_path: dir.join("sp.pid"),
            db_path: dir.join("sp.db"),
            ssh_config_path: dir.join("ssh_config"),
            ssh_pubkey_paths: vec![dir.join("id_ed25519.pub")],
            api_base: "http://127.0.0.1:0".to_string(),
        }
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine config directory (HOME unset)")]
    NoConfigDir,

    #[error("daemon already running (pid {0})")]
    AlreadyRunning(u32),

    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),

    #[error("store error: {0}")]
    Store(#[from] sp_store::StoreError),

    #[error("re-exec failed: {0}")]
    ReexecFailed(std::io::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the daemon to completion: startup, task spawning, then the signal /
/// restart / idle-shutdown wait.
pub async fn run() -> Result<(), LifecycleError> {
    let config = Config::load()?;
    let StartupResult { daemon, listener } = startup(config).await?;

    let listener_task = tokio::spawn(listener::run(listener, Arc::clone(&daemon)));
    tokio::spawn(engine::monitor::run(Arc::clone(&daemon)));
    tokio::spawn(idle_checker(Arc::clone(&daemon)));
    match upgrade::executable_digest() {
        Ok(digest) => {
            tokio::spawn(upgrade::watch_executable(Arc::clone(&daemon), digest));
        }
        Err(e) => warn!(error = %e, "cannot hash executable, upgrade watcher disabled"),
    }

    let mut sigterm = signal(SignalKind::terminate())?;
    let restarting = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received");
            false
        }
        _ = sigterm.recv() => {
            info!("terminate received");
            false
        }
        _ = daemon.restart_requested.notified() => true,
        _ = daemon.shutdown.cancelled() => {
            info!("idle shutdown");
            false
        }
    };

    // Drain: kill every tracked proxy, then close the listener.
    daemon.kill_all_proxies().await;
    daemon.shutdown.cancel();
    listener_task.abort();

    if restarting {
        info!("re-executing for upgrade");
        // Socket and pid files stay: the successor has the same pid and
        // must not look like a second daemon.
        return Err(upgrade::re_exec());
    }

    shutdown_cleanup(&daemon.config);
    info!("daemon shutdown complete");
    Ok(())
}

/// Remove the addressing files on a final (non-restart) shutdown.
fn shutdown_cleanup(config: &Config) {
    if config.socket_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.socket_path) {
            warn!(error = %e, "failed to remove socket file");
        }
    }
    if config.pid_path.exists() {
        if let Err(e) = std::fs::remove_file(&config.pid_path) {
            warn!(error = %e, "failed to remove pid file");
        }
    }
}

/// Shut down after a long stretch with no requests, no subscribers, and
/// no proxies.
async fn idle_checker(daemon: Arc<Daemon>) {
    let idle_timeout = env::idle_timeout();
    let mut ticker = tokio::time::interval(Duration::from_secs(60));
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => return,
            _ = ticker.tick() => {}
        }
        if daemon.idle_for() > idle_timeout
            && daemon.bus.subscriber_count() == 0
            && daemon.proxies.count() == 0
        {
            info!(idle_secs = daemon.idle_for().as_secs(), "idle, shutting down");
            daemon.shutdown.cancel();
            return;
        }
    }
}
