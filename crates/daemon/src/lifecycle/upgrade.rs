// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Self-upgrade by re-execution.
//!
//! The daemon hashes its own executable at startup and re-hashes it on a
//! low-frequency timer. When the binary on disk changes (or a `restart`
//! RPC arrives) it replaces itself with a fresh invocation of the same
//! path. `exec` preserves the pid, so the pid file stays valid across the
//! swap and clients never see a "not running" gap.

use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::daemon::Daemon;
use crate::env;

use super::LifecycleError;

const CHECK_INTERVAL: Duration = Duration::from_secs(10);

/// SHA-256 of the running executable's on-disk bytes.
pub fn executable_digest() -> std::io::Result<String> {
    let exe = std::env::current_exe()?;
    let bytes = std::fs::read(exe)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

/// Watch the executable for changes; request a graceful restart when the
/// digest moves.
pub async fn watch_executable(daemon: Arc<Daemon>, initial: String) {
    let mut ticker = tokio::time::interval(CHECK_INTERVAL);
    ticker.tick().await; // immediate first tick; we hashed at startup
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => return,
            _ = ticker.tick() => {}
        }
        match executable_digest() {
            Ok(digest) if digest != initial => {
                info!("executable changed on disk, restarting");
                daemon.restart_requested.notify_one();
                return;
            }
            Ok(_) => {}
            // A half-written binary mid-upgrade reads as an error; try
            // again next tick.
            Err(e) => warn!(error = %e, "executable re-hash failed"),
        }
    }
}

/// Replace this process with a fresh invocation of the same executable.
/// Only returns on failure.
pub fn re_exec() -> LifecycleError {
    use std::os::unix::process::CommandExt;

    let exe = match std::env::current_exe() {
        Ok(exe) => exe,
        Err(e) => return LifecycleError::ReexecFailed(e),
    };
    let err = std::process::Command::new(exe).env(env::REEXEC_ENV, "1").exec();
    LifecycleError::ReexecFailed(err)
}
