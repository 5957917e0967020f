// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Proxy supervisor: lifetime tracking for forwarding child processes.
//!
//! One waiter task per spawned proxy. When a tracked proxy exits, the
//! waiter closes the sprite's death channel, then asks the provider
//! whether the sprite is still running to tell "sprite went to sleep"
//! (expected: quiet teardown to `idle`) apart from "transport crashed"
//! (unexpected: `disconnected` with the captured stderr; the health
//! monitor recovers it on a later tick).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sp_core::SpriteStatus;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::daemon::{ssh_alias, Daemon};
use crate::process;

use super::SyncError;

/// Cap on retained proxy stderr.
const STDERR_TAIL: usize = 8 * 1024;

struct ProxyEntry {
    pid: u32,
    token: u64,
}

/// Tracked proxies, death channels, and last-words stderr, each under its
/// own lock; none is held across an await.
#[derive(Default)]
pub struct ProxyTable {
    entries: Mutex<HashMap<String, ProxyEntry>>,
    deaths: Mutex<HashMap<String, CancellationToken>>,
    stderr_tails: Mutex<HashMap<String, String>>,
    next_token: AtomicU64,
}

impl ProxyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (replacing any previous) the death channel for a sprite.
    /// Called before the proxy is spawned so nothing can exit unobserved.
    pub fn new_death_channel(&self, name: &str) -> CancellationToken {
        let token = CancellationToken::new();
        self.deaths.lock().insert(name.to_string(), token.clone());
        token
    }

    fn cancel_death(&self, name: &str) {
        if let Some(token) = self.deaths.lock().get(name) {
            token.cancel();
        }
    }

    /// Track a spawned proxy. At most one per sprite; a second
    /// registration is an invariant violation and is rejected.
    fn register(&self, name: &str, pid: u32) -> Result<u64, SyncError> {
        let mut entries = self.entries.lock();
        if entries.contains_key(name) {
            return Err(SyncError::DuplicateProxy(name.to_string()));
        }
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        entries.insert(name.to_string(), ProxyEntry { pid, token });
        Ok(token)
    }

    /// Untrack, returning the pid. Removing before signalling is what
    /// lets the waiter classify the exit as intentional.
    fn remove(&self, name: &str) -> Option<u32> {
        self.entries.lock().remove(name).map(|entry| entry.pid)
    }

    /// Untrack from the waiter side; succeeds only if this waiter's
    /// registration is still the current one.
    fn finish(&self, name: &str, token: u64) -> bool {
        let mut entries = self.entries.lock();
        match entries.get(name) {
            Some(entry) if entry.token == token => {
                entries.remove(name);
                true
            }
            _ => false,
        }
    }

    pub fn pid(&self, name: &str) -> Option<u32> {
        self.entries.lock().get(name).map(|entry| entry.pid)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.lock().contains_key(name)
    }

    pub fn count(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.lock().keys().cloned().collect()
    }

    /// Stderr captured from the most recent proxy exit for a sprite.
    pub fn last_stderr(&self, name: &str) -> String {
        self.stderr_tails.lock().get(name).cloned().unwrap_or_default()
    }

    fn set_last_stderr(&self, name: &str, stderr: &str) {
        self.stderr_tails
            .lock()
            .insert(name.to_string(), stderr.to_string());
    }
}

impl Daemon {
    /// Spawn the forwarding process for a sprite and start its waiter.
    /// Requires a death channel registered beforehand.
    pub(crate) fn spawn_proxy(
        &self,
        name: &str,
        port: u16,
    ) -> Result<u32, SyncError> {
        let mut cmd = self.provider.proxy_command(name, port);
        cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::piped());
        let child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => sp_adapters::ProviderError::MissingBinary(e),
            _ => sp_adapters::ProviderError::Io(e),
        })?;
        let pid = child.id().unwrap_or(0);
        let token = self.proxies.register(name, pid)?;
        info!(sprite = name, pid, port, "proxy spawned");

        let daemon = self.arc();
        let sprite = name.to_string();
        tokio::spawn(async move {
            wait_for_proxy(daemon, sprite, child, token).await;
        });
        Ok(pid)
    }

    /// Terminate a tracked proxy: untrack first, then SIGTERM with a 3 s
    /// grace before SIGKILL. Idempotent.
    pub async fn kill_proxy(&self, name: &str) {
        let Some(pid) = self.proxies.remove(name) else { return };
        debug!(sprite = name, pid, "killing proxy");
        process::terminate_with_grace(pid, self.tunables.kill_grace).await;
    }

    pub async fn kill_all_proxies(&self) {
        for name in self.proxies.names() {
            self.kill_proxy(&name).await;
        }
    }
}

/// Waiter half of the supervisor: drain stderr, reap, classify.
async fn wait_for_proxy(daemon: Arc<Daemon>, name: String, mut child: Child, token: u64) {
    let stderr_pipe = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut tail = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let mut buf = [0u8; 1024];
            while let Ok(n) = pipe.read(&mut buf).await {
                if n == 0 {
                    break;
                }
                tail.extend_from_slice(&buf[..n]);
                if tail.len() > STDERR_TAIL {
                    let start = tail.len() - STDERR_TAIL;
                    tail.drain(..start);
                }
            }
        }
        String::from_utf8_lossy(&tail).trim().to_string()
    });

    let status = child.wait().await;
    let stderr = stderr_task.await.unwrap_or_default();

    // Replaced or intentionally killed: someone else owns the cleanup.
    if !daemon.proxies.finish(&name, token) {
        debug!(sprite = %name, "proxy exit was intentional");
        return;
    }

    daemon.proxies.set_last_stderr(&name, &stderr);
    daemon.proxies.cancel_death(&name);
    info!(sprite = %name, exit = ?status.as_ref().ok().map(|s| s.code()), stderr = %stderr, "proxy exited");

    // Only classify exits of established syncs. A proxy dying mid-setup
    // aborts the attempt through the death channel, and the controller
    // owns that outcome (retry, idle, or error).
    let established = daemon
        .store
        .get(&name)
        .ok()
        .flatten()
        .map(|s| s.sync_status.has_session())
        .unwrap_or(false)
        || daemon.store.get_session(&name).ok().flatten().is_some();
    if !established {
        debug!(sprite = %name, "proxy exited during setup");
        return;
    }

    let running = matches!(
        daemon.provider.get_sprite(&name).await.map(|s| s.status()),
        Ok(SpriteStatus::Running)
    );

    if running {
        // Transport crash under a live sprite. Leave the session row so
        // the liveness probe picks this up for recovery.
        daemon.publish_sync_status(&name, sp_core::SyncStatus::Disconnected, &stderr);
    } else {
        // The sprite went to sleep; the forward had nothing to forward to.
        debug!(sprite = %name, "sprite asleep, tearing sync down");
        if let Err(e) = daemon.engine.terminate(&name).await {
            warn!(sprite = %name, error = %e, "engine terminate failed during teardown");
        }
        let _ = daemon.transport.remove_config(&ssh_alias(&name)).await;
        let _ = daemon.store.delete_session(&name);
        daemon.publish_sync_status(&name, sp_core::SyncStatus::Idle, "");
    }
}

#[cfg(test)]
#[path = "proxy_tests.rs"]
mod tests;
