// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health monitor: adaptive polling, reconciliation, and recovery.
//!
//! One background task runs four periodic probes with distinct cadences.
//! The sync-status probe honors a per-sprite exponential backoff; the
//! backoff is cleared on success and whenever the network comes back.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use sp_core::{Clock, Sprite, SpriteStatus, StateUpdate, SyncStatus, SystemClock};
use sp_store::ListFilter;
use tracing::{debug, info, warn};

use crate::daemon::Daemon;
use crate::process;

use super::backoff::BackoffTable;

/// Probe cadences. Defaults are the production values; tests shrink them.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub network_interval: Duration,
    pub reconcile_interval: Duration,
    pub sync_interval: Duration,
    pub liveness_interval: Duration,
    /// How long a sprite may sit in `connecting` before recovery.
    pub stuck_after: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            network_interval: Duration::from_secs(15),
            reconcile_interval: Duration::from_secs(60),
            sync_interval: Duration::from_secs(10),
            liveness_interval: Duration::from_secs(15),
            stuck_after: Duration::from_secs(60),
        }
    }
}

/// The monitor task. Owns its backoff and stuck-state bookkeeping; only
/// the `online` flag is shared with the rest of the daemon.
pub struct Monitor<C: Clock> {
    daemon: Arc<Daemon>,
    clock: C,
    cfg: MonitorConfig,
    backoff: BackoffTable<C>,
    /// When each sprite was first observed `connecting`.
    connecting_since: HashMap<String, Instant>,
}

/// Spawnable entry point with production wiring.
pub async fn run(daemon: Arc<Daemon>) {
    Monitor::new(daemon, SystemClock, MonitorConfig::default()).run().await;
}

impl<C: Clock> Monitor<C> {
    pub fn new(daemon: Arc<Daemon>, clock: C, cfg: MonitorConfig) -> Self {
        let backoff = BackoffTable::new(clock.clone());
        Monitor { daemon, clock, cfg, backoff, connecting_since: HashMap::new() }
    }

    pub async fn run(mut self) {
        let mut network = tokio::time::interval(self.cfg.network_interval);
        let mut reconcile = tokio::time::interval(self.cfg.reconcile_interval);
        let mut sync_status = tokio::time::interval(self.cfg.sync_interval);
        let mut liveness = tokio::time::interval(self.cfg.liveness_interval);
        // The first tick of each interval fires immediately; that is the
        // startup reconciliation pass.
        loop {
            tokio::select! {
                _ = self.daemon.shutdown.cancelled() => break,
                _ = network.tick() => self.probe_network().await,
                _ = reconcile.tick() => self.reconcile_sprites().await,
                _ = sync_status.tick() => self.poll_sync_status().await,
                _ = liveness.tick() => self.check_proxy_liveness().await,
            }
        }
        debug!("health monitor stopped");
    }

    /// Network-reach probe. On the edge back to online, clear all
    /// backoffs so sprites are probed immediately on the next tick.
    pub async fn probe_network(&mut self) {
        let online = self.daemon.provider.reachable().await;
        let was_online = self.daemon.set_online(online);
        if online && !was_online {
            info!("provider reachable again, clearing backoffs");
            self.backoff.clear_all();
        } else if !online && was_online {
            warn!("provider unreachable, freezing sync polling");
        }
    }

    /// Sprite-list reconciliation: authoritative status for every known
    /// sprite, with id/url/org backfill and lifecycle reactions.
    pub async fn reconcile_sprites(&mut self) {
        if !self.daemon.is_online() {
            return;
        }
        let known = match self.daemon.store.list(&ListFilter::default()) {
            Ok(known) if !known.is_empty() => known,
            Ok(_) => return,
            Err(e) => {
                warn!(error = %e, "reconcile: store list failed");
                return;
            }
        };
        let remote = match self.daemon.provider.list_sprites().await {
            Ok(remote) => remote,
            Err(e) => {
                debug!(error = %e, "reconcile: provider list failed");
                return;
            }
        };

        for sprite in known {
            let Some(observed) = remote.iter().find(|r| r.name == sprite.name) else {
                continue;
            };
            let new_status = observed.status();

            // Backfill through the merge; unknown never downgrades.
            let mut patch = Sprite::named(sprite.name.as_str());
            patch.id = observed.id.clone();
            patch.url = observed.url.clone();
            patch.org = observed.org.clone();
            patch.status = new_status;
            let merged = match self.daemon.store.upsert(&patch) {
                Ok((merged, _)) => merged,
                Err(e) => {
                    warn!(sprite = %sprite.name, error = %e, "reconcile upsert failed");
                    continue;
                }
            };

            if new_status == sprite.status || !new_status.is_known() {
                continue;
            }
            self.daemon.bus.broadcast(&StateUpdate::sprite_status(merged.clone()));

            match new_status {
                SpriteStatus::Running if merged.has_sync_paths() => {
                    info!(sprite = %sprite.name, "sprite woke, restarting sync");
                    let daemon = Arc::clone(&self.daemon);
                    let name = sprite.name.clone();
                    tokio::spawn(async move {
                        if let Err(e) = daemon.restart_sync(&name).await {
                            warn!(sprite = %name, error = %e, "wake-triggered sync failed");
                        }
                    });
                }
                SpriteStatus::Warm | SpriteStatus::Cold
                    if sprite.status == SpriteStatus::Running =>
                {
                    info!(sprite = %sprite.name, %new_status, "sprite went to sleep");
                    let daemon = Arc::clone(&self.daemon);
                    let name = sprite.name.clone();
                    tokio::spawn(async move {
                        daemon.suspend_sync(&name).await;
                    });
                }
                _ => {}
            }
        }
    }

    /// Sync-status probe over every sprite with an active-ish status.
    pub async fn poll_sync_status(&mut self) {
        if !self.daemon.is_online() {
            return;
        }
        let sprites = match self.daemon.store.list(&ListFilter::default()) {
            Ok(sprites) => sprites,
            Err(e) => {
                warn!(error = %e, "sync probe: store list failed");
                return;
            }
        };

        for sprite in sprites {
            if !sprite.sync_status.is_polled() || self.backoff.in_backoff(&sprite.name) {
                continue;
            }
            match self.daemon.engine.inspect(&sprite.name).await {
                Ok(Some(session)) => {
                    self.backoff.clear(&sprite.name);
                    let status = session.status();
                    self.update_session_row(&sprite.name, &session);
                    if status != sprite.sync_status {
                        self.daemon.publish_sync_status(
                            &sprite.name,
                            status,
                            &session.last_error,
                        );
                    }
                    self.track_connecting(&sprite.name, status).await;
                }
                Ok(None) => {
                    self.backoff.clear(&sprite.name);
                    self.connecting_since.remove(&sprite.name);
                    // An idle (or already-terminal) sprite is supposed to
                    // have no engine session. Anything that should be
                    // live lost its session under us; the liveness probe
                    // and recovery take it from there.
                    if sprite.sync_status.has_session() && sprite.sync_status != SyncStatus::Error
                    {
                        debug!(sprite = %sprite.name, "engine session missing");
                        self.daemon.publish_sync_status(
                            &sprite.name,
                            SyncStatus::Disconnected,
                            "sync engine session missing",
                        );
                    }
                }
                Err(e) => {
                    let delay = self.backoff.record_failure(&sprite.name);
                    debug!(sprite = %sprite.name, error = %e, ?delay, "sync probe failed, backing off");
                }
            }
        }
    }

    /// Proxy-liveness probe: every recorded session must map to a live
    /// supervising process.
    pub async fn check_proxy_liveness(&mut self) {
        let sessions = match self.daemon.store.list_sessions() {
            Ok(sessions) => sessions,
            Err(e) => {
                warn!(error = %e, "liveness probe: store list failed");
                return;
            }
        };
        for session in sessions {
            if process::pid_alive(session.proxy_pid) {
                continue;
            }
            warn!(sprite = %session.sprite_name, pid = session.proxy_pid, "proxy dead with live session row");
            let daemon = Arc::clone(&self.daemon);
            let name = session.sprite_name.clone();
            tokio::spawn(async move {
                daemon.recover(&name).await;
            });
        }
    }

    fn update_session_row(&self, name: &str, session: &sp_adapters::EngineSession) {
        if let Ok(Some(mut row)) = self.daemon.store.get_session(name) {
            row.alpha_connected = session.alpha_connected;
            row.beta_connected = session.beta_connected;
            row.conflicts = session.conflicts;
            row.last_error = session.last_error.clone();
            if let Err(e) = self.daemon.store.put_session(&row) {
                warn!(sprite = name, error = %e, "session row update failed");
            }
        }
    }

    /// Stuck-state detection: `connecting` for longer than the threshold
    /// triggers full recovery. The timer resets on any other state.
    async fn track_connecting(&mut self, name: &str, status: SyncStatus) {
        if status != SyncStatus::Connecting {
            self.connecting_since.remove(name);
            return;
        }
        let now = self.clock.now();
        let since = *self.connecting_since.entry(name.to_string()).or_insert(now);
        if now.duration_since(since) >= self.cfg.stuck_after {
            warn!(sprite = name, "stuck in connecting, recovering");
            self.connecting_since.remove(name);
            let daemon = Arc::clone(&self.daemon);
            let name = name.to_string();
            tokio::spawn(async move {
                daemon.recover(&name).await;
            });
        }
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
