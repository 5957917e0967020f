// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared daemon state handed to every task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use sp_adapters::{MutagenCli, Provider, SpriteCli, SshTransport, SyncEngine, Transport};
use sp_core::{SpriteStatus, StateUpdate, SyncStatus};
use sp_store::Store;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::bus::Bus;
use crate::engine::proxy::ProxyTable;
use crate::engine::SyncTunables;
use crate::lifecycle::Config;

/// Everything the listener, controller, supervisor, and monitor share.
/// Lives behind one `Arc`; in-process locks guard only the in-memory maps.
pub struct Daemon {
    pub config: Config,
    pub tunables: SyncTunables,
    pub store: Store,
    pub bus: Bus,
    pub proxies: ProxyTable,
    pub provider: Arc<dyn Provider>,
    pub engine: Arc<dyn SyncEngine>,
    pub transport: Arc<dyn Transport>,
    /// Provider reachability, maintained by the health monitor.
    pub online: AtomicBool,
    /// Set by the `restart` RPC and the executable watcher.
    pub restart_requested: Notify,
    /// Root cancellation: signals, idle shutdown.
    pub shutdown: CancellationToken,
    last_activity: Mutex<Instant>,
    /// Self-handle for handing `Arc` clones to spawned tasks.
    me: Weak<Daemon>,
}

impl Daemon {
    pub fn new(
        config: Config,
        store: Store,
        provider: Arc<dyn Provider>,
        engine: Arc<dyn SyncEngine>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        Self::new_tuned(config, store, provider, engine, transport, SyncTunables::default())
    }

    /// Wiring with explicit timing knobs; tests shrink them.
    pub fn new_tuned(
        config: Config,
        store: Store,
        provider: Arc<dyn Provider>,
        engine: Arc<dyn SyncEngine>,
        transport: Arc<dyn Transport>,
        tunables: SyncTunables,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Daemon {
            config,
            tunables,
            store,
            bus: Bus::new(),
            proxies: ProxyTable::new(),
            provider,
            engine,
            transport,
            online: AtomicBool::new(true),
            restart_requested: Notify::new(),
            shutdown: CancellationToken::new(),
            last_activity: Mutex::new(Instant::now()),
            me: me.clone(),
        })
    }

    /// An owning handle to this daemon, for spawning tasks.
    pub(crate) fn arc(&self) -> Arc<Daemon> {
        match self.me.upgrade() {
            Some(daemon) => daemon,
            // Constructors only ever hand the daemon out behind an Arc.
            None => unreachable!(),
        }
    }

    /// Production wiring: the real `sprite`/`mutagen`/`ssh` adapters.
    pub fn with_real_adapters(config: Config, store: Store) -> Arc<Self> {
        let provider = Arc::new(SpriteCli::new(config.api_base.clone()));
        let engine = Arc::new(MutagenCli::new());
        let transport = Arc::new(SshTransport::new(config.ssh_config_path.clone()));
        Daemon::new(config, store, provider, engine, transport)
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    pub fn set_online(&self, online: bool) -> bool {
        self.online.swap(online, Ordering::Relaxed)
    }

    /// Mark request activity for the idle-shutdown clock.
    pub fn touch_activity(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    /// Write a sync status and broadcast the delta only when something
    /// actually changed. A missing sprite is logged, not fatal: teardown
    /// paths race with deletion.
    pub fn publish_sync_status(&self, name: &str, status: SyncStatus, error: &str) {
        match self.store.set_sync_status(name, status, error) {
            Ok((sprite, true)) => self.bus.broadcast(&StateUpdate::sync_status(sprite)),
            Ok((_, false)) => {}
            Err(e) => warn!(sprite = name, error = %e, "failed to persist sync status"),
        }
    }

    /// Write a provider status and broadcast on change.
    pub fn publish_sprite_status(&self, name: &str, status: SpriteStatus) {
        match self.store.set_status(name, status) {
            Ok((sprite, true)) => self.bus.broadcast(&StateUpdate::sprite_status(sprite)),
            Ok((_, false)) => {}
            Err(e) => warn!(sprite = name, error = %e, "failed to persist sprite status"),
        }
    }
}

/// The transport alias for a sprite; also the engine's beta host.
pub fn ssh_alias(name: &str) -> String {
    format!("sp-{name}")
}
