// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sync lifecycle controller: the attempt pipeline.
//!
//! Both `start_sync` and `restart_sync` run the same pipeline under a
//! bounded retry with linear backoff. A death channel is registered
//! before the proxy is spawned, and every wait after the spawn selects on
//! it so a proxy crash aborts the attempt in milliseconds. When an
//! attempt fails because the sprite is simply not running, the failure is
//! reclassified as an expected transition to `idle`.

use std::path::Path;

use sp_adapters::collect_ignores;
use sp_core::{ssh_port_for, Sprite, SpriteStatus, StateUpdate, SyncSession, SyncStatus};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::daemon::{ssh_alias, Daemon};
use crate::process;
use crate::protocol::SyncStartResult;

use super::SyncError;

/// What a successful sync request ended as.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    /// The pipeline reached `watching`.
    Watching(SyncStartResult),
    /// The sprite is asleep; sync was torn down intentionally.
    Idle,
}

impl Daemon {
    /// Bring a sprite from any state to `watching`.
    pub async fn start_sync(
        &self,
        name: &str,
        local_path: &str,
        remote_path: &str,
        org: &str,
    ) -> Result<SyncOutcome, SyncError> {
        // Record identity and paths first so restart/resync can re-derive
        // them, and so the record exists for status writes.
        let mut record = Sprite::named(name);
        record.local_path = local_path.to_string();
        record.remote_path = remote_path.to_string();
        record.org = org.to_string();
        let (sprite, inserted) = self.store.upsert(&record)?;
        if inserted {
            self.bus.broadcast(&StateUpdate::added(sprite));
        }

        let mut last_err: Option<SyncError> = None;
        for attempt in 1..=self.tunables.max_attempts {
            match self.run_attempt(name, local_path, remote_path, org).await {
                Ok(result) => {
                    info!(sprite = name, port = result.ssh_port, "sync watching");
                    self.publish_sync_status(name, SyncStatus::Watching, "");
                    return Ok(SyncOutcome::Watching(result));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    // A sprite that is not running is not a transport
                    // failure; reclassify and stop retrying.
                    let running = matches!(
                        self.provider.get_sprite(name).await.map(|s| s.status()),
                        Ok(SpriteStatus::Running)
                    );
                    if !running {
                        debug!(sprite = name, "sprite not running, settling to idle");
                        self.teardown(name).await;
                        self.publish_sync_status(name, SyncStatus::Idle, "");
                        return Ok(SyncOutcome::Idle);
                    }
                    warn!(sprite = name, attempt, error = %e, "sync attempt failed");
                    last_err = Some(e);
                    if attempt < self.tunables.max_attempts {
                        tokio::time::sleep(self.tunables.retry_unit * attempt).await;
                    }
                }
            }
        }

        let err = last_err.unwrap_or(SyncError::NoPaths(name.to_string()));
        self.teardown(name).await;
        self.publish_sync_status(name, SyncStatus::Error, &err.to_string());
        Err(err)
    }

    /// State-driven variant: paths and org come from the store.
    pub async fn restart_sync(&self, name: &str) -> Result<SyncOutcome, SyncError> {
        let sprite = self
            .store
            .get(name)?
            .ok_or_else(|| SyncError::UnknownSprite(name.to_string()))?;
        if !sprite.has_sync_paths() {
            return Err(SyncError::NoPaths(name.to_string()));
        }
        self.start_sync(name, &sprite.local_path, &sprite.remote_path, &sprite.org).await
    }

    /// Idempotent teardown ending at `sync_status = none`.
    pub async fn stop_sync(&self, name: &str) -> Result<(), SyncError> {
        self.teardown(name).await;
        self.publish_sync_status(name, SyncStatus::None, "");
        Ok(())
    }

    /// Teardown for a sprite that went to sleep: same steps, but the
    /// record settles at `idle` (not an error), with a single delta.
    pub async fn suspend_sync(&self, name: &str) {
        self.teardown(name).await;
        self.publish_sync_status(name, SyncStatus::Idle, "");
    }

    /// `stop_sync` followed by `start_sync` with the stored paths.
    pub async fn resync(&self, name: &str) -> Result<SyncOutcome, SyncError> {
        self.stop_sync(name).await?;
        self.restart_sync(name).await
    }

    /// Full recovery for a stuck or disconnected sync.
    pub async fn recover(&self, name: &str) {
        info!(sprite = name, "recovering sync");
        self.publish_sync_status(name, SyncStatus::Recovering, "");
        self.teardown(name).await;
        match self.restart_sync(name).await {
            Ok(SyncOutcome::Watching(_)) => info!(sprite = name, "recovery complete"),
            Ok(SyncOutcome::Idle) => info!(sprite = name, "recovery settled to idle"),
            Err(e) => {
                warn!(sprite = name, error = %e, "recovery failed");
                if e.is_fatal() {
                    self.publish_sync_status(name, SyncStatus::Error, &e.to_string());
                }
            }
        }
    }

    /// One pass through the pipeline.
    async fn run_attempt(
        &self,
        name: &str,
        local_path: &str,
        remote_path: &str,
        org: &str,
    ) -> Result<SyncStartResult, SyncError> {
        self.teardown(name).await;
        let death = self.proxies.new_death_channel(name);

        self.wake_sprite(name, org).await?;
        self.run_setup(name, org).await?;

        let port = ssh_port_for(name);
        process::kill_stale_listener(port).await;
        let proxy_pid = self.spawn_proxy(name, port)?;

        let alias = ssh_alias(name);
        let setup = async {
            self.wait_for_listener(name, port, &death).await?;
            self.transport.install_config(&alias, port).await?;
            self.test_transport(name, &alias, &death).await?;
            let ignores = collect_ignores(Path::new(local_path));
            let mutagen_id = self
                .engine
                .create(name, Path::new(local_path), &alias, remote_path, &ignores)
                .await?;
            Ok::<String, SyncError>(mutagen_id)
        }
        .await;

        let mutagen_id = match setup {
            Ok(id) => id,
            Err(e) => {
                self.kill_proxy(name).await;
                let _ = self.transport.remove_config(&alias).await;
                return Err(e);
            }
        };

        self.store.put_session(&SyncSession {
            sprite_name: name.to_string(),
            mutagen_id: mutagen_id.clone(),
            ssh_port: port,
            proxy_pid,
            ..Default::default()
        })?;

        Ok(SyncStartResult { mutagen_id, ssh_port: port, proxy_pid })
    }

    /// Ask the provider to bring the sprite to `running`, nudging it with
    /// a trivial exec per sub-attempt.
    async fn wake_sprite(&self, name: &str, org: &str) -> Result<(), SyncError> {
        let mut status = SpriteStatus::Unknown;
        for attempt in 1..=self.tunables.wake_attempts {
            status = self.provider.get_sprite(name).await?.status();
            if status == SpriteStatus::Running {
                return Ok(());
            }
            debug!(sprite = name, %status, attempt, "waking sprite");
            let mut req = sp_adapters::ExecRequest::new(name, &["true"]);
            req.org = org.to_string();
            let _ = self.provider.exec(&req).await;
            if attempt < self.tunables.wake_attempts {
                tokio::time::sleep(self.tunables.wake_delay).await;
            }
        }
        Err(SyncError::NotRunning { name: name.to_string(), status })
    }

    /// Step 5: the forwarded port must accept connections before the
    /// transport is configured. Aborts as soon as the proxy dies.
    async fn wait_for_listener(
        &self,
        name: &str,
        port: u16,
        death: &CancellationToken,
    ) -> Result<(), SyncError> {
        let deadline = tokio::time::Instant::now() + self.tunables.listen_deadline;
        loop {
            if death.is_cancelled() {
                return Err(self.proxy_died(name));
            }
            let connect = TcpStream::connect(("127.0.0.1", port));
            if let Ok(Ok(_)) =
                tokio::time::timeout(std::time::Duration::from_secs(1), connect).await
            {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(SyncError::ListenTimeout(port));
            }
            tokio::select! {
                _ = death.cancelled() => return Err(self.proxy_died(name)),
                _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
            }
        }
    }

    /// Step 7: prove the transport end to end, aborting on proxy death.
    async fn test_transport(
        &self,
        name: &str,
        alias: &str,
        death: &CancellationToken,
    ) -> Result<(), SyncError> {
        let mut last = String::new();
        for attempt in 1..=self.tunables.test_attempts {
            tokio::select! {
                _ = death.cancelled() => return Err(self.proxy_died(name)),
                result = self.transport.test(alias) => match result {
                    Ok(()) => return Ok(()),
                    Err(e) => {
                        debug!(sprite = name, attempt, error = %e, "transport test failed");
                        last = e.to_string();
                    }
                }
            }
            if attempt < self.tunables.test_attempts {
                tokio::select! {
                    _ = death.cancelled() => return Err(self.proxy_died(name)),
                    _ = tokio::time::sleep(self.tunables.test_delay) => {}
                }
            }
        }
        Err(SyncError::TransportFailed { attempts: self.tunables.test_attempts, last })
    }

    fn proxy_died(&self, name: &str) -> SyncError {
        SyncError::ProxyDied {
            name: name.to_string(),
            stderr: self.proxies.last_stderr(name),
        }
    }

    /// Teardown shared by every path: engine session, proxy, transport
    /// config, session row, in that order. Safe on absent resources.
    pub(crate) async fn teardown(&self, name: &str) {
        if let Err(e) = self.engine.terminate(name).await {
            debug!(sprite = name, error = %e, "engine terminate during teardown");
        }
        let session = self.store.get_session(name).ok().flatten();
        self.kill_proxy(name).await;
        if let Some(row) = session {
            // A proxy from a previous daemon run is not in the table but
            // may still hold the port.
            if row.proxy_pid != 0 && process::pid_alive(row.proxy_pid) {
                process::terminate_with_grace(row.proxy_pid, self.tunables.kill_grace).await;
            }
        }
        let _ = self.transport.remove_config(&ssh_alias(name)).await;
        let _ = self.store.delete_session(name);
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
