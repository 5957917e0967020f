// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The daemon's working parts: sync lifecycle controller, proxy
//! supervisor, and health monitor.

pub mod backoff;
pub mod controller;
pub mod monitor;
pub mod proxy;
pub mod setup;

pub use controller::SyncOutcome;
pub use monitor::{Monitor, MonitorConfig};

use sp_adapters::{EngineError, ProviderError, TransportError};
use sp_core::SpriteStatus;
use std::time::Duration;
use thiserror::Error;

/// Timing knobs for the attempt pipeline. Defaults are the production
/// values; tests shrink them.
#[derive(Debug, Clone)]
pub struct SyncTunables {
    /// Cap on full pipeline attempts per `start_sync`.
    pub max_attempts: u32,
    /// Linear backoff unit between attempts (`attempt * unit`).
    pub retry_unit: Duration,
    /// Sub-attempts waking the sprite.
    pub wake_attempts: u32,
    pub wake_delay: Duration,
    /// How long the proxy gets to start listening.
    pub listen_deadline: Duration,
    /// Transport test retries and spacing.
    pub test_attempts: u32,
    pub test_delay: Duration,
    /// SIGTERM-to-SIGKILL grace for proxies.
    pub kill_grace: Duration,
}

impl Default for SyncTunables {
    fn default() -> Self {
        SyncTunables {
            max_attempts: 3,
            retry_unit: Duration::from_secs(2),
            wake_attempts: 5,
            wake_delay: Duration::from_secs(2),
            listen_deadline: Duration::from_secs(30),
            test_attempts: 10,
            test_delay: Duration::from_secs(1),
            kill_grace: Duration::from_secs(3),
        }
    }
}

/// Errors from the sync lifecycle.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sprite {name} is {status}, not running")]
    NotRunning { name: String, status: SpriteStatus },

    #[error("sprite {0} has no sync paths recorded")]
    NoPaths(String),

    #[error("sprite {0} is not registered")]
    UnknownSprite(String),

    #[error("no SSH public key found under ~/.ssh")]
    NoPublicKey,

    #[error("proxy for {name} exited: {stderr}")]
    ProxyDied { name: String, stderr: String },

    #[error("proxy port {0} never started listening")]
    ListenTimeout(u16),

    #[error("transport test failed after {attempts} attempts: {last}")]
    TransportFailed { attempts: u32, last: String },

    /// Invariant violation: a proxy is already tracked for this sprite.
    #[error("proxy already registered for {0}")]
    DuplicateProxy(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Store(#[from] sp_store::StoreError),
}

impl SyncError {
    /// Local-prerequisite failures are fatal for the operation and are
    /// never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SyncError::NoPublicKey
                | SyncError::NoPaths(_)
                | SyncError::UnknownSprite(_)
                | SyncError::Provider(ProviderError::MissingBinary(_))
                | SyncError::Engine(EngineError::MissingBinary(_))
                | SyncError::Transport(TransportError::MissingBinary(_))
        )
    }
}
