// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-sprite sync-session bookkeeping.

use serde::{Deserialize, Serialize};

/// Transport bookkeeping for one active sync, keyed 1:1 by sprite name.
///
/// Created when a sync reaches `watching`, deleted on teardown. The
/// `proxy_pid` is the supervising forwarding process; the health monitor
/// verifies it is alive within one tick (signal-0).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSession {
    pub sprite_name: String,
    /// Sync-engine session identifier.
    pub mutagen_id: String,
    /// Local TCP port the proxy forwards, deterministic from the name.
    pub ssh_port: u16,
    pub proxy_pid: u32,
    #[serde(default)]
    pub alpha_connected: bool,
    #[serde(default)]
    pub beta_connected: bool,
    /// Outstanding conflicts reported by the engine.
    #[serde(default)]
    pub conflicts: u32,
    #[serde(default)]
    pub last_error: String,
}
