// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use sp_core::{Sprite, SpriteStatus, SyncStatus};

/// Request from a client to the daemon.
///
/// The tag is the wire `method`; struct payloads ride in `params`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "method", content = "params", rename_all = "snake_case")]
pub enum Request {
    /// Health check; answers the literal `"pong"`.
    Ping,

    /// List sprites, optionally filtered.
    List(Option<ListParams>),

    /// Fetch one sprite by name.
    Get(NameParams),

    /// Register or merge a sprite record.
    Upsert(Sprite),

    /// Delete a sprite (cascades to tags and session rows). With
    /// `destroy`, the remote sprite is destroyed first.
    Delete(DeleteParams),

    Tag(TagParams),

    Untag(TagParams),

    GetTags(NameParams),

    /// Pull provider records into the store.
    Import(Option<ImportParams>),

    UpdateStatus(UpdateStatusParams),

    UpdateSyncStatus(UpdateSyncStatusParams),

    /// Bring a sprite to `watching`.
    StartSync(StartSyncParams),

    /// Tear a sync down; idempotent.
    StopSync(SpriteParams),

    /// `stop_sync` + `start_sync` with stored paths.
    Resync(SpriteParams),

    /// Run the SSH-server bootstrap on the sprite.
    RunSetup(SpriteParams),

    /// Graceful self-exec; the pid is preserved.
    Restart,

    /// Upgrade this connection to a delta stream. The acknowledgement is
    /// the last response frame on the connection.
    Subscribe,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ListParams {
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub path_prefix: String,
    #[serde(default)]
    pub name_contains: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NameParams {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeleteParams {
    pub name: String,
    #[serde(default)]
    pub destroy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TagParams {
    pub name: String,
    pub tag: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ImportParams {
    /// Import only these names; empty means every sprite the provider
    /// reports.
    #[serde(default)]
    pub names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateStatusParams {
    pub name: String,
    pub status: SpriteStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateSyncStatusParams {
    pub name: String,
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StartSyncParams {
    pub sprite_name: String,
    pub local_path: String,
    pub remote_path: String,
    #[serde(default)]
    pub org: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpriteParams {
    pub sprite_name: String,
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
