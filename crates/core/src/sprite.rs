// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sprite record: identity and last-observed state of a remote sandbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{SpriteStatus, SyncStatus};

/// A remote, on-demand developer sandbox, keyed by its stable `name`.
///
/// Records are created by explicit register/import, mutated only by the
/// daemon, and removed on explicit delete (tags and session rows cascade).
/// Empty strings mean "not observed yet"; the store's merge never lets an
/// empty value clobber a populated one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub name: String,
    /// Provider-assigned identifier.
    #[serde(default)]
    pub id: String,
    /// Public URL of the sprite.
    #[serde(default)]
    pub url: String,
    /// Absolute local directory being synced; empty when never synced.
    #[serde(default)]
    pub local_path: String,
    /// Directory on the sprite being synced.
    #[serde(default)]
    pub remote_path: String,
    /// Owning organization.
    #[serde(default)]
    pub org: String,
    /// Source repository, when known (e.g. inferred at import).
    #[serde(default)]
    pub repo: String,
    #[serde(default)]
    pub status: SpriteStatus,
    #[serde(default)]
    pub sync_status: SyncStatus,
    /// Terminal message from the last failed sync attempt.
    #[serde(default)]
    pub sync_error: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Sprite {
    /// A bare record carrying only identity.
    pub fn named(name: impl Into<String>) -> Self {
        Sprite { name: name.into(), ..Sprite::default() }
    }

    /// Whether the record knows both ends of a sync pair.
    pub fn has_sync_paths(&self) -> bool {
        !self.local_path.is_empty() && !self.remote_path.is_empty()
    }
}
