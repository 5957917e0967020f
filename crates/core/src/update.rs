// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State deltas fanned out to subscribed dashboards.

use serde::{Deserialize, Serialize};

use crate::sprite::Sprite;

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    SpriteAdded,
    SpriteRemoved,
    SpriteStatus,
    SyncStatus,
}

/// One broadcast frame: `{"type", "sprite_name", "sprite"}`.
///
/// `sprite` is the post-change record, absent for removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(rename = "type")]
    pub kind: UpdateKind,
    pub sprite_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprite: Option<Sprite>,
}

impl StateUpdate {
    pub fn added(sprite: Sprite) -> Self {
        StateUpdate {
            kind: UpdateKind::SpriteAdded,
            sprite_name: sprite.name.clone(),
            sprite: Some(sprite),
        }
    }

    pub fn removed(name: impl Into<String>) -> Self {
        StateUpdate { kind: UpdateKind::SpriteRemoved, sprite_name: name.into(), sprite: None }
    }

    pub fn sprite_status(sprite: Sprite) -> Self {
        StateUpdate {
            kind: UpdateKind::SpriteStatus,
            sprite_name: sprite.name.clone(),
            sprite: Some(sprite),
        }
    }

    pub fn sync_status(sprite: Sprite) -> Self {
        StateUpdate {
            kind: UpdateKind::SyncStatus,
            sprite_name: sprite.name.clone(),
            sprite: Some(sprite),
        }
    }
}

#[cfg(test)]
#[path = "update_tests.rs"]
mod tests;
