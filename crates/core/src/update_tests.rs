// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn update_serializes_with_a_type_field() {
    let update = StateUpdate::removed("demo");
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["type"], "sprite_removed");
    assert_eq!(json["sprite_name"], "demo");
    // Removed frames omit the sprite body entirely.
    assert!(json.get("sprite").is_none());
}

#[test]
fn status_update_carries_the_post_change_record() {
    let mut sprite = Sprite::named("demo");
    sprite.sync_status = crate::SyncStatus::Watching;
    let update = StateUpdate::sync_status(sprite.clone());
    let json = serde_json::to_value(&update).unwrap();
    assert_eq!(json["type"], "sync_status");
    assert_eq!(json["sprite"]["sync_status"], "watching");

    let back: StateUpdate = serde_json::from_value(json).unwrap();
    assert_eq!(back.sprite, Some(sprite));
}
