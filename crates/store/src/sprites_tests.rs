// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use sp_core::{Sprite, SpriteStatus, SyncStatus};

use crate::{ListFilter, Store};

fn store() -> Store {
    Store::open_in_memory().unwrap()
}

fn sprite(name: &str) -> Sprite {
    Sprite::named(name)
}

#[test]
fn upsert_then_get_round_trips_set_fields() {
    let store = store();
    let mut s = sprite("demo");
    s.id = "spr_123".into();
    s.url = "https://demo.sprites.dev".into();
    s.local_path = "/tmp/a".into();
    s.remote_path = "/home/sprite/a".into();
    s.org = "acme".into();
    s.status = SpriteStatus::Running;

    let (persisted, inserted) = store.upsert(&s).unwrap();
    assert!(inserted);
    assert!(persisted.created_at.is_some());

    let got = store.get("demo").unwrap().unwrap();
    assert_eq!(got.id, "spr_123");
    assert_eq!(got.url, "https://demo.sprites.dev");
    assert_eq!(got.local_path, "/tmp/a");
    assert_eq!(got.remote_path, "/home/sprite/a");
    assert_eq!(got.org, "acme");
    assert_eq!(got.status, SpriteStatus::Running);
    assert_eq!(got.sync_status, SyncStatus::None);
}

#[test]
fn merge_preserves_fields_the_incoming_record_left_empty() {
    let store = store();
    let mut first = sprite("demo");
    first.id = "spr_123".into();
    first.local_path = "/tmp/a".into();
    store.upsert(&first).unwrap();

    // A reconciliation pass that only knows the URL must not wipe the rest.
    let mut second = sprite("demo");
    second.url = "https://demo.sprites.dev".into();
    let (merged, inserted) = store.upsert(&second).unwrap();
    assert!(!inserted);
    assert_eq!(merged.id, "spr_123");
    assert_eq!(merged.local_path, "/tmp/a");
    assert_eq!(merged.url, "https://demo.sprites.dev");
}

#[test]
fn merge_refuses_status_downgrades_to_dont_know_tokens() {
    let store = store();
    let mut s = sprite("demo");
    s.status = SpriteStatus::Running;
    s.sync_status = SyncStatus::Watching;
    store.upsert(&s).unwrap();

    let bare = sprite("demo");
    let (merged, _) = store.upsert(&bare).unwrap();
    assert_eq!(merged.status, SpriteStatus::Running);
    assert_eq!(merged.sync_status, SyncStatus::Watching);

    // A real transition still lands.
    let mut cold = sprite("demo");
    cold.status = SpriteStatus::Cold;
    let (merged, _) = store.upsert(&cold).unwrap();
    assert_eq!(merged.status, SpriteStatus::Cold);
}

#[test]
fn upsert_advances_last_seen_and_updated_at() {
    let store = store();
    let (first, _) = store.upsert(&sprite("demo")).unwrap();
    let (second, _) = store.upsert(&sprite("demo")).unwrap();
    assert!(second.last_seen >= first.last_seen);
    assert!(second.updated_at >= first.updated_at);
    assert_eq!(second.created_at, first.created_at);
}

#[test]
fn set_sync_status_reports_whether_anything_changed() {
    let store = store();
    store.upsert(&sprite("demo")).unwrap();

    let (s, changed) = store.set_sync_status("demo", SyncStatus::Connecting, "").unwrap();
    assert!(changed);
    assert_eq!(s.sync_status, SyncStatus::Connecting);

    let (_, changed) = store.set_sync_status("demo", SyncStatus::Connecting, "").unwrap();
    assert!(!changed);

    // Teardown writes the explicit `none`; setters are not merges.
    let (s, changed) = store.set_sync_status("demo", SyncStatus::None, "").unwrap();
    assert!(changed);
    assert_eq!(s.sync_status, SyncStatus::None);
}

#[test]
fn set_status_on_missing_sprite_is_not_found() {
    let store = store();
    let err = store.set_status("ghost", SpriteStatus::Running).unwrap_err();
    assert!(matches!(err, crate::StoreError::NotFound(_)));
}

#[test]
fn list_filters_by_tag_path_and_name() {
    let store = store();
    for (name, path) in
        [("api", "/src/api"), ("web", "/src/web"), ("gh-acme--docs", "/docs/site")]
    {
        let mut s = sprite(name);
        s.local_path = path.into();
        store.upsert(&s).unwrap();
    }
    store.tag("api", "backend").unwrap();
    store.tag("web", "frontend").unwrap();

    let by_tag = store
        .list(&ListFilter { tags: vec!["backend".into()], ..Default::default() })
        .unwrap();
    assert_eq!(by_tag.len(), 1);
    assert_eq!(by_tag[0].name, "api");

    let by_path = store
        .list(&ListFilter { path_prefix: "/src".into(), ..Default::default() })
        .unwrap();
    assert_eq!(by_path.len(), 2);

    let by_name = store
        .list(&ListFilter { name_contains: "acme".into(), ..Default::default() })
        .unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].name, "gh-acme--docs");

    let all = store.list(&ListFilter::default()).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn list_orders_by_most_recent_update() {
    let store = store();
    store.upsert(&sprite("old")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.upsert(&sprite("new")).unwrap();
    std::thread::sleep(std::time::Duration::from_millis(5));
    store.upsert(&sprite("old")).unwrap();

    let all = store.list(&ListFilter::default()).unwrap();
    assert_eq!(all[0].name, "old");
    assert_eq!(all[1].name, "new");
}

#[test]
fn delete_cascades_to_tags_and_sessions() {
    let store = store();
    store.upsert(&sprite("demo")).unwrap();
    store.tag("demo", "t").unwrap();
    store
        .put_session(&sp_core::SyncSession {
            sprite_name: "demo".into(),
            mutagen_id: "sync_1".into(),
            ssh_port: 12345,
            proxy_pid: 4321,
            ..Default::default()
        })
        .unwrap();

    assert!(store.delete("demo").unwrap());
    assert!(store.get("demo").unwrap().is_none());
    assert!(store.get_tags("demo").unwrap().is_empty());
    assert!(store.get_session("demo").unwrap().is_none());

    // Second delete is a no-op.
    assert!(!store.delete("demo").unwrap());
}

proptest! {
    // Once a field is set to a non-empty value, no later upsert with an
    // empty field may clear it.
    #[test]
    fn nonempty_fields_never_regress_to_empty(urls in proptest::collection::vec("[a-z]{0,8}", 1..8)) {
        let store = store();
        let mut last_nonempty = String::new();
        for url in &urls {
            let mut s = sprite("demo");
            s.url = url.clone();
            let (merged, _) = store.upsert(&s).unwrap();
            if !url.is_empty() {
                last_nonempty = url.clone();
            }
            prop_assert_eq!(&merged.url, &last_nonempty);
        }
    }
}
