// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscription specs: deltas stream to connected dashboards.

use std::io::BufRead;

use serde_json::json;
use serial_test::serial;

use super::prelude::*;

#[test]
#[serial]
fn subscriber_receives_deltas_in_mutation_order() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();

    let (mut reader, _writer) = sandbox.subscribe();

    sandbox.rpc(json!({"method": "upsert", "params": {"name": "demo"}}));
    sandbox.rpc(json!({"method": "update_sync_status", "params": {
        "name": "demo", "sync_status": "watching"
    }}));

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let delta: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(delta["type"], "sprite_added");
    assert_eq!(delta["sprite_name"], "demo");

    line.clear();
    reader.read_line(&mut line).unwrap();
    let delta: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
    assert_eq!(delta["type"], "sync_status");
    assert_eq!(delta["sprite"]["sync_status"], "watching");
}

#[test]
#[serial]
fn unchanged_writes_produce_no_delta() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    sandbox.rpc(json!({"method": "upsert", "params": {"name": "demo"}}));

    let (mut reader, _writer) = sandbox.subscribe();

    // Same status twice: only the first write changes anything.
    sandbox.rpc(json!({"method": "update_sync_status", "params": {
        "name": "demo", "sync_status": "idle"
    }}));
    sandbox.rpc(json!({"method": "update_sync_status", "params": {
        "name": "demo", "sync_status": "idle"
    }}));
    sandbox.rpc(json!({"method": "delete", "params": {"name": "demo"}}));

    let mut kinds = Vec::new();
    let mut line = String::new();
    // Read until the removal lands; everything before it is the single
    // idle delta plus the teardown-to-none delta from delete.
    loop {
        line.clear();
        if reader.read_line(&mut line).unwrap() == 0 {
            break;
        }
        let delta: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        kinds.push((
            delta["type"].as_str().unwrap().to_string(),
            delta["sprite"]["sync_status"].as_str().unwrap_or_default().to_string(),
        ));
        if delta["type"] == "sprite_removed" {
            break;
        }
    }
    assert_eq!(
        kinds,
        vec![
            ("sync_status".to_string(), "idle".to_string()),
            ("sync_status".to_string(), "none".to_string()),
            ("sprite_removed".to_string(), String::new()),
        ]
    );
}
