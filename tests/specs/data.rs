// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-plane specs over the real socket and CLI.

use serde_json::json;
use serial_test::serial;

use super::prelude::*;

#[test]
#[serial]
fn upsert_then_get_preserves_everything_that_was_set() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();

    let response = sandbox.rpc(json!({"method": "upsert", "params": {
        "name": "demo",
        "org": "acme",
        "local_path": "/tmp/demo",
        "remote_path": "/home/sprite/demo",
        "status": "running"
    }}));
    assert_eq!(response["result"]["name"], "demo");

    // A later partial write must not clear earlier fields.
    sandbox.rpc(json!({"method": "upsert", "params": {
        "name": "demo",
        "url": "https://demo.sprites.dev"
    }}));

    let response = sandbox.rpc(json!({"method": "get", "params": {"name": "demo"}}));
    let sprite = &response["result"];
    assert_eq!(sprite["org"], "acme");
    assert_eq!(sprite["local_path"], "/tmp/demo");
    assert_eq!(sprite["url"], "https://demo.sprites.dev");
    assert_eq!(sprite["status"], "running");
}

#[test]
#[serial]
fn tags_round_trip_through_the_cli() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    sandbox.rpc(json!({"method": "upsert", "params": {"name": "demo"}}));

    sandbox.sp().args(["tag", "demo", "work"]).assert().success();

    let tags = sandbox.sp().args(["tags", "demo"]).assert().success();
    assert!(stdout_of(&tags).contains("work"));

    sandbox.sp().args(["untag", "demo", "work"]).assert().success();

    let tags = sandbox.sp().args(["tags", "demo"]).assert().success();
    assert!(!stdout_of(&tags).contains("work"));
}

#[test]
#[serial]
fn list_filters_by_tag_and_name() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    for name in ["api", "web", "lab"] {
        sandbox.rpc(json!({"method": "upsert", "params": {"name": name}}));
    }
    sandbox.sp().args(["tag", "api", "backend"]).assert().success();

    let by_tag = sandbox.sp().args(["list", "--tag", "backend"]).assert().success();
    let listing = stdout_of(&by_tag);
    assert!(listing.contains("api"));
    assert!(!listing.contains("web"));

    let by_name = sandbox.sp().args(["list", "--name", "la"]).assert().success();
    let listing = stdout_of(&by_name);
    assert!(listing.contains("lab"));
    assert!(!listing.contains("api"));
}

#[test]
#[serial]
fn delete_removes_the_record_and_its_tags() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    sandbox.rpc(json!({"method": "upsert", "params": {"name": "demo"}}));
    sandbox.sp().args(["tag", "demo", "work"]).assert().success();

    let delete = sandbox.sp().args(["delete", "demo"]).assert().success();
    assert!(stdout_of(&delete).contains("deleted"));

    let response = sandbox.rpc(json!({"method": "get", "params": {"name": "demo"}}));
    assert!(response["error"].as_str().unwrap().contains("not found"));

    // Idempotent on the wire: a second delete reports nothing removed.
    let response =
        sandbox.rpc(json!({"method": "delete", "params": {"name": "demo"}}));
    assert_eq!(response["result"]["deleted"], false);
}

#[test]
#[serial]
fn unknown_method_gets_an_error_response() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    let response = sandbox.rpc(json!({"method": "levitate"}));
    assert!(response["error"].as_str().unwrap().contains("levitate"));
}
