// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket-level tests: a real listener, real connections, fake tools.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::daemon::Daemon;

use super::test_daemon;

async fn start_listener(daemon: &Arc<Daemon>) -> std::path::PathBuf {
    let path = daemon.config.socket_path.clone();
    let listener = UnixListener::bind(&path).unwrap();
    let daemon = Arc::clone(daemon);
    tokio::spawn(super::run(listener, daemon));
    path
}

struct Client {
    reader: BufReader<tokio::net::unix::OwnedReadHalf>,
    writer: tokio::net::unix::OwnedWriteHalf,
}

impl Client {
    async fn connect(path: &std::path::Path) -> Self {
        let stream = UnixStream::connect(path).await.unwrap();
        let (read_half, writer) = stream.into_split();
        Client { reader: BufReader::new(read_half), writer }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, frame: Value) {
        self.send_raw(&frame.to_string()).await;
    }

    /// Read one frame; None on EOF.
    async fn read_frame(&mut self) -> Option<Value> {
        let mut line = String::new();
        let n = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            self.reader.read_line(&mut line),
        )
        .await
        .ok()?
        .ok()?;
        if n == 0 {
            return None;
        }
        serde_json::from_str(&line).ok()
    }

    async fn request(&mut self, frame: Value) -> Value {
        self.send(frame).await;
        self.read_frame().await.expect("response frame")
    }
}

#[tokio::test]
async fn ping_answers_pong() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    let resp = client.request(json!({"method": "ping"})).await;
    assert_eq!(resp, json!({"result": "pong"}));
}

#[tokio::test]
async fn upsert_get_and_list_round_trip_over_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    let resp = client
        .request(json!({"method": "upsert", "params": {
            "name": "demo", "org": "acme", "local_path": "/tmp/a"
        }}))
        .await;
    assert_eq!(resp["result"]["name"], "demo");

    let resp = client.request(json!({"method": "get", "params": {"name": "demo"}})).await;
    assert_eq!(resp["result"]["org"], "acme");
    assert_eq!(resp["result"]["local_path"], "/tmp/a");

    let resp = client.request(json!({"method": "list"})).await;
    assert_eq!(resp["result"].as_array().unwrap().len(), 1);

    let resp = client.request(json!({"method": "get", "params": {"name": "ghost"}})).await;
    assert!(resp["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn tags_round_trip_over_the_wire() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    client.request(json!({"method": "upsert", "params": {"name": "demo"}})).await;
    client
        .request(json!({"method": "tag", "params": {"name": "demo", "tag": "work"}}))
        .await;

    let resp =
        client.request(json!({"method": "get_tags", "params": {"name": "demo"}})).await;
    assert_eq!(resp["result"], json!(["work"]));

    client
        .request(json!({"method": "untag", "params": {"name": "demo", "tag": "work"}}))
        .await;
    let resp =
        client.request(json!({"method": "get_tags", "params": {"name": "demo"}})).await;
    assert_eq!(resp["result"], json!([]));
}

#[tokio::test]
async fn unknown_method_errors_but_keeps_the_connection() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    let resp = client.request(json!({"method": "levitate"})).await;
    assert!(resp["error"].as_str().unwrap().contains("levitate"));

    // The same connection still serves requests.
    let resp = client.request(json!({"method": "ping"})).await;
    assert_eq!(resp, json!({"result": "pong"}));
}

#[tokio::test]
async fn malformed_frame_closes_the_connection_silently() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    client.send_raw("this is not json").await;
    assert!(client.read_frame().await.is_none());

    // A frame that is valid JSON but not a request also closes.
    let mut client = Client::connect(&path).await;
    client.send_raw("[1, 2, 3]").await;
    assert!(client.read_frame().await.is_none());
}

#[tokio::test]
async fn responses_come_back_in_request_order() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    // Write several frames before reading anything.
    client.send(json!({"method": "upsert", "params": {"name": "a"}})).await;
    client.send(json!({"method": "upsert", "params": {"name": "b"}})).await;
    client.send(json!({"method": "get", "params": {"name": "a"}})).await;

    assert_eq!(client.read_frame().await.unwrap()["result"]["name"], "a");
    assert_eq!(client.read_frame().await.unwrap()["result"]["name"], "b");
    assert_eq!(client.read_frame().await.unwrap()["result"]["name"], "a");
}

#[tokio::test]
async fn subscriber_receives_deltas_for_mutations() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, ..) = test_daemon(dir.path());
    let path = start_listener(&daemon).await;

    let mut subscriber = Client::connect(&path).await;
    let ack = subscriber.request(json!({"method": "subscribe"})).await;
    assert_eq!(ack, json!({"result": "subscribed"}));

    let mut mutator = Client::connect(&path).await;
    mutator.request(json!({"method": "upsert", "params": {"name": "demo"}})).await;

    let delta = subscriber.read_frame().await.unwrap();
    assert_eq!(delta["type"], "sprite_added");
    assert_eq!(delta["sprite_name"], "demo");

    mutator
        .request(json!({"method": "update_sync_status", "params": {
            "name": "demo", "sync_status": "watching"
        }}))
        .await;
    let delta = subscriber.read_frame().await.unwrap();
    assert_eq!(delta["type"], "sync_status");
    assert_eq!(delta["sprite"]["sync_status"], "watching");

    // An unchanged write broadcasts nothing; the next deltas come from
    // delete (sync teardown to `none`, then the removal).
    mutator
        .request(json!({"method": "update_sync_status", "params": {
            "name": "demo", "sync_status": "watching"
        }}))
        .await;
    mutator.request(json!({"method": "delete", "params": {"name": "demo"}})).await;
    let delta = subscriber.read_frame().await.unwrap();
    assert_eq!(delta["type"], "sync_status");
    assert_eq!(delta["sprite"]["sync_status"], "none");
    let delta = subscriber.read_frame().await.unwrap();
    assert_eq!(delta["type"], "sprite_removed");
}

#[tokio::test]
async fn import_applies_the_gh_inference() {
    let dir = tempfile::tempdir().unwrap();
    let (daemon, provider, ..) = test_daemon(dir.path());
    provider.add_sprite("gh-acme--widgets", "running");
    provider.add_sprite("plain", "warm");
    let path = start_listener(&daemon).await;

    let mut client = Client::connect(&path).await;
    let resp = client.request(json!({"method": "import"})).await;
    let imported = resp["result"].as_array().unwrap();
    assert_eq!(imported.len(), 2);

    let resp = client
        .request(json!({"method": "get", "params": {"name": "gh-acme--widgets"}}))
        .await;
    assert_eq!(resp["result"]["repo"], "acme/widgets");
    assert_eq!(resp["result"]["remote_path"], "/home/sprite/widgets");
    assert_eq!(resp["result"]["status"], "running");

    let resp = client.request(json!({"method": "get", "params": {"name": "plain"}})).await;
    assert_eq!(resp["result"]["repo"], "");
    assert_eq!(resp["result"]["status"], "warm");
}
