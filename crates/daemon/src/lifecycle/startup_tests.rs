// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serial_test::serial;

use crate::env::REEXEC_ENV;
use crate::lifecycle::{Config, LifecycleError};

use super::startup;

#[tokio::test]
#[serial]
async fn startup_claims_pid_file_and_socket() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    let result = startup(config.clone()).await.unwrap();
    let recorded = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(recorded.trim().parse::<u32>().unwrap(), std::process::id());
    assert!(config.socket_path.exists());
    drop(result);
}

#[tokio::test]
#[serial]
async fn refuses_to_start_over_a_live_daemon() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    // A live process that is not us, standing in for a running daemon.
    let mut child = tokio::process::Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id().unwrap();
    std::fs::write(&config.pid_path, format!("{pid}\n")).unwrap();

    let err = startup(config).await.unwrap_err();
    assert!(matches!(err, LifecycleError::AlreadyRunning(p) if p == pid));

    child.kill().await.unwrap();
}

#[tokio::test]
#[serial]
async fn stale_or_garbage_pid_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());
    std::fs::write(&config.pid_path, "4000000000\n").unwrap();
    startup(config).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());
    std::fs::write(&config.pid_path, "not a pid\n").unwrap();
    startup(config).await.unwrap();
}

#[tokio::test]
#[serial]
async fn reexec_successor_skips_the_liveness_probe() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    let mut child = tokio::process::Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id().unwrap();
    std::fs::write(&config.pid_path, format!("{pid}\n")).unwrap();

    std::env::set_var(REEXEC_ENV, "1");
    let result = startup(config.clone()).await;
    std::env::remove_var(REEXEC_ENV);
    result.unwrap();

    // The pid file now names this process.
    let recorded = std::fs::read_to_string(&config.pid_path).unwrap();
    assert_eq!(recorded.trim().parse::<u32>().unwrap(), std::process::id());

    child.kill().await.unwrap();
}

#[tokio::test]
#[serial]
async fn surviving_sessions_with_dead_proxies_are_marked_disconnected() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::for_dir(dir.path());

    // A previous run left a session row behind.
    {
        let store = sp_store::Store::open(&config.db_path).unwrap();
        store.upsert(&sp_core::Sprite::named("demo")).unwrap();
        store
            .set_sync_status("demo", sp_core::SyncStatus::Watching, "")
            .unwrap();
        store
            .put_session(&sp_core::SyncSession {
                sprite_name: "demo".into(),
                mutagen_id: "sync_1".into(),
                ssh_port: 23456,
                proxy_pid: 4_000_000_000,
                ..Default::default()
            })
            .unwrap();
    }

    let result = startup(config).await.unwrap();
    let sprite = result.daemon.store.get("demo").unwrap().unwrap();
    assert_eq!(sprite.sync_status, sp_core::SyncStatus::Disconnected);
    assert!(sprite.sync_error.contains("did not survive"));
}
