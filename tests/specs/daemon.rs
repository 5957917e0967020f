// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle specs: singleton, ping, stop, graceful restart.

use serial_test::serial;

use super::prelude::*;

#[test]
#[serial]
fn daemon_starts_pings_and_stops() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();

    let ping = sandbox.sp().arg("ping").assert().success();
    assert!(stdout_of(&ping).contains("pong"));

    let status = sandbox.sp().args(["daemon", "status"]).assert().success();
    assert!(stdout_of(&status).contains("running"));

    let pid = sandbox.recorded_pid().expect("pid file");
    assert!(pid > 0);

    sandbox.sp().args(["daemon", "stop"]).assert().success();
    assert!(wait_for(|| sandbox.recorded_pid().is_none()), "pid file should be removed");
}

#[test]
#[serial]
fn second_start_is_a_noop() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    let first_pid = sandbox.recorded_pid().unwrap();

    let second = sandbox.sp().args(["daemon", "start"]).assert().success();
    assert!(stdout_of(&second).contains("already running"));
    assert_eq!(sandbox.recorded_pid().unwrap(), first_pid);
}

#[test]
#[serial]
fn graceful_restart_preserves_pid_identity() {
    let sandbox = Sandbox::new();
    sandbox.start_daemon();
    let pid_before = sandbox.recorded_pid().unwrap();

    sandbox.sp().args(["daemon", "restart"]).assert().success();

    // Transient connection failures are acceptable while the successor
    // rebinds; it must come back answering ping with the same pid.
    let came_back = wait_for(|| {
        sandbox
            .sp()
            .arg("ping")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    });
    assert!(came_back, "daemon never answered after restart");

    // The pid file never named anyone else: exec preserves the pid.
    assert_eq!(sandbox.recorded_pid().unwrap(), pid_before);
}
