// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;
use std::time::Duration;

use assert_cmd::assert::Assert;
use assert_cmd::Command;

pub const SPEC_POLL_INTERVAL_MS: u64 = 25;
pub const SPEC_WAIT_MAX_MS: u64 = 5000;

/// One isolated daemon world: its own config dir, socket, database.
pub struct Sandbox {
    dir: tempfile::TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Sandbox { dir: tempfile::tempdir().expect("tempdir") }
    }

    pub fn config_dir(&self) -> &Path {
        self.dir.path()
    }

    /// A configured `sp` command.
    pub fn sp(&self) -> Command {
        let mut cmd = Command::cargo_bin("sp").expect("sp binary");
        cmd.env("SP_CONFIG_DIR", self.dir.path());
        cmd.env("SP_SSH_DIR", self.dir.path().join("ssh"));
        cmd.env("SP_DAEMON_BINARY", assert_cmd::cargo::cargo_bin("spd"));
        // No real provider in CI: point the reachability probe at a
        // closed local port so it fails fast and quietly.
        cmd.env("SP_API_BASE", "http://127.0.0.1:1");
        cmd.env("SP_IPC_TIMEOUT_MS", "10000");
        cmd
    }

    pub fn start_daemon(&self) {
        self.sp().args(["daemon", "start"]).assert().success();
    }

    pub fn stop_daemon(&self) {
        let _ = self.sp().args(["daemon", "stop"]).output();
    }

    pub fn recorded_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.dir.path().join("sp.pid"))
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// Raw newline-JSON exchange on a fresh connection.
    pub fn rpc(&self, frame: serde_json::Value) -> serde_json::Value {
        let socket = self.dir.path().join("sp.sock");
        let mut stream = UnixStream::connect(&socket).expect("connect to daemon");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("set timeout");
        writeln!(stream, "{frame}").expect("write frame");
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).expect("read response");
        serde_json::from_str(line.trim()).expect("parse response")
    }

    /// Subscribe on a dedicated connection; returns a reader positioned
    /// after the acknowledgement (and the write half keeping it open).
    pub fn subscribe(&self) -> (BufReader<UnixStream>, UnixStream) {
        let socket = self.dir.path().join("sp.sock");
        let stream = UnixStream::connect(&socket).expect("connect to daemon");
        stream
            .set_read_timeout(Some(Duration::from_secs(10)))
            .expect("set timeout");
        let mut writer = stream.try_clone().expect("clone stream");
        writeln!(writer, "{}", serde_json::json!({"method": "subscribe"}))
            .expect("write subscribe");
        let mut reader = BufReader::new(stream);
        let mut ack = String::new();
        reader.read_line(&mut ack).expect("read ack");
        assert!(ack.contains("subscribed"), "unexpected ack: {ack}");
        (reader, writer)
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        self.stop_daemon();
    }
}

/// Captured stdout of a finished assertion.
pub fn stdout_of(assert: &Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stdout).into_owned()
}

/// Poll until `check` passes or the spec wait budget runs out.
pub fn wait_for(mut check: impl FnMut() -> bool) -> bool {
    let deadline =
        std::time::Instant::now() + Duration::from_millis(SPEC_WAIT_MAX_MS);
    while std::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(SPEC_POLL_INTERVAL_MS));
    }
    false
}
