// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process liveness probes and signal escalation.

use std::time::Duration;

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::debug;

/// A pid we can actually signal. Zero and values past `i32::MAX` would
/// address process groups after the raw cast; treat them as dead.
fn checked_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

/// Signal-0 probe: is the process alive (and visible to us)?
pub fn pid_alive(pid: u32) -> bool {
    checked_pid(pid).is_some_and(|p| kill(p, None).is_ok())
}

pub fn send_term(pid: u32) {
    if let Some(p) = checked_pid(pid) {
        let _ = kill(p, Signal::SIGTERM);
    }
}

pub fn send_kill(pid: u32) {
    if let Some(p) = checked_pid(pid) {
        let _ = kill(p, Signal::SIGKILL);
    }
}

/// SIGTERM, wait up to `grace` for the process to vanish, then SIGKILL.
pub async fn terminate_with_grace(pid: u32, grace: Duration) {
    if !pid_alive(pid) {
        return;
    }
    send_term(pid);
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    debug!(pid, "grace expired, sending SIGKILL");
    send_kill(pid);
}

/// Best-effort kill of whatever holds `port` from a previous run. Failures
/// (no lsof, nothing listening) are ignored.
pub async fn kill_stale_listener(port: u16) {
    let output = tokio::process::Command::new("lsof")
        .args(["-t", "-i", &format!(":{port}")])
        .output()
        .await;
    let Ok(output) = output else { return };
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        if let Ok(pid) = line.trim().parse::<u32>() {
            if pid != std::process::id() {
                debug!(pid, port, "killing stale listener");
                send_kill(pid);
            }
        }
    }
}
