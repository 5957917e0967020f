// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: socket addressing, ensure-running, framed requests.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

pub struct DaemonClient {
    config_dir: PathBuf,
}

impl DaemonClient {
    pub fn new() -> Result<Self> {
        Ok(DaemonClient { config_dir: config_dir()? })
    }

    pub fn socket_path(&self) -> PathBuf {
        self.config_dir.join("sp.sock")
    }

    pub fn pid_path(&self) -> PathBuf {
        self.config_dir.join("sp.pid")
    }

    pub fn log_path(&self) -> PathBuf {
        self.config_dir.join("sp.log")
    }

    pub fn recorded_pid(&self) -> Option<u32> {
        std::fs::read_to_string(self.pid_path())
            .ok()
            .and_then(|content| content.trim().parse().ok())
    }

    /// One request/response exchange. Fails if the daemon is not up.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let stream = UnixStream::connect(self.socket_path())
            .await
            .context("daemon is not running (try `sp daemon start`)")?;
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        let frame = json!({ "method": method, "params": params });
        let mut bytes = frame.to_string().into_bytes();
        bytes.push(b'\n');
        writer.write_all(&bytes).await?;

        let mut line = String::new();
        let n = tokio::time::timeout(ipc_timeout(), reader.read_line(&mut line))
            .await
            .context("daemon did not answer in time")??;
        if n == 0 {
            bail!("daemon closed the connection");
        }
        let response: Value = serde_json::from_str(line.trim())
            .with_context(|| format!("unparseable response: {line}"))?;
        if let Some(error) = response.get("error").and_then(Value::as_str) {
            bail!("{error}");
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| anyhow!("response carries neither result nor error"))
    }

    /// Like `request`, but starts the daemon first if needed.
    pub async fn request_ensuring(&self, method: &str, params: Option<Value>) -> Result<Value> {
        self.ensure_running().await?;
        self.request(method, params).await
    }

    /// Connect-or-start: answerable ping, else spawn `spd` and wait.
    pub async fn ensure_running(&self) -> Result<()> {
        if self.request("ping", None).await.is_ok() {
            return Ok(());
        }

        let daemon_binary = daemon_binary()?;
        std::process::Command::new(&daemon_binary)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .with_context(|| format!("cannot start {}", daemon_binary.display()))?;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while tokio::time::Instant::now() < deadline {
            if self.request("ping", None).await.is_ok() {
                return Ok(());
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        bail!("daemon did not come up within 5s")
    }

    /// Upgrade a fresh connection to a delta stream; returns the line
    /// reader positioned after the acknowledgement.
    pub async fn subscribe(
        &self,
    ) -> Result<BufReader<tokio::net::unix::OwnedReadHalf>> {
        self.ensure_running().await?;
        let stream = UnixStream::connect(self.socket_path()).await?;
        let (read_half, mut writer) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        writer
            .write_all(b"{\"method\": \"subscribe\"}\n")
            .await?;
        let mut ack = String::new();
        reader.read_line(&mut ack).await?;
        if !ack.contains("subscribed") {
            bail!("unexpected subscribe acknowledgement: {ack}");
        }
        // The writer half must outlive the stream; leak it into the
        // connection by keeping it alongside the reader.
        tokio::spawn(async move {
            // Hold the write half open until the process exits.
            let _writer = writer;
            std::future::pending::<()>().await;
        });
        Ok(reader)
    }
}

/// SP_CONFIG_DIR > ~/.config/sp, matching the daemon.
fn config_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SP_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".config/sp"))
}

fn ipc_timeout() -> Duration {
    std::env::var("SP_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        // Control-plane calls run the whole attempt pipeline before
        // answering; leave them room.
        .unwrap_or(Duration::from_secs(300))
}

/// The daemon binary: SP_DAEMON_BINARY override, else `spd` next to the
/// running `sp`.
pub fn daemon_binary() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SP_DAEMON_BINARY") {
        return Ok(PathBuf::from(path));
    }
    let me = std::env::current_exe().context("cannot locate own executable")?;
    let dir = me.parent().context("executable has no parent directory")?;
    let candidate = dir.join("spd");
    if candidate.exists() {
        return Ok(candidate);
    }
    // Fall back to PATH resolution.
    Ok(PathBuf::from("spd"))
}
