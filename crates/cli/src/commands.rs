// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subcommand implementations.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use sp_core::Sprite;
use tokio::io::AsyncBufReadExt;

use crate::client::{daemon_binary, DaemonClient};

pub async fn list(
    tags: Vec<String>,
    path: Option<String>,
    name: Option<String>,
    json_output: bool,
) -> Result<()> {
    let client = DaemonClient::new()?;
    let params = json!({
        "tags": tags,
        "path_prefix": path.unwrap_or_default(),
        "name_contains": name.unwrap_or_default(),
    });
    let result = client.request_ensuring("list", Some(params)).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    let sprites: Vec<Sprite> = serde_json::from_value(result)?;
    if sprites.is_empty() {
        println!("no sprites");
        return Ok(());
    }
    println!("{:<24} {:<10} {:<13} {}", "NAME", "STATUS", "SYNC", "LOCAL PATH");
    for sprite in sprites {
        println!(
            "{:<24} {:<10} {:<13} {}",
            sprite.name, sprite.status, sprite.sync_status, sprite.local_path
        );
    }
    Ok(())
}

pub async fn get(name: &str, json_output: bool) -> Result<()> {
    let client = DaemonClient::new()?;
    let result = client.request_ensuring("get", Some(json!({ "name": name }))).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    let sprite: Sprite = serde_json::from_value(result)?;
    println!("name:        {}", sprite.name);
    println!("status:      {}", sprite.status);
    println!("sync:        {}", sprite.sync_status);
    if !sprite.sync_error.is_empty() {
        println!("sync error:  {}", sprite.sync_error);
    }
    println!("local path:  {}", sprite.local_path);
    println!("remote path: {}", sprite.remote_path);
    println!("org:         {}", sprite.org);
    if !sprite.repo.is_empty() {
        println!("repo:        {}", sprite.repo);
    }
    if !sprite.url.is_empty() {
        println!("url:         {}", sprite.url);
    }
    Ok(())
}

pub async fn sync(
    name: &str,
    local: Option<PathBuf>,
    remote: Option<String>,
    org: Option<String>,
    json_output: bool,
) -> Result<()> {
    let client = DaemonClient::new()?;
    client.ensure_running().await?;

    // Fill defaults from the stored record where flags were omitted.
    let stored: Option<Sprite> = match client.request("get", Some(json!({ "name": name }))).await
    {
        Ok(value) => serde_json::from_value(value).ok(),
        Err(_) => None,
    };

    let local = match local {
        Some(local) => local,
        None => match stored.as_ref().filter(|s| !s.local_path.is_empty()) {
            Some(s) => PathBuf::from(&s.local_path),
            None => std::env::current_dir()?,
        },
    };
    let local = local
        .canonicalize()
        .with_context(|| format!("local path does not exist: {}", local.display()))?;
    let remote = remote
        .or_else(|| stored.as_ref().map(|s| s.remote_path.clone()).filter(|p| !p.is_empty()))
        .unwrap_or_else(|| format!("/home/sprite/{name}"));
    let org = org
        .or_else(|| stored.as_ref().map(|s| s.org.clone()).filter(|o| !o.is_empty()))
        .unwrap_or_default();

    let result = client
        .request(
            "start_sync",
            Some(json!({
                "sprite_name": name,
                "local_path": local.display().to_string(),
                "remote_path": remote,
                "org": org,
            })),
        )
        .await?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if result.get("status").and_then(Value::as_str) == Some("idle") {
        println!("{name}: sprite is asleep, sync is idle");
    } else {
        println!(
            "{name}: watching (port {}, session {})",
            result["ssh_port"], result["mutagen_id"]
        );
    }
    Ok(())
}

pub async fn stop(name: &str) -> Result<()> {
    let client = DaemonClient::new()?;
    client.request_ensuring("stop_sync", Some(json!({ "sprite_name": name }))).await?;
    println!("{name}: sync stopped");
    Ok(())
}

pub async fn resync(name: &str, json_output: bool) -> Result<()> {
    let client = DaemonClient::new()?;
    let result =
        client.request_ensuring("resync", Some(json!({ "sprite_name": name }))).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{name}: resynced");
    }
    Ok(())
}

pub async fn setup(name: &str) -> Result<()> {
    let client = DaemonClient::new()?;
    client.request_ensuring("run_setup", Some(json!({ "sprite_name": name }))).await?;
    println!("{name}: ssh server ready");
    Ok(())
}

pub async fn tag(name: &str, tag: &str) -> Result<()> {
    let client = DaemonClient::new()?;
    client
        .request_ensuring("tag", Some(json!({ "name": name, "tag": tag })))
        .await?;
    Ok(())
}

pub async fn untag(name: &str, tag: &str) -> Result<()> {
    let client = DaemonClient::new()?;
    client
        .request_ensuring("untag", Some(json!({ "name": name, "tag": tag })))
        .await?;
    Ok(())
}

pub async fn tags(name: &str) -> Result<()> {
    let client = DaemonClient::new()?;
    let result = client.request_ensuring("get_tags", Some(json!({ "name": name }))).await?;
    for tag in result.as_array().map(Vec::as_slice).unwrap_or_default() {
        if let Some(tag) = tag.as_str() {
            println!("{tag}");
        }
    }
    Ok(())
}

pub async fn import(names: Vec<String>, json_output: bool) -> Result<()> {
    let client = DaemonClient::new()?;
    let result = client.request_ensuring("import", Some(json!({ "names": names }))).await?;
    if json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }
    let sprites: Vec<Sprite> = serde_json::from_value(result)?;
    println!("imported {} sprite(s)", sprites.len());
    for sprite in sprites {
        println!("  {}", sprite.name);
    }
    Ok(())
}

pub async fn delete(name: &str, destroy: bool) -> Result<()> {
    let client = DaemonClient::new()?;
    let result = client
        .request_ensuring("delete", Some(json!({ "name": name, "destroy": destroy })))
        .await?;
    if result.get("deleted").and_then(Value::as_bool) == Some(true) {
        println!("{name}: deleted");
    } else {
        println!("{name}: no such sprite");
    }
    Ok(())
}

pub async fn watch() -> Result<()> {
    let client = DaemonClient::new()?;
    let mut reader = client.subscribe().await?;
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            bail!("daemon closed the subscription");
        }
        print!("{line}");
    }
}

pub async fn ping() -> Result<()> {
    let client = DaemonClient::new()?;
    client.request("ping", None).await?;
    println!("pong");
    Ok(())
}

pub async fn daemon_start(foreground: bool) -> Result<()> {
    if foreground {
        let binary = daemon_binary()?;
        let status = std::process::Command::new(&binary).status()?;
        if !status.success() {
            bail!("daemon exited with {status}");
        }
        return Ok(());
    }
    let client = DaemonClient::new()?;
    if client.request("ping", None).await.is_ok() {
        println!("daemon already running");
        return Ok(());
    }
    client.ensure_running().await?;
    println!("daemon started");
    Ok(())
}

pub async fn daemon_stop() -> Result<()> {
    let client = DaemonClient::new()?;
    let Some(pid) = client.recorded_pid() else {
        println!("daemon not running");
        return Ok(());
    };
    if nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_err() {
        println!("daemon not running");
        return Ok(());
    }

    nix::sys::signal::kill(
        nix::unistd::Pid::from_raw(pid as i32),
        nix::sys::signal::Signal::SIGTERM,
    )
    .context("cannot signal daemon")?;

    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_err() {
            println!("daemon stopped");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    bail!("daemon (pid {pid}) did not stop within 5s")
}

pub async fn daemon_status() -> Result<()> {
    let client = DaemonClient::new()?;
    match client.request("ping", None).await {
        Ok(_) => {
            match client.recorded_pid() {
                Some(pid) => println!("daemon running (pid {pid})"),
                None => println!("daemon running"),
            }
            Ok(())
        }
        Err(_) => {
            println!("daemon not running");
            Ok(())
        }
    }
}

pub async fn daemon_restart() -> Result<()> {
    let client = DaemonClient::new()?;
    client.request_ensuring("restart", None).await?;
    println!("daemon restarting");
    Ok(())
}

pub fn daemon_logs(limit: usize) -> Result<()> {
    let client = DaemonClient::new()?;
    let content = match std::fs::read_to_string(client.log_path()) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            println!("no log file yet");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(limit);
    for line in &lines[start..] {
        println!("{line}");
    }
    Ok(())
}
