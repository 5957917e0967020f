// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed provider adapter.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{ExecRequest, Provider, ProviderError, RemoteSprite};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Provider adapter invoking the `sprite` CLI.
#[derive(Clone)]
pub struct SpriteCli {
    api_base: String,
    http: reqwest::Client,
}

impl SpriteCli {
    pub fn new(api_base: impl Into<String>) -> Self {
        SpriteCli { api_base: api_base.into(), http: reqwest::Client::new() }
    }
}

impl Default for SpriteCli {
    fn default() -> Self {
        SpriteCli::new("https://api.sprites.dev")
    }
}

/// Run a `sprite` subcommand to completion, mapping a missing binary to
/// its own error kind (local prerequisite; never retried).
async fn run(operation: &str, args: &[&str]) -> Result<String, ProviderError> {
    debug!(operation, ?args, "sprite invocation");
    let output = Command::new("sprite")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProviderError::MissingBinary(e),
            _ => ProviderError::Io(e),
        })?;

    if !output.status.success() {
        return Err(ProviderError::CommandFailed {
            operation: operation.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl Provider for SpriteCli {
    async fn list_sprites(&self) -> Result<Vec<RemoteSprite>, ProviderError> {
        let stdout = run("api /sprites", &["api", "/sprites"]).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn get_sprite(&self, name: &str) -> Result<RemoteSprite, ProviderError> {
        let stdout = run("api", &["api", "-s", name, "/"]).await?;
        Ok(serde_json::from_str(&stdout)?)
    }

    async fn create_sprite(&self, name: &str) -> Result<(), ProviderError> {
        run("create", &["create", "-skip-console", name]).await.map(|_| ())
    }

    async fn destroy_sprite(&self, name: &str) -> Result<(), ProviderError> {
        run("destroy", &["destroy", name]).await.map(|_| ())
    }

    async fn exec(&self, req: &ExecRequest) -> Result<String, ProviderError> {
        let mut args: Vec<String> = vec!["exec".into()];
        if !req.org.is_empty() {
            args.push("-o".into());
            args.push(req.org.clone());
        }
        if !req.name.is_empty() {
            args.push("-s".into());
            args.push(req.name.clone());
        }
        if req.tty {
            args.push("-tty".into());
        }
        if !req.env.is_empty() {
            let pairs: Vec<String> =
                req.env.iter().map(|(k, v)| format!("{k}={v}")).collect();
            args.push("-env".into());
            args.push(pairs.join(","));
        }
        if let Some((local, remote)) = &req.file {
            args.push("-file".into());
            args.push(format!("{}:{}", local.display(), remote));
        }
        args.extend(req.command.iter().cloned());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        run("exec", &arg_refs).await
    }

    fn proxy_command(&self, name: &str, local_port: u16) -> Command {
        let mut cmd = Command::new("sprite");
        cmd.args(["proxy", "-s", name, &format!("{local_port}:22")]);
        cmd
    }

    async fn reachable(&self) -> bool {
        let url = format!("{}/", self.api_base.trim_end_matches('/'));
        match self.http.get(&url).timeout(PROBE_TIMEOUT).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
