// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed sync-engine adapter.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{parse, EngineError, EngineSession, SyncEngine};

/// Sync-engine adapter invoking the `mutagen` CLI.
#[derive(Clone, Default)]
pub struct MutagenCli;

impl MutagenCli {
    pub fn new() -> Self {
        Self
    }
}

async fn run(operation: &str, args: &[String]) -> Result<std::process::Output, EngineError> {
    debug!(operation, ?args, "mutagen invocation");
    Command::new("mutagen")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => EngineError::MissingBinary(e),
            _ => EngineError::Io(e),
        })
}

#[async_trait]
impl SyncEngine for MutagenCli {
    async fn create(
        &self,
        name: &str,
        local: &Path,
        alias: &str,
        remote_path: &str,
        ignores: &[String],
    ) -> Result<String, EngineError> {
        let mut args: Vec<String> = vec![
            "sync".into(),
            "create".into(),
            "--name".into(),
            name.into(),
            "--sync-mode".into(),
            "two-way-safe".into(),
        ];
        for pattern in ignores {
            args.push("--ignore".into());
            args.push(pattern.clone());
        }
        args.push(local.display().to_string());
        args.push(format!("{alias}:{remote_path}"));

        let output = run("sync create", &args).await?;
        if !output.status.success() {
            return Err(EngineError::CommandFailed {
                operation: "sync create".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse::parse_create_output(&stdout) {
            Some(id) => Ok(id),
            // Some engine versions print the id only in `sync list`.
            None => match self.inspect(name).await? {
                Some(session) if !session.identifier.is_empty() => Ok(session.identifier),
                _ => Err(EngineError::Parse(format!(
                    "no session id in create output: {stdout}"
                ))),
            },
        }
    }

    async fn inspect(&self, name: &str) -> Result<Option<EngineSession>, EngineError> {
        let args = vec!["sync".to_string(), "list".to_string(), name.to_string()];
        let output = run("sync list", &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            // "unable to locate requested sessions" — not an error, just gone.
            if stderr.contains("unable to locate") || stderr.contains("did not match") {
                return Ok(None);
            }
            return Err(EngineError::CommandFailed {
                operation: "sync list".to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse::parse_list(&stdout).into_iter().find(|s| s.name == name))
    }

    async fn terminate(&self, name: &str) -> Result<(), EngineError> {
        let args = vec!["sync".to_string(), "terminate".to_string(), name.to_string()];
        let output = run("sync terminate", &args).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("unable to locate") || stderr.contains("did not match") {
                return Ok(());
            }
            return Err(EngineError::CommandFailed {
                operation: "sync terminate".to_string(),
                stderr: stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}
