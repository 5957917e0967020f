// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH config block management and connectivity probing.
//!
//! Managed blocks in `~/.ssh/config` are delimited by exact marker lines
//! (`# sp-managed: <alias>` … `# sp-end: <alias>`); removal is line-based
//! between the markers so user-authored config is never touched.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{Transport, TransportError};

/// Transport adapter over the `ssh` binary and the user's ssh config.
#[derive(Clone)]
pub struct SshTransport {
    config_path: PathBuf,
}

impl SshTransport {
    pub fn new(config_path: PathBuf) -> Self {
        SshTransport { config_path }
    }

    /// The conventional `~/.ssh/config` location.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".ssh").join("config"))
    }
}

fn begin_marker(alias: &str) -> String {
    format!("# sp-managed: {alias}")
}

fn end_marker(alias: &str) -> String {
    format!("# sp-end: {alias}")
}

/// Render the managed block for an alias forwarding through `port`.
pub fn render_block(alias: &str, port: u16) -> String {
    format!(
        "{begin}\n\
         Host {alias}\n\
         \tHostName 127.0.0.1\n\
         \tPort {port}\n\
         \tUser sprite\n\
         \tStrictHostKeyChecking no\n\
         \tUserKnownHostsFile /dev/null\n\
         \tConnectTimeout 5\n\
         {end}\n",
        begin = begin_marker(alias),
        end = end_marker(alias),
    )
}

/// Drop the managed block for `alias` from config text, if present.
pub fn strip_block(content: &str, alias: &str) -> String {
    let begin = begin_marker(alias);
    let end = end_marker(alias);
    let mut out = String::with_capacity(content.len());
    let mut inside = false;
    for line in content.lines() {
        if line.trim_end() == begin {
            inside = true;
            continue;
        }
        if inside {
            if line.trim_end() == end {
                inside = false;
            }
            continue;
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

#[async_trait]
impl Transport for SshTransport {
    async fn install_config(&self, alias: &str, port: u16) -> Result<(), TransportError> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let existing = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };
        let mut updated = strip_block(&existing, alias);
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&render_block(alias, port));
        std::fs::write(&self.config_path, updated)?;
        debug!(alias, port, "installed ssh config block");
        Ok(())
    }

    async fn remove_config(&self, alias: &str) -> Result<(), TransportError> {
        let existing = match std::fs::read_to_string(&self.config_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let stripped = strip_block(&existing, alias);
        // Don't rewrite the user's config when there was nothing of ours
        // in it.
        if stripped != existing {
            std::fs::write(&self.config_path, stripped)?;
        }
        Ok(())
    }

    async fn test(&self, alias: &str) -> Result<(), TransportError> {
        let output = Command::new("ssh")
            .args([
                "-F",
                &self.config_path.display().to_string(),
                "-o",
                "ConnectTimeout=5",
                "-o",
                "StrictHostKeyChecking=no",
                alias,
                "echo",
                "ok",
            ])
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => TransportError::MissingBinary(e),
                _ => TransportError::ConfigIo(e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() && stdout.contains("ok") {
            return Ok(());
        }
        Err(TransportError::TestFailed(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ))
    }
}

#[cfg(test)]
#[path = "ssh_tests.rs"]
mod tests;
