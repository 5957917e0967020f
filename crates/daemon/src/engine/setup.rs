// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH-server bootstrap on the sprite.
//!
//! Reuses the user's existing on-disk public key; key management is out
//! of scope. The script is idempotent: re-running it on a configured
//! sprite changes nothing.

use sp_adapters::ExecRequest;
use tracing::info;

use crate::daemon::Daemon;

use super::SyncError;

impl Daemon {
    /// Install the local public key and make sure an SSH server is up,
    /// via the provider's exec contract.
    pub async fn run_setup(&self, name: &str, org: &str) -> Result<(), SyncError> {
        let key = self.read_public_key()?;
        let script = format!(
            "mkdir -p ~/.ssh && chmod 700 ~/.ssh && \
             (grep -qF '{key}' ~/.ssh/authorized_keys 2>/dev/null || \
              printf '%s\\n' '{key}' >> ~/.ssh/authorized_keys) && \
             chmod 600 ~/.ssh/authorized_keys && \
             (pgrep -x sshd >/dev/null 2>&1 || \
              sudo service ssh start 2>/dev/null || sudo /usr/sbin/sshd)"
        );
        let mut req = ExecRequest::new(name, &["sh", "-c"]);
        req.command.push(script);
        req.org = org.to_string();
        self.provider.exec(&req).await?;
        info!(sprite = name, "ssh server ready");
        Ok(())
    }

    /// First readable public key from the configured candidates.
    fn read_public_key(&self) -> Result<String, SyncError> {
        for path in &self.config.ssh_pubkey_paths {
            if let Ok(key) = std::fs::read_to_string(path) {
                let key = key.trim();
                if !key.is_empty() {
                    return Ok(key.to_string());
                }
            }
        }
        Err(SyncError::NoPublicKey)
    }
}
