// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sandbox provider adapter (`sprite` CLI + HTTP reachability probe).

mod cli;

pub use cli::SpriteCli;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeProvider, FakeProxyMode, ProviderCall};

use async_trait::async_trait;
use serde::Deserialize;
use sp_core::SpriteStatus;
use std::path::PathBuf;
use thiserror::Error;
use tokio::process::Command;

/// Errors from provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The `sprite` binary is not installed. Fatal for the operation;
    /// never retried.
    #[error("sprite CLI not found (is `sprite` on PATH?)")]
    MissingBinary(#[source] std::io::Error),

    #[error("sprite {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("unexpected provider output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A sprite as the provider reports it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RemoteSprite {
    pub name: String,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, alias = "organization")]
    pub org: String,
    /// Raw provider status; canonicalized via [`RemoteSprite::status`].
    #[serde(default, rename = "status")]
    pub raw_status: String,
}

impl RemoteSprite {
    /// Provider status folded into the closed vocabulary; anything the
    /// provider invents that we don't recognize is `unknown`.
    pub fn status(&self) -> SpriteStatus {
        self.raw_status.parse().unwrap_or_default()
    }
}

/// One remote command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecRequest {
    pub name: String,
    pub org: String,
    pub tty: bool,
    pub env: Vec<(String, String)>,
    /// Local file to upload before running, as `(local, remote)`.
    pub file: Option<(PathBuf, String)>,
    pub command: Vec<String>,
}

impl ExecRequest {
    pub fn new(name: impl Into<String>, command: &[&str]) -> Self {
        ExecRequest {
            name: name.into(),
            command: command.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// Adapter over the sandbox provider.
#[async_trait]
pub trait Provider: Send + Sync + 'static {
    /// `sprite api /sprites` — all sprites visible to the credential.
    async fn list_sprites(&self) -> Result<Vec<RemoteSprite>, ProviderError>;

    /// `sprite api -s NAME /` — authoritative record for one sprite.
    async fn get_sprite(&self, name: &str) -> Result<RemoteSprite, ProviderError>;

    /// `sprite create -skip-console NAME`
    async fn create_sprite(&self, name: &str) -> Result<(), ProviderError>;

    /// `sprite destroy NAME`
    async fn destroy_sprite(&self, name: &str) -> Result<(), ProviderError>;

    /// `sprite exec …` — run a command on the sprite, returning stdout.
    /// Waking a warm sprite is a side effect the lifecycle controller
    /// leans on.
    async fn exec(&self, req: &ExecRequest) -> Result<String, ProviderError>;

    /// Build (but do not spawn) the long-running port-forward process:
    /// `sprite proxy -s NAME LOCAL:22`. The caller owns the child.
    fn proxy_command(&self, name: &str, local_port: u16) -> Command;

    /// HTTP probe against the provider API; `true` only on a 2xx.
    async fn reachable(&self) -> bool;
}
