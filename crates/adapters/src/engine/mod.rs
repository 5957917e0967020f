// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-sync engine adapter (`mutagen`).

mod mutagen;
pub mod parse;

pub use mutagen::MutagenCli;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeEngine;

use async_trait::async_trait;
use sp_core::SyncStatus;
use std::path::Path;
use thiserror::Error;

/// Errors from sync-engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The `mutagen` binary is not installed. Fatal; never retried.
    #[error("mutagen not found (is `mutagen` on PATH?)")]
    MissingBinary(#[source] std::io::Error),

    #[error("mutagen {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("unparseable mutagen output: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One engine session as reported by `mutagen sync list`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineSession {
    pub name: String,
    pub identifier: String,
    /// Verbose status line, e.g. `Watching for changes`.
    pub raw_status: String,
    pub alpha_connected: bool,
    pub beta_connected: bool,
    pub conflicts: u32,
    pub last_error: String,
}

impl EngineSession {
    /// The verbose status folded into the canonical vocabulary.
    pub fn status(&self) -> SyncStatus {
        if !self.last_error.is_empty() {
            return SyncStatus::Error;
        }
        parse::normalize_status(&self.raw_status)
    }
}

/// Adapter over the file-sync engine.
#[async_trait]
pub trait SyncEngine: Send + Sync + 'static {
    /// `mutagen sync create --name NAME --sync-mode two-way-safe
    /// [--ignore P]… LOCAL ALIAS:REMOTE` — returns the engine session id.
    async fn create(
        &self,
        name: &str,
        local: &Path,
        alias: &str,
        remote_path: &str,
        ignores: &[String],
    ) -> Result<String, EngineError>;

    /// `mutagen sync list NAME` — `None` when the engine has no such
    /// session.
    async fn inspect(&self, name: &str) -> Result<Option<EngineSession>, EngineError>;

    /// `mutagen sync terminate NAME` — idempotent: terminating an absent
    /// session succeeds.
    async fn terminate(&self, name: &str) -> Result<(), EngineError>;
}
