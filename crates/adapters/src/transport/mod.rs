// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secure-transport adapter: managed SSH config blocks and connectivity
//! tests.

mod ssh;

pub use ssh::SshTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};

use async_trait::async_trait;
use thiserror::Error;

/// Errors from transport operations.
#[derive(Debug, Error)]
pub enum TransportError {
    /// `ssh` is not installed. Fatal; never retried.
    #[error("ssh not found on PATH")]
    MissingBinary(#[source] std::io::Error),

    #[error("cannot update ssh config: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("transport test failed: {0}")]
    TestFailed(String),
}

/// Adapter over the transport layer for one forwarded sprite.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Install (replacing any previous) the managed config block routing
    /// `alias` through the local forwarded port.
    async fn install_config(&self, alias: &str, port: u16) -> Result<(), TransportError>;

    /// Remove the managed block for `alias`. Idempotent.
    async fn remove_config(&self, alias: &str) -> Result<(), TransportError>;

    /// One end-to-end connectivity check (`ssh ALIAS echo ok`).
    async fn test(&self, alias: &str) -> Result<(), TransportError>;
}
