// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! sp-adapters: boundary adapters to the external tools.
//!
//! Everything that shells out to `sprite`, `mutagen`, or `ssh` — or parses
//! their human-oriented output — lives here, so swapping a tool or surviving
//! a version bump touches a single module. Each adapter is an async trait
//! with a subprocess-backed implementation and a `Fake*` implementation
//! (behind the `test-support` feature) for exercising the daemon without
//! the tools installed.

pub mod engine;
pub mod ignore;
pub mod provider;
pub mod transport;

pub use engine::{EngineError, EngineSession, MutagenCli, SyncEngine};
pub use ignore::collect_ignores;
pub use provider::{ExecRequest, Provider, ProviderError, RemoteSprite, SpriteCli};
pub use transport::{SshTransport, Transport, TransportError};

#[cfg(any(test, feature = "test-support"))]
pub use engine::FakeEngine;
#[cfg(any(test, feature = "test-support"))]
pub use provider::{FakeProvider, FakeProxyMode, ProviderCall};
#[cfg(any(test, feature = "test-support"))]
pub use transport::{FakeTransport, TransportCall};
