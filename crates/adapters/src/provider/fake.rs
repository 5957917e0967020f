// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake provider adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::process::Command;

use super::{ExecRequest, Provider, ProviderError, RemoteSprite};

/// Recorded provider call
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCall {
    List,
    Get { name: String },
    Create { name: String },
    Destroy { name: String },
    Exec { name: String, command: Vec<String> },
    Proxy { name: String, local_port: u16 },
}

/// How the fake's proxy child behaves once spawned.
///
/// The fake never binds the forwarded port itself; tests that need the
/// port to look live bind a listener on it before starting the sync.
#[derive(Debug, Clone)]
pub enum FakeProxyMode {
    /// Stays alive until killed.
    Hang,
    /// Exits immediately with the given stderr text.
    ExitImmediately { stderr: String },
}

struct FakeProviderState {
    sprites: HashMap<String, RemoteSprite>,
    calls: Vec<ProviderCall>,
    reachable: bool,
    proxy_mode: FakeProxyMode,
    exec_error: Option<String>,
}

/// Fake provider adapter for testing. Proxy children are real `sh`
/// processes so supervisor and liveness paths run for real.
#[derive(Clone)]
pub struct FakeProvider {
    inner: Arc<Mutex<FakeProviderState>>,
}

impl Default for FakeProvider {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeProviderState {
                sprites: HashMap::new(),
                calls: Vec::new(),
                reachable: true,
                proxy_mode: FakeProxyMode::Hang,
                exec_error: None,
            })),
        }
    }
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a sprite with the given raw status.
    pub fn add_sprite(&self, name: &str, status: &str) {
        self.inner.lock().sprites.insert(
            name.to_string(),
            RemoteSprite {
                name: name.to_string(),
                id: format!("spr_{name}"),
                url: format!("https://{name}.sprites.test"),
                org: "test-org".to_string(),
                raw_status: status.to_string(),
            },
        );
    }

    pub fn set_status(&self, name: &str, status: &str) {
        if let Some(s) = self.inner.lock().sprites.get_mut(name) {
            s.raw_status = status.to_string();
        }
    }

    pub fn remove_sprite(&self, name: &str) {
        self.inner.lock().sprites.remove(name);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.inner.lock().reachable = reachable;
    }

    pub fn set_proxy_mode(&self, mode: FakeProxyMode) {
        self.inner.lock().proxy_mode = mode;
    }

    /// Make every subsequent exec fail with this message.
    pub fn fail_exec(&self, message: &str) {
        self.inner.lock().exec_error = Some(message.to_string());
    }

    pub fn calls(&self) -> Vec<ProviderCall> {
        self.inner.lock().calls.clone()
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn list_sprites(&self) -> Result<Vec<RemoteSprite>, ProviderError> {
        let mut state = self.inner.lock();
        state.calls.push(ProviderCall::List);
        let mut sprites: Vec<_> = state.sprites.values().cloned().collect();
        sprites.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(sprites)
    }

    async fn get_sprite(&self, name: &str) -> Result<RemoteSprite, ProviderError> {
        let mut state = self.inner.lock();
        state.calls.push(ProviderCall::Get { name: name.to_string() });
        state.sprites.get(name).cloned().ok_or_else(|| ProviderError::CommandFailed {
            operation: "api".to_string(),
            stderr: format!("sprite not found: {name}"),
        })
    }

    async fn create_sprite(&self, name: &str) -> Result<(), ProviderError> {
        let mut state = self.inner.lock();
        state.calls.push(ProviderCall::Create { name: name.to_string() });
        state.sprites.insert(
            name.to_string(),
            RemoteSprite {
                name: name.to_string(),
                raw_status: "running".to_string(),
                ..Default::default()
            },
        );
        Ok(())
    }

    async fn destroy_sprite(&self, name: &str) -> Result<(), ProviderError> {
        let mut state = self.inner.lock();
        state.calls.push(ProviderCall::Destroy { name: name.to_string() });
        state.sprites.remove(name);
        Ok(())
    }

    async fn exec(&self, req: &ExecRequest) -> Result<String, ProviderError> {
        let mut state = self.inner.lock();
        state.calls.push(ProviderCall::Exec {
            name: req.name.clone(),
            command: req.command.clone(),
        });
        if let Some(message) = &state.exec_error {
            return Err(ProviderError::CommandFailed {
                operation: "exec".to_string(),
                stderr: message.clone(),
            });
        }
        // Wake side effect, as the real provider does.
        if let Some(s) = state.sprites.get_mut(&req.name) {
            if s.raw_status == "warm" {
                s.raw_status = "running".to_string();
            }
        }
        Ok("ok\n".to_string())
    }

    fn proxy_command(&self, name: &str, local_port: u16) -> Command {
        let mode = {
            let mut state = self.inner.lock();
            state.calls.push(ProviderCall::Proxy {
                name: name.to_string(),
                local_port,
            });
            state.proxy_mode.clone()
        };
        let mut cmd = Command::new("sh");
        match mode {
            FakeProxyMode::Hang => {
                cmd.arg("-c").arg("sleep 600");
            }
            FakeProxyMode::ExitImmediately { stderr } => {
                cmd.arg("-c").arg(format!("echo '{stderr}' >&2; exit 1"));
            }
        }
        cmd
    }

    async fn reachable(&self) -> bool {
        self.inner.lock().reachable
    }
}
