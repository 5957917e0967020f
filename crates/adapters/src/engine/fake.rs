// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake sync-engine adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use super::{EngineError, EngineSession, SyncEngine};

struct FakeEngineState {
    sessions: HashMap<String, EngineSession>,
    next_id: u64,
    create_error: Option<String>,
    inspect_error: Option<String>,
    terminated: Vec<String>,
    inspected: Vec<String>,
}

/// Fake sync-engine adapter for testing.
#[derive(Clone)]
pub struct FakeEngine {
    inner: Arc<Mutex<FakeEngineState>>,
}

impl Default for FakeEngine {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeEngineState {
                sessions: HashMap::new(),
                next_id: 0,
                create_error: None,
                inspect_error: None,
                terminated: Vec::new(),
                inspected: Vec::new(),
            })),
        }
    }
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent create fail with this message.
    pub fn fail_create(&self, message: &str) {
        self.inner.lock().create_error = Some(message.to_string());
    }

    /// Overwrite the verbose status the next inspect reports.
    pub fn set_status(&self, name: &str, raw_status: &str) {
        if let Some(s) = self.inner.lock().sessions.get_mut(name) {
            s.raw_status = raw_status.to_string();
        }
    }

    /// Plant a session as if a previous run had created it.
    pub fn seed_session(&self, name: &str, raw_status: &str) {
        self.inner.lock().sessions.insert(
            name.to_string(),
            EngineSession {
                name: name.to_string(),
                identifier: format!("sync_seed_{name}"),
                raw_status: raw_status.to_string(),
                alpha_connected: true,
                beta_connected: false,
                ..Default::default()
            },
        );
    }

    /// Make every subsequent inspect fail with this message (cleared by
    /// `clear_inspect_error`).
    pub fn fail_inspect(&self, message: &str) {
        self.inner.lock().inspect_error = Some(message.to_string());
    }

    pub fn clear_inspect_error(&self) {
        self.inner.lock().inspect_error = None;
    }

    /// Names passed to terminate, in order.
    pub fn terminated(&self) -> Vec<String> {
        self.inner.lock().terminated.clone()
    }

    /// Names passed to inspect, in order.
    pub fn inspected(&self) -> Vec<String> {
        self.inner.lock().inspected.clone()
    }

    pub fn has_session(&self, name: &str) -> bool {
        self.inner.lock().sessions.contains_key(name)
    }
}

#[async_trait]
impl SyncEngine for FakeEngine {
    async fn create(
        &self,
        name: &str,
        _local: &Path,
        _alias: &str,
        _remote_path: &str,
        _ignores: &[String],
    ) -> Result<String, EngineError> {
        let mut state = self.inner.lock();
        if let Some(message) = &state.create_error {
            return Err(EngineError::CommandFailed {
                operation: "sync create".to_string(),
                stderr: message.clone(),
            });
        }
        state.next_id += 1;
        let identifier = format!("sync_{:04}", state.next_id);
        state.sessions.insert(
            name.to_string(),
            EngineSession {
                name: name.to_string(),
                identifier: identifier.clone(),
                raw_status: "Watching for changes".to_string(),
                alpha_connected: true,
                beta_connected: true,
                ..Default::default()
            },
        );
        Ok(identifier)
    }

    async fn inspect(&self, name: &str) -> Result<Option<EngineSession>, EngineError> {
        let mut state = self.inner.lock();
        state.inspected.push(name.to_string());
        if let Some(message) = &state.inspect_error {
            return Err(EngineError::CommandFailed {
                operation: "sync list".to_string(),
                stderr: message.clone(),
            });
        }
        Ok(state.sessions.get(name).cloned())
    }

    async fn terminate(&self, name: &str) -> Result<(), EngineError> {
        let mut state = self.inner.lock();
        state.terminated.push(name.to_string());
        state.sessions.remove(name);
        Ok(())
    }
}
