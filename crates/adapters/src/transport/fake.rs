// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use super::{Transport, TransportError};

/// Recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Install { alias: String, port: u16 },
    Remove { alias: String },
    Test { alias: String },
}

struct FakeTransportState {
    calls: Vec<TransportCall>,
    /// Number of leading test calls that fail before one succeeds.
    tests_failing: u32,
    tests_always_fail: bool,
}

/// Fake transport adapter for testing.
#[derive(Clone)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeTransportState>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeTransportState {
                calls: Vec::new(),
                tests_failing: 0,
                tests_always_fail: false,
            })),
        }
    }
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` connectivity tests (then succeed).
    pub fn fail_tests(&self, n: u32) {
        self.inner.lock().tests_failing = n;
    }

    pub fn fail_tests_forever(&self) {
        self.inner.lock().tests_always_fail = true;
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.inner.lock().calls.clone()
    }

    pub fn installed(&self, alias: &str) -> bool {
        let calls = self.inner.lock().calls.clone();
        let mut installed = false;
        for call in calls {
            match call {
                TransportCall::Install { alias: a, .. } if a == alias => installed = true,
                TransportCall::Remove { alias: a } if a == alias => installed = false,
                _ => {}
            }
        }
        installed
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn install_config(&self, alias: &str, port: u16) -> Result<(), TransportError> {
        self.inner
            .lock()
            .calls
            .push(TransportCall::Install { alias: alias.to_string(), port });
        Ok(())
    }

    async fn remove_config(&self, alias: &str) -> Result<(), TransportError> {
        self.inner.lock().calls.push(TransportCall::Remove { alias: alias.to_string() });
        Ok(())
    }

    async fn test(&self, alias: &str) -> Result<(), TransportError> {
        let mut state = self.inner.lock();
        state.calls.push(TransportCall::Test { alias: alias.to_string() });
        if state.tests_always_fail {
            return Err(TransportError::TestFailed("connection refused".to_string()));
        }
        if state.tests_failing > 0 {
            state.tests_failing -= 1;
            return Err(TransportError::TestFailed("connection refused".to_string()));
        }
        Ok(())
    }
}
