// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-sprite exponential backoff for the sync-status probe.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use sp_core::Clock;

const BASE: Duration = Duration::from_secs(5);
const CAP: Duration = Duration::from_secs(120);

struct BackoffEntry {
    failures: u32,
    until: Instant,
}

/// Independent exponential sequence per sprite: `min(base·2^(k-1), cap)`
/// with base 5 s and cap 2 min, cleared on success or network-up.
pub struct BackoffTable<C: Clock> {
    clock: C,
    entries: HashMap<String, BackoffEntry>,
}

impl<C: Clock> BackoffTable<C> {
    pub fn new(clock: C) -> Self {
        BackoffTable { clock, entries: HashMap::new() }
    }

    /// Record a consecutive failure, returning the delay now in force.
    pub fn record_failure(&mut self, name: &str) -> Duration {
        let now = self.clock.now();
        let entry = self
            .entries
            .entry(name.to_string())
            .or_insert(BackoffEntry { failures: 0, until: now });
        entry.failures += 1;
        let delay = delay_for(entry.failures);
        entry.until = now + delay;
        delay
    }

    /// Whether the probe should skip this sprite right now.
    pub fn in_backoff(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|entry| self.clock.now() < entry.until)
    }

    pub fn clear(&mut self, name: &str) {
        self.entries.remove(name);
    }

    pub fn clear_all(&mut self) {
        self.entries.clear();
    }
}

fn delay_for(failures: u32) -> Duration {
    let doubled = BASE.saturating_mul(1u32 << (failures - 1).min(8));
    doubled.min(CAP)
}

#[cfg(test)]
#[path = "backoff_tests.rs"]
mod tests;
