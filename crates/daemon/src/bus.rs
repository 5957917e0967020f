// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast bus: fan-out of state deltas to subscribed clients.
//!
//! Each subscriber gets a bounded queue. `broadcast` never blocks: a full
//! queue drops the delta for that subscriber only (dashboards reconcile on
//! their next poll). Unsubscribing closes the queue, which ends the
//! per-subscriber writer task.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use sp_core::StateUpdate;
use tokio::sync::mpsc;
use tracing::debug;

/// Queue depth per subscriber.
const SUBSCRIBER_QUEUE: usize = 100;

/// Subscriber table. Shared by the listener (subscribe/unsubscribe) and
/// every mutation path (broadcast).
#[derive(Default)]
pub struct Bus {
    subscribers: RwLock<HashMap<u64, mpsc::Sender<StateUpdate>>>,
    next_id: AtomicU64,
}

impl Bus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber; the receiver side drives one connection.
    pub fn subscribe(&self) -> (u64, mpsc::Receiver<StateUpdate>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE);
        self.subscribers.write().insert(id, tx);
        debug!(subscriber = id, "subscribed");
        (id, rx)
    }

    /// Drop a subscriber, closing its queue.
    pub fn unsubscribe(&self, id: u64) {
        if self.subscribers.write().remove(&id).is_some() {
            debug!(subscriber = id, "unsubscribed");
        }
    }

    /// Non-blocking fan-out. Slow consumers lose this update; closed
    /// consumers are pruned.
    pub fn broadcast(&self, update: &StateUpdate) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read();
            for (id, tx) in subscribers.iter() {
                match tx.try_send(update.clone()) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        debug!(subscriber = id, "queue full, dropping update");
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => dead.push(*id),
                }
            }
        }
        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write();
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
