// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use sp_core::StateUpdate;

use super::Bus;

fn update(n: u32) -> StateUpdate {
    StateUpdate::removed(format!("sprite-{n}"))
}

#[tokio::test]
async fn every_subscriber_sees_each_update_in_order() {
    let bus = Bus::new();
    let (_a, mut rx_a) = bus.subscribe();
    let (_b, mut rx_b) = bus.subscribe();

    for n in 0..5 {
        bus.broadcast(&update(n));
    }

    for rx in [&mut rx_a, &mut rx_b] {
        for n in 0..5 {
            assert_eq!(rx.recv().await.unwrap(), update(n));
        }
    }
}

#[tokio::test]
async fn full_queue_drops_without_reordering() {
    let bus = Bus::new();
    let (_id, mut rx) = bus.subscribe();

    // Overfill: the queue holds 100; the tail is dropped.
    for n in 0..150 {
        bus.broadcast(&update(n));
    }

    let mut received = Vec::new();
    while let Ok(u) = rx.try_recv() {
        received.push(u);
    }
    assert_eq!(received.len(), 100);
    // No duplicates, no reordering: exactly the first 100 in order.
    for (n, u) in received.iter().enumerate() {
        assert_eq!(*u, update(n as u32));
    }
}

#[tokio::test]
async fn unsubscribe_closes_the_queue() {
    let bus = Bus::new();
    let (id, mut rx) = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 1);

    bus.unsubscribe(id);
    assert_eq!(bus.subscriber_count(), 0);
    assert!(rx.recv().await.is_none());
}

#[tokio::test]
async fn dropped_receivers_are_pruned_on_broadcast() {
    let bus = Bus::new();
    let (_id, rx) = bus.subscribe();
    drop(rx);

    bus.broadcast(&update(0));
    assert_eq!(bus.subscriber_count(), 0);
}
