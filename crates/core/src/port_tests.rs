// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

#[test]
fn port_is_stable_for_a_name() {
    assert_eq!(ssh_port_for("demo"), ssh_port_for("demo"));
}

#[test]
fn distinct_names_usually_get_distinct_ports() {
    // Not a guarantee, just a sanity check that the hash is not degenerate.
    let a = ssh_port_for("gh-acme--widgets");
    let b = ssh_port_for("gh-acme--gadgets");
    assert_ne!(a, b);
}

proptest! {
    #[test]
    fn port_is_always_in_range(name in ".{0,64}") {
        let port = ssh_port_for(&name);
        prop_assert!((10_000..60_000).contains(&port));
    }
}
