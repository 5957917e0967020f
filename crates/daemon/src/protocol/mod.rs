// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: newline-delimited JSON frames. Requests are
//! `{"method": …, "params": …}`, responses `{"result": …}` or
//! `{"error": …}`, and subscription deltas are serialized
//! [`sp_core::StateUpdate`] values.

mod request;
mod response;
mod wire;

pub use request::{
    DeleteParams, ImportParams, ListParams, NameParams, Request, SpriteParams, StartSyncParams,
    TagParams, UpdateStatusParams, UpdateSyncStatusParams,
};
pub use response::{Response, SyncStartResult};
pub use wire::{read_request, write_response, write_update, ProtocolError, RawRequest};

#[cfg(test)]
mod property_tests;
