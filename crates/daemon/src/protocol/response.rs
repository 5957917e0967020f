// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response to a single request: exactly one of `result` or `error`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Response {
    #[serde(rename = "result")]
    Result(Value),
    #[serde(rename = "error")]
    Error(String),
}

impl Response {
    /// A success response. Serialization of our own payload types cannot
    /// fail; a pathological payload degrades to `null` rather than
    /// poisoning the connection.
    pub fn ok(value: impl Serialize) -> Self {
        Response::Result(serde_json::to_value(value).unwrap_or(Value::Null))
    }

    pub fn error(message: impl std::fmt::Display) -> Self {
        Response::Error(message.to_string())
    }
}

/// Payload answered by `start_sync` once a sync reaches `watching`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncStartResult {
    pub mutagen_id: String,
    pub ssh_port: u16,
    pub proxy_pid: u32,
}
