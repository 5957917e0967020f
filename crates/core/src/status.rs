// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed status vocabularies for sprites and sync sessions.
//!
//! The provider and the sync engine both report free-form strings; everything
//! past the adapter boundary works with these enums so the merge rules on the
//! "don't know" tokens (`unknown`, `none`) are enforced by the type system.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A status string that is not part of the closed vocabulary.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unrecognized status: {0}")]
pub struct StatusParseError(pub String);

/// Provider-observed lifecycle state of a sprite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpriteStatus {
    Running,
    Warm,
    Cold,
    #[default]
    Unknown,
}

impl SpriteStatus {
    /// Whether this value carries information worth persisting.
    ///
    /// `unknown` never overwrites a stored `running`/`warm`/`cold`.
    pub fn is_known(self) -> bool {
        self != SpriteStatus::Unknown
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SpriteStatus::Running => "running",
            SpriteStatus::Warm => "warm",
            SpriteStatus::Cold => "cold",
            SpriteStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SpriteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpriteStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(SpriteStatus::Running),
            "warm" => Ok(SpriteStatus::Warm),
            "cold" => Ok(SpriteStatus::Cold),
            "unknown" | "" => Ok(SpriteStatus::Unknown),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

/// Canonical sync state of a sprite's file-sync session.
///
/// `disconnected` is the single-observation state written when a tracked
/// proxy dies while the sprite is still running; the health monitor recovers
/// from it. `error` is terminal: the controller writes it only after the
/// attempt budget is exhausted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    None,
    Connecting,
    Watching,
    Syncing,
    Recovering,
    Disconnected,
    Idle,
    Error,
}

impl SyncStatus {
    /// Whether this value carries information worth persisting.
    pub fn is_known(self) -> bool {
        self != SyncStatus::None
    }

    /// States the health monitor polls the sync engine for.
    pub fn is_polled(self) -> bool {
        !matches!(self, SyncStatus::None | SyncStatus::Disconnected)
    }

    /// States under which a session row may exist.
    pub fn has_session(self) -> bool {
        matches!(
            self,
            SyncStatus::Connecting
                | SyncStatus::Watching
                | SyncStatus::Syncing
                | SyncStatus::Recovering
                | SyncStatus::Error
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncStatus::None => "none",
            SyncStatus::Connecting => "connecting",
            SyncStatus::Watching => "watching",
            SyncStatus::Syncing => "syncing",
            SyncStatus::Recovering => "recovering",
            SyncStatus::Disconnected => "disconnected",
            SyncStatus::Idle => "idle",
            SyncStatus::Error => "error",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" | "" => Ok(SyncStatus::None),
            "connecting" => Ok(SyncStatus::Connecting),
            "watching" => Ok(SyncStatus::Watching),
            "syncing" => Ok(SyncStatus::Syncing),
            "recovering" => Ok(SyncStatus::Recovering),
            "disconnected" => Ok(SyncStatus::Disconnected),
            "idle" => Ok(SyncStatus::Idle),
            "error" => Ok(SyncStatus::Error),
            other => Err(StatusParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
