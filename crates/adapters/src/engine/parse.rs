// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Line-oriented parsing of `mutagen sync list` output.
//!
//! The engine prints blocks of `Key: value` lines per session, with
//! indented `Alpha:` / `Beta:` endpoint sections. Parsing is keyed on the
//! labels the engine has kept stable across versions: `Name`, `Identifier`,
//! `Status`, `Alpha:`, `Beta:`, `Connected:`, `Last error:`.

use sp_core::SyncStatus;

use super::EngineSession;

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Top,
    Alpha,
    Beta,
}

/// Parse every session block in `sync list` output.
pub fn parse_list(output: &str) -> Vec<EngineSession> {
    let mut sessions = Vec::new();
    let mut current: Option<EngineSession> = None;
    let mut section = Section::Top;

    for raw_line in output.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.chars().all(|c| c == '-') {
            continue;
        }

        if let Some(name) = line.strip_prefix("Name:") {
            if let Some(done) = current.take() {
                sessions.push(done);
            }
            current = Some(EngineSession { name: name.trim().to_string(), ..Default::default() });
            section = Section::Top;
            continue;
        }

        let Some(session) = current.as_mut() else { continue };

        if line == "Alpha:" {
            section = Section::Alpha;
        } else if line == "Beta:" {
            section = Section::Beta;
        } else if let Some(id) = line.strip_prefix("Identifier:") {
            session.identifier = id.trim().to_string();
            section = Section::Top;
        } else if let Some(status) = line.strip_prefix("Status:") {
            session.raw_status = status.trim().to_string();
            section = Section::Top;
        } else if let Some(err) = line.strip_prefix("Last error:") {
            session.last_error = err.trim().to_string();
            section = Section::Top;
        } else if let Some(conflicts) = line.strip_prefix("Conflicts:") {
            session.conflicts = conflicts.trim().parse().unwrap_or(0);
            section = Section::Top;
        } else if let Some(connected) = line.strip_prefix("Connected:") {
            let yes = connected.trim().eq_ignore_ascii_case("yes");
            match section {
                Section::Alpha => session.alpha_connected = yes,
                Section::Beta => session.beta_connected = yes,
                Section::Top => {}
            }
        }
    }

    if let Some(done) = current.take() {
        sessions.push(done);
    }
    sessions
}

/// Extract the session identifier from `sync create` stdout
/// (`Created session sync_…`).
pub fn parse_create_output(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find(|token| token.starts_with("sync_"))
        .map(|token| token.trim_end_matches(['.', ',']).to_string())
}

/// Fold the engine's verbose status into the canonical set.
///
/// Transfer-like phases all map to `syncing`; an unrecognized phrase maps
/// to `connecting` (the engine is alive but not in steady state).
pub fn normalize_status(raw: &str) -> SyncStatus {
    let status = raw.trim();
    if status.is_empty() {
        return SyncStatus::Connecting;
    }
    if status.contains("Halted") || status.to_ascii_lowercase().contains("error") {
        return SyncStatus::Error;
    }
    if status.starts_with("Watching") {
        return SyncStatus::Watching;
    }
    if status.starts_with("Connecting") {
        return SyncStatus::Connecting;
    }
    if status.starts_with("Paused") {
        return SyncStatus::Idle;
    }
    const TRANSFERRING: [&str; 6] =
        ["Scanning", "Staging", "Reconciling", "Applying", "Saving", "Waiting"];
    if TRANSFERRING.iter().any(|phase| status.starts_with(phase)) {
        return SyncStatus::Syncing;
    }
    SyncStatus::Connecting
}

#[cfg(test)]
#[path = "parse_tests.rs"]
mod tests;
