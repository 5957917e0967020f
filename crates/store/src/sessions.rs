// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sync_sessions relation.

use rusqlite::{params, Row};
use sp_core::SyncSession;

use crate::{Store, StoreError};

impl Store {
    /// Write (replacing any previous) the session row for a sprite.
    pub fn put_session(&self, session: &SyncSession) -> Result<(), StoreError> {
        self.conn().execute(
            "INSERT OR REPLACE INTO sync_sessions
                 (sprite_name, mutagen_id, ssh_port, proxy_pid,
                  alpha_connected, beta_connected, conflicts, last_error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                session.sprite_name,
                session.mutagen_id,
                session.ssh_port,
                session.proxy_pid,
                session.alpha_connected,
                session.beta_connected,
                session.conflicts,
                session.last_error,
            ],
        )?;
        Ok(())
    }

    pub fn get_session(&self, name: &str) -> Result<Option<SyncSession>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT sprite_name, mutagen_id, ssh_port, proxy_pid,
                    alpha_connected, beta_connected, conflicts, last_error
             FROM sync_sessions WHERE sprite_name = ?1",
        )?;
        let mut rows = stmt.query_map(params![name], session_from_row)?;
        Ok(rows.next().transpose()?)
    }

    pub fn delete_session(&self, name: &str) -> Result<bool, StoreError> {
        let n = self
            .conn()
            .execute("DELETE FROM sync_sessions WHERE sprite_name = ?1", params![name])?;
        Ok(n > 0)
    }

    /// All tracked sessions, for the proxy-liveness probe.
    pub fn list_sessions(&self) -> Result<Vec<SyncSession>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT sprite_name, mutagen_id, ssh_port, proxy_pid,
                    alpha_connected, beta_connected, conflicts, last_error
             FROM sync_sessions ORDER BY sprite_name",
        )?;
        let rows = stmt.query_map([], session_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn session_from_row(row: &Row<'_>) -> Result<SyncSession, rusqlite::Error> {
    Ok(SyncSession {
        sprite_name: row.get(0)?,
        mutagen_id: row.get(1)?,
        ssh_port: row.get(2)?,
        proxy_pid: row.get(3)?,
        alpha_connected: row.get(4)?,
        beta_connected: row.get(5)?,
        conflicts: row.get(6)?,
        last_error: row.get(7)?,
    })
}
