// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema creation. Idempotent; safe to run on every open.

use rusqlite::Connection;

use crate::StoreError;

pub(crate) fn init(conn: &Connection) -> Result<(), StoreError> {
    // journal_mode answers with the resulting mode, so it cannot go
    // through execute_batch.
    let _mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;

         CREATE TABLE IF NOT EXISTS sprites (
             name        TEXT PRIMARY KEY,
             id          TEXT NOT NULL DEFAULT '',
             url         TEXT NOT NULL DEFAULT '',
             local_path  TEXT NOT NULL DEFAULT '',
             remote_path TEXT NOT NULL DEFAULT '',
             org         TEXT NOT NULL DEFAULT '',
             repo        TEXT NOT NULL DEFAULT '',
             status      TEXT NOT NULL DEFAULT 'unknown',
             sync_status TEXT NOT NULL DEFAULT 'none',
             sync_error  TEXT NOT NULL DEFAULT '',
             created_at  TEXT NOT NULL,
             updated_at  TEXT NOT NULL,
             last_seen   TEXT NOT NULL
         );

         CREATE TABLE IF NOT EXISTS tags (
             sprite_name TEXT NOT NULL
                 REFERENCES sprites(name) ON DELETE CASCADE,
             tag         TEXT NOT NULL,
             PRIMARY KEY (sprite_name, tag)
         );

         CREATE TABLE IF NOT EXISTS sync_sessions (
             sprite_name     TEXT PRIMARY KEY
                 REFERENCES sprites(name) ON DELETE CASCADE,
             mutagen_id      TEXT NOT NULL DEFAULT '',
             ssh_port        INTEGER NOT NULL DEFAULT 0,
             proxy_pid       INTEGER NOT NULL DEFAULT 0,
             alpha_connected INTEGER NOT NULL DEFAULT 0,
             beta_connected  INTEGER NOT NULL DEFAULT 0,
             conflicts       INTEGER NOT NULL DEFAULT 0,
             last_error      TEXT NOT NULL DEFAULT ''
         );

         CREATE INDEX IF NOT EXISTS idx_sprites_updated_at
             ON sprites(updated_at DESC);
         CREATE INDEX IF NOT EXISTS idx_tags_tag ON tags(tag);",
    )?;
    Ok(())
}
