// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Free-form sprite labels, many-to-many with cascade delete.

use rusqlite::params;

use crate::{Store, StoreError};

impl Store {
    /// Attach a tag. Idempotent; tagging an unknown sprite is `NotFound`.
    pub fn tag(&self, name: &str, tag: &str) -> Result<(), StoreError> {
        let conn = self.conn();
        if crate::sprites::query_sprite(&conn, name)?.is_none() {
            return Err(StoreError::NotFound(name.to_string()));
        }
        conn.execute(
            "INSERT OR IGNORE INTO tags (sprite_name, tag) VALUES (?1, ?2)",
            params![name, tag],
        )?;
        Ok(())
    }

    /// Detach a tag. Removing an absent tag is a no-op.
    pub fn untag(&self, name: &str, tag: &str) -> Result<(), StoreError> {
        self.conn().execute(
            "DELETE FROM tags WHERE sprite_name = ?1 AND tag = ?2",
            params![name, tag],
        )?;
        Ok(())
    }

    pub fn get_tags(&self, name: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT tag FROM tags WHERE sprite_name = ?1 ORDER BY tag")?;
        let rows = stmt.query_map(params![name], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
