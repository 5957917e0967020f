// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sprites relation and the upsert merge.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Row};
use sp_core::{Sprite, SpriteStatus, SyncStatus};

use crate::{Store, StoreError};

/// Filters for `list`. Empty fields mean "no constraint"; tags match any-of.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub tags: Vec<String>,
    pub path_prefix: String,
    pub name_contains: String,
}

const SPRITE_COLUMNS: &str = "name, id, url, local_path, remote_path, org, repo, \
     status, sync_status, sync_error, created_at, updated_at, last_seen";

impl Store {
    /// Insert or merge a sprite record, returning the persisted row and
    /// whether it was newly inserted.
    ///
    /// Merge rule: an incoming non-empty scalar overwrites; `status` and
    /// `sync_status` additionally refuse their "don't know" tokens.
    /// `last_seen` and `updated_at` always advance.
    pub fn upsert(&self, incoming: &Sprite) -> Result<(Sprite, bool), StoreError> {
        let now = Utc::now();
        let conn = self.conn();
        let existing = query_sprite(&conn, &incoming.name)?;

        let (mut merged, inserted) = match existing {
            Some(current) => (merge(current, incoming), false),
            None => (incoming.clone(), true),
        };
        if inserted && merged.created_at.is_none() {
            merged.created_at = Some(now);
        }
        merged.updated_at = Some(now);
        merged.last_seen = Some(now);

        conn.execute(
            "INSERT INTO sprites (name, id, url, local_path, remote_path, org, repo,
                                  status, sync_status, sync_error,
                                  created_at, updated_at, last_seen)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
             ON CONFLICT(name) DO UPDATE SET
                 id = ?2, url = ?3, local_path = ?4, remote_path = ?5,
                 org = ?6, repo = ?7, status = ?8, sync_status = ?9,
                 sync_error = ?10, updated_at = ?12, last_seen = ?13",
            params![
                merged.name,
                merged.id,
                merged.url,
                merged.local_path,
                merged.remote_path,
                merged.org,
                merged.repo,
                merged.status.as_str(),
                merged.sync_status.as_str(),
                merged.sync_error,
                timestamp(merged.created_at.unwrap_or(now)),
                timestamp(now),
                timestamp(now),
            ],
        )?;

        Ok((merged, inserted))
    }

    pub fn get(&self, name: &str) -> Result<Option<Sprite>, StoreError> {
        query_sprite(&self.conn(), name)
    }

    /// List sprites, newest activity first.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<Sprite>, StoreError> {
        let mut sql = format!("SELECT {SPRITE_COLUMNS} FROM sprites WHERE 1=1");
        let mut args: Vec<String> = Vec::new();

        if !filter.tags.is_empty() {
            let marks = vec!["?"; filter.tags.len()].join(", ");
            sql.push_str(&format!(
                " AND name IN (SELECT sprite_name FROM tags WHERE tag IN ({marks}))"
            ));
            args.extend(filter.tags.iter().cloned());
        }
        if !filter.path_prefix.is_empty() {
            sql.push_str(" AND local_path LIKE ? || '%'");
            args.push(filter.path_prefix.clone());
        }
        if !filter.name_contains.is_empty() {
            sql.push_str(" AND name LIKE '%' || ? || '%'");
            args.push(filter.name_contains.clone());
        }
        sql.push_str(" ORDER BY updated_at DESC");

        let conn = self.conn();
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args.iter()), sprite_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Delete a sprite; tags and session rows cascade. Returns whether a
    /// row existed.
    pub fn delete(&self, name: &str) -> Result<bool, StoreError> {
        let n = self.conn().execute("DELETE FROM sprites WHERE name = ?1", params![name])?;
        Ok(n > 0)
    }

    /// Overwrite the provider status, advancing `last_seen`/`updated_at`.
    /// Returns the updated row and whether the status actually changed.
    pub fn set_status(
        &self,
        name: &str,
        status: SpriteStatus,
    ) -> Result<(Sprite, bool), StoreError> {
        let now = Utc::now();
        let conn = self.conn();
        let mut sprite =
            query_sprite(&conn, name)?.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let changed = sprite.status != status;
        sprite.status = status;
        sprite.updated_at = Some(now);
        sprite.last_seen = Some(now);
        conn.execute(
            "UPDATE sprites SET status = ?2, updated_at = ?3, last_seen = ?3 WHERE name = ?1",
            params![name, status.as_str(), timestamp(now)],
        )?;
        Ok((sprite, changed))
    }

    /// Overwrite the sync status and error message. Unlike `upsert`, this is
    /// an explicit setter: writing `none` (teardown) is legitimate here.
    pub fn set_sync_status(
        &self,
        name: &str,
        sync_status: SyncStatus,
        sync_error: &str,
    ) -> Result<(Sprite, bool), StoreError> {
        let now = Utc::now();
        let conn = self.conn();
        let mut sprite =
            query_sprite(&conn, name)?.ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        let changed = sprite.sync_status != sync_status || sprite.sync_error != sync_error;
        sprite.sync_status = sync_status;
        sprite.sync_error = sync_error.to_string();
        sprite.updated_at = Some(now);
        conn.execute(
            "UPDATE sprites SET sync_status = ?2, sync_error = ?3, updated_at = ?4
             WHERE name = ?1",
            params![name, sync_status.as_str(), sync_error, timestamp(now)],
        )?;
        Ok((sprite, changed))
    }
}

/// Field-wise merge of an incoming record over the stored one.
fn merge(mut current: Sprite, incoming: &Sprite) -> Sprite {
    overwrite_nonempty(&mut current.id, &incoming.id);
    overwrite_nonempty(&mut current.url, &incoming.url);
    overwrite_nonempty(&mut current.local_path, &incoming.local_path);
    overwrite_nonempty(&mut current.remote_path, &incoming.remote_path);
    overwrite_nonempty(&mut current.org, &incoming.org);
    overwrite_nonempty(&mut current.repo, &incoming.repo);
    overwrite_nonempty(&mut current.sync_error, &incoming.sync_error);
    if incoming.status.is_known() {
        current.status = incoming.status;
    }
    if incoming.sync_status.is_known() {
        current.sync_status = incoming.sync_status;
    }
    current
}

fn overwrite_nonempty(current: &mut String, incoming: &str) {
    if !incoming.is_empty() {
        *current = incoming.to_string();
    }
}

fn timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339()
}

fn parse_timestamp(s: String) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&s).ok().map(|t| t.with_timezone(&Utc))
}

pub(crate) fn sprite_from_row(row: &Row<'_>) -> Result<Sprite, rusqlite::Error> {
    Ok(Sprite {
        name: row.get(0)?,
        id: row.get(1)?,
        url: row.get(2)?,
        local_path: row.get(3)?,
        remote_path: row.get(4)?,
        org: row.get(5)?,
        repo: row.get(6)?,
        status: row.get::<_, String>(7)?.parse().unwrap_or_default(),
        sync_status: row.get::<_, String>(8)?.parse().unwrap_or_default(),
        sync_error: row.get(9)?,
        created_at: parse_timestamp(row.get(10)?),
        updated_at: parse_timestamp(row.get(11)?),
        last_seen: parse_timestamp(row.get(12)?),
    })
}

pub(crate) fn query_sprite(
    conn: &rusqlite::Connection,
    name: &str,
) -> Result<Option<Sprite>, StoreError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {SPRITE_COLUMNS} FROM sprites WHERE name = ?1"))?;
    let mut rows = stmt.query_map(params![name], sprite_from_row)?;
    Ok(rows.next().transpose()?)
}

#[cfg(test)]
#[path = "sprites_tests.rs"]
mod tests;
