// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Data-plane request handlers.

use serde_json::json;
use sp_core::{Sprite, StateUpdate};
use sp_store::{ListFilter, StoreError};
use tracing::info;

use crate::daemon::Daemon;
use crate::protocol::{
    DeleteParams, ImportParams, ListParams, Response, UpdateStatusParams, UpdateSyncStatusParams,
};

pub(super) fn handle_list(daemon: &Daemon, params: ListParams) -> Response {
    let filter = ListFilter {
        tags: params.tags,
        path_prefix: params.path_prefix,
        name_contains: params.name_contains,
    };
    match daemon.store.list(&filter) {
        Ok(sprites) => Response::ok(sprites),
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_get(daemon: &Daemon, name: &str) -> Response {
    match daemon.store.get(name) {
        Ok(Some(sprite)) => Response::ok(sprite),
        Ok(None) => Response::error(format!("sprite not found: {name}")),
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_upsert(daemon: &Daemon, sprite: Sprite) -> Response {
    if sprite.name.is_empty() {
        return Response::error("sprite name is required");
    }
    let before = match daemon.store.get(&sprite.name) {
        Ok(before) => before,
        Err(e) => return Response::error(e),
    };
    match daemon.store.upsert(&sprite) {
        Ok((merged, inserted)) => {
            if inserted {
                daemon.bus.broadcast(&StateUpdate::added(merged.clone()));
            } else if before.as_ref().is_some_and(|b| fields_changed(b, &merged)) {
                daemon.bus.broadcast(&StateUpdate::sprite_status(merged.clone()));
            }
            Response::ok(merged)
        }
        Err(e) => Response::error(e),
    }
}

pub(super) async fn handle_delete(daemon: &Daemon, params: DeleteParams) -> Response {
    let name = params.name;
    // Tear any sync down first so nothing keeps forwarding to a record
    // we no longer hold.
    if let Err(e) = daemon.stop_sync(&name).await {
        return Response::error(e);
    }
    if params.destroy {
        if let Err(e) = daemon.provider.destroy_sprite(&name).await {
            return Response::error(e);
        }
    }
    match daemon.store.delete(&name) {
        Ok(existed) => {
            if existed {
                info!(sprite = %name, destroyed = params.destroy, "sprite deleted");
                daemon.bus.broadcast(&StateUpdate::removed(name.as_str()));
            }
            Response::ok(json!({ "deleted": existed }))
        }
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_tag(daemon: &Daemon, name: &str, tag: &str) -> Response {
    match daemon.store.tag(name, tag) {
        Ok(()) => Response::ok(json!({ "tagged": true })),
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_untag(daemon: &Daemon, name: &str, tag: &str) -> Response {
    match daemon.store.untag(name, tag) {
        Ok(()) => Response::ok(json!({ "tagged": false })),
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_get_tags(daemon: &Daemon, name: &str) -> Response {
    match daemon.store.get_tags(name) {
        Ok(tags) => Response::ok(tags),
        Err(e) => Response::error(e),
    }
}

pub(super) async fn handle_import(daemon: &Daemon, params: ImportParams) -> Response {
    let remote = match daemon.provider.list_sprites().await {
        Ok(remote) => remote,
        Err(e) => return Response::error(e),
    };

    let mut imported = Vec::new();
    for observed in remote {
        if !params.names.is_empty() && !params.names.contains(&observed.name) {
            continue;
        }
        let mut sprite = Sprite::named(observed.name.as_str());
        sprite.id = observed.id.clone();
        sprite.url = observed.url.clone();
        sprite.org = observed.org.clone();
        sprite.status = observed.status();
        if let Some((repo, remote_path)) = infer_from_name(&observed.name) {
            sprite.repo = repo;
            sprite.remote_path = remote_path;
        }
        match daemon.store.upsert(&sprite) {
            Ok((merged, inserted)) => {
                if inserted {
                    daemon.bus.broadcast(&StateUpdate::added(merged.clone()));
                }
                imported.push(merged);
            }
            Err(e) => return Response::error(e),
        }
    }
    info!(count = imported.len(), "imported sprites");
    Response::ok(imported)
}

pub(super) fn handle_update_status(daemon: &Daemon, params: UpdateStatusParams) -> Response {
    match daemon.store.set_status(&params.name, params.status) {
        Ok((sprite, changed)) => {
            if changed {
                daemon.bus.broadcast(&StateUpdate::sprite_status(sprite.clone()));
            }
            Response::ok(sprite)
        }
        Err(e @ StoreError::NotFound(_)) => Response::error(e),
        Err(e) => Response::error(e),
    }
}

pub(super) fn handle_update_sync_status(
    daemon: &Daemon,
    params: UpdateSyncStatusParams,
) -> Response {
    match daemon.store.set_sync_status(&params.name, params.sync_status, &params.error) {
        Ok((sprite, changed)) => {
            if changed {
                daemon.bus.broadcast(&StateUpdate::sync_status(sprite.clone()));
            }
            Response::ok(sprite)
        }
        Err(e) => Response::error(e),
    }
}

/// Names shaped `gh-OWNER--REPO` carry their origin: infer the repository
/// and a conventional remote path. Whether this is policy or legacy is an
/// open question; the whole rule lives behind this one predicate.
fn infer_from_name(name: &str) -> Option<(String, String)> {
    let rest = name.strip_prefix("gh-")?;
    let (owner, repo) = rest.split_once("--")?;
    if owner.is_empty() || repo.is_empty() {
        return None;
    }
    Some((format!("{owner}/{repo}"), format!("/home/sprite/{repo}")))
}

/// Field comparison for broadcast decisions, ignoring the
/// always-advancing timestamps.
fn fields_changed(before: &Sprite, after: &Sprite) -> bool {
    let strip = |s: &Sprite| Sprite {
        created_at: None,
        updated_at: None,
        last_seen: None,
        ..s.clone()
    };
    strip(before) != strip(after)
}
