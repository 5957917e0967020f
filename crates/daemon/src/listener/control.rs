// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane request handlers: the sync lifecycle over RPC.

use serde_json::json;

use crate::daemon::Daemon;
use crate::engine::SyncOutcome;
use crate::protocol::{Response, StartSyncParams};

pub(super) async fn handle_start_sync(daemon: &Daemon, params: StartSyncParams) -> Response {
    if params.sprite_name.is_empty() {
        return Response::error("sprite_name is required");
    }
    if params.local_path.is_empty() || params.remote_path.is_empty() {
        return Response::error("local_path and remote_path are required");
    }
    if !std::path::Path::new(&params.local_path).is_absolute() {
        return Response::error(format!("local_path must be absolute: {}", params.local_path));
    }
    let outcome = daemon
        .start_sync(&params.sprite_name, &params.local_path, &params.remote_path, &params.org)
        .await;
    outcome_response(outcome)
}

pub(super) async fn handle_stop_sync(daemon: &Daemon, name: &str) -> Response {
    match daemon.stop_sync(name).await {
        Ok(()) => Response::ok(json!({ "stopped": true })),
        Err(e) => Response::error(e),
    }
}

pub(super) async fn handle_resync(daemon: &Daemon, name: &str) -> Response {
    outcome_response(daemon.resync(name).await)
}

pub(super) async fn handle_run_setup(daemon: &Daemon, name: &str) -> Response {
    let org = match daemon.store.get(name) {
        Ok(Some(sprite)) => sprite.org,
        Ok(None) => String::new(),
        Err(e) => return Response::error(e),
    };
    match daemon.run_setup(name, &org).await {
        Ok(()) => Response::ok(json!({ "setup": "done" })),
        Err(e) => Response::error(e),
    }
}

fn outcome_response(outcome: Result<SyncOutcome, crate::engine::SyncError>) -> Response {
    match outcome {
        Ok(SyncOutcome::Watching(result)) => Response::ok(result),
        Ok(SyncOutcome::Idle) => Response::ok(json!({ "status": "idle" })),
        Err(e) => Response::error(e),
    }
}
