// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! One spawned task per accepted connection; within a connection,
//! responses go out in request-arrival order. A `subscribe` request
//! upgrades the connection: after the acknowledgement, the daemon writes
//! an indefinite sequence of delta frames and reads nothing further.

mod control;
mod data;

use std::sync::Arc;

use tokio::io::BufReader;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use crate::daemon::Daemon;
use crate::env;
use crate::protocol::{self, RawRequest, Request, Response};

/// Accept loop. Runs until the daemon's root cancellation fires.
pub async fn run(listener: UnixListener, daemon: Arc<Daemon>) {
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => break,
            result = listener.accept() => match result {
                Ok((stream, _)) => {
                    let daemon = Arc::clone(&daemon);
                    // A panicking handler takes down its own task only.
                    tokio::spawn(async move {
                        handle_connection(stream, daemon).await;
                    });
                }
                Err(e) => error!(error = %e, "accept failed"),
            }
        }
    }
    debug!("listener stopped");
}

async fn handle_connection(stream: UnixStream, daemon: Arc<Daemon>) {
    let (read_half, mut writer) = stream.into_split();
    let mut reader = BufReader::new(read_half);
    let ipc_timeout = env::ipc_timeout();

    loop {
        let raw = match protocol::read_request(&mut reader, ipc_timeout).await {
            Ok(Some(raw)) => raw,
            // EOF: client finished.
            Ok(None) => return,
            // Malformed frame or a stalled peer: close silently.
            Err(protocol::ProtocolError::Timeout) => {
                warn!("connection timed out");
                return;
            }
            Err(e) => {
                debug!(error = %e, "closing connection");
                return;
            }
        };
        daemon.touch_activity();

        let request = match parse_request(raw) {
            Ok(request) => request,
            Err(response) => {
                if protocol::write_response(&mut writer, &response, ipc_timeout).await.is_err() {
                    return;
                }
                continue;
            }
        };

        match request {
            // Connection-upgrading request: ack, then stream deltas until
            // the client goes away. No further request/response frames.
            Request::Subscribe => {
                serve_subscriber(&daemon, &mut writer).await;
                return;
            }

            // Respond first, then trigger: the requester deserves an
            // answer from the process it spoke to.
            Request::Restart => {
                let ok =
                    protocol::write_response(&mut writer, &Response::ok("restarting"), ipc_timeout)
                        .await
                        .is_ok();
                info!("restart requested over rpc");
                daemon.restart_requested.notify_one();
                if !ok {
                    return;
                }
            }

            request => {
                let response = dispatch(&daemon, request).await;
                if protocol::write_response(&mut writer, &response, ipc_timeout).await.is_err() {
                    return;
                }
            }
        }
    }
}

/// Unknown method or ill-fitting params: an error response, not a drop.
fn parse_request(raw: RawRequest) -> Result<Request, Response> {
    let method = raw.method.clone();
    raw.parse().map_err(|e| {
        debug!(method = %method, error = %e, "unusable request");
        Response::error(format!("unknown method or bad params: {method}"))
    })
}

async fn dispatch(daemon: &Daemon, request: Request) -> Response {
    match request {
        Request::Ping => Response::ok("pong"),

        Request::List(params) => data::handle_list(daemon, params.unwrap_or_default()),
        Request::Get(params) => data::handle_get(daemon, &params.name),
        Request::Upsert(sprite) => data::handle_upsert(daemon, sprite),
        Request::Delete(params) => data::handle_delete(daemon, params).await,
        Request::Tag(params) => data::handle_tag(daemon, &params.name, &params.tag),
        Request::Untag(params) => data::handle_untag(daemon, &params.name, &params.tag),
        Request::GetTags(params) => data::handle_get_tags(daemon, &params.name),
        Request::Import(params) => data::handle_import(daemon, params.unwrap_or_default()).await,
        Request::UpdateStatus(params) => data::handle_update_status(daemon, params),
        Request::UpdateSyncStatus(params) => data::handle_update_sync_status(daemon, params),

        Request::StartSync(params) => control::handle_start_sync(daemon, params).await,
        Request::StopSync(params) => control::handle_stop_sync(daemon, &params.sprite_name).await,
        Request::Resync(params) => control::handle_resync(daemon, &params.sprite_name).await,
        Request::RunSetup(params) => control::handle_run_setup(daemon, &params.sprite_name).await,

        // Intercepted in handle_connection before reaching dispatch
        Request::Subscribe | Request::Restart => unreachable!(),
    }
}

/// Writer side of one subscriber. Delta waits are unbounded; the writes
/// themselves are not, so a consumer that stops draining is dropped.
async fn serve_subscriber<W>(daemon: &Daemon, writer: &mut W)
where
    W: tokio::io::AsyncWrite + Unpin,
{
    let ipc_timeout = env::ipc_timeout();
    let (id, mut rx) = daemon.bus.subscribe();
    if protocol::write_response(writer, &Response::ok("subscribed"), ipc_timeout).await.is_err() {
        daemon.bus.unsubscribe(id);
        return;
    }
    loop {
        tokio::select! {
            _ = daemon.shutdown.cancelled() => break,
            update = rx.recv() => match update {
                Some(update) => {
                    if protocol::write_update(writer, &update, ipc_timeout).await.is_err() {
                        break;
                    }
                }
                None => break,
            }
        }
    }
    daemon.bus.unsubscribe(id);
}

#[cfg(test)]
pub(crate) fn test_daemon(
    dir: &std::path::Path,
) -> (
    Arc<Daemon>,
    sp_adapters::FakeProvider,
    sp_adapters::FakeEngine,
    sp_adapters::FakeTransport,
) {
    let provider = sp_adapters::FakeProvider::new();
    let engine = sp_adapters::FakeEngine::new();
    let transport = sp_adapters::FakeTransport::new();
    let config = crate::lifecycle::Config::for_dir(dir);
    std::fs::write(&config.ssh_pubkey_paths[0], "ssh-ed25519 AAAA test@host\n")
        .expect("write test pubkey");
    let store = sp_store::Store::open_in_memory().expect("open store");
    let tunables = crate::engine::SyncTunables {
        retry_unit: std::time::Duration::from_millis(10),
        wake_delay: std::time::Duration::from_millis(10),
        listen_deadline: std::time::Duration::from_secs(3),
        test_delay: std::time::Duration::from_millis(10),
        kill_grace: std::time::Duration::from_millis(500),
        ..Default::default()
    };
    let daemon = Daemon::new_tuned(
        config,
        store,
        Arc::new(provider.clone()),
        Arc::new(engine.clone()),
        Arc::new(transport.clone()),
        tunables,
    );
    (daemon, provider, engine, transport)
}

#[cfg(test)]
#[path = "../listener_tests.rs"]
mod tests;
