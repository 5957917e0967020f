// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited JSON framing.
//!
//! Every read and write is bounded by the caller's IPC timeout so a
//! stalled peer cannot hold a connection task open forever.

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use sp_core::StateUpdate;

use super::{Request, Response};

/// Errors from frame I/O.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The peer sent bytes that are not a valid request frame. The
    /// connection is closed silently.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("frame is not a request object")]
    NotARequest,

    #[error("timed out")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A frame that is at least shaped like a request: a JSON object with a
/// string `method`. Whether the method exists and the params fit is
/// decided in [`RawRequest::parse`] — an unknown method gets an error
/// *response*, while a malformed frame closes the connection.
#[derive(Debug)]
pub struct RawRequest {
    pub method: String,
    value: serde_json::Value,
}

impl RawRequest {
    pub fn parse(mut self) -> Result<Request, serde_json::Error> {
        // `{"method": "list"}` and `{"method": "list", "params": null}`
        // are the same request on the wire.
        if let Some(map) = self.value.as_object_mut() {
            map.entry("params").or_insert(serde_json::Value::Null);
        }
        serde_json::from_value(self.value)
    }
}

/// Read one request frame within `timeout`. `Ok(None)` is a clean EOF.
pub async fn read_request<R>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Option<RawRequest>, ProtocolError>
where
    R: AsyncBufReadExt + Unpin,
{
    let mut line = String::new();
    let n = tokio::time::timeout(timeout, reader.read_line(&mut line))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    if n == 0 {
        return Ok(None);
    }
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let value: serde_json::Value = serde_json::from_str(trimmed)?;
    let Some(method) = value.get("method").and_then(|m| m.as_str()) else {
        return Err(ProtocolError::NotARequest);
    };
    Ok(Some(RawRequest { method: method.to_string(), value }))
}

pub async fn write_response<W>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, response, timeout).await
}

pub async fn write_update<W>(
    writer: &mut W,
    update: &StateUpdate,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
{
    write_frame(writer, update, timeout).await
}

async fn write_frame<W, T>(
    writer: &mut W,
    frame: &T,
    timeout: Duration,
) -> Result<(), ProtocolError>
where
    W: AsyncWrite + Unpin,
    T: serde::Serialize,
{
    let mut buf = serde_json::to_vec(frame)?;
    buf.push(b'\n');
    tokio::time::timeout(timeout, async {
        writer.write_all(&buf).await?;
        writer.flush().await
    })
    .await
    .map_err(|_| ProtocolError::Timeout)??;
    Ok(())
}
