//! Line-delimited JSON transport: one request object per input line, one envelope
//! per output line, in input order.

use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::errors::QueryError;
use crate::query::RawRequest;
use crate::response::ResponseEnvelope;
use crate::service::QueryService;

const IN_FLIGHT: usize = 64;

/// Serializes an envelope, falling back to an error envelope if a document cannot be
/// represented as JSON.
#[must_use]
pub fn envelope_line(env: &ResponseEnvelope) -> String {
    serde_json::to_string(env).unwrap_or_else(|e| {
        let fallback = ResponseEnvelope::Err { message: format!("Serialization failure: {e}") };
        serde_json::to_string(&fallback).unwrap_or_else(|_| "{\"success\":false}".to_string())
    })
}

/// Parses and runs a single request line.
pub async fn handle_line(service: &QueryService, line: &str) -> ResponseEnvelope {
    match RawRequest::from_json_str(line) {
        Ok(raw) => service.handle(raw).await,
        Err(e) => {
            log::warn!(target: crate::service::AUDIT_TARGET, "outcome=error kind={} message=\"{e}\"", e.kind());
            ResponseEnvelope::error(&e)
        }
    }
}

/// Reads requests until EOF. Up to `IN_FLIGHT` requests run concurrently; responses
/// are written in the order the requests arrived. Blank lines are ignored.
///
/// # Errors
/// Returns an I/O error from the reader or writer.
pub async fn serve_lines<R, W>(service: Arc<QueryService>, reader: R, mut writer: W) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<JoinHandle<ResponseEnvelope>>(IN_FLIGHT);

    let writer_task = tokio::spawn(async move {
        let mut written = 0u64;
        while let Some(handle) = rx.recv().await {
            let env = match handle.await {
                Ok(env) => env,
                Err(e) => ResponseEnvelope::error(&QueryError::from(e)),
            };
            let mut line = envelope_line(&env);
            line.push('\n');
            writer.write_all(line.as_bytes()).await?;
            written += 1;
        }
        writer.flush().await?;
        Ok::<u64, std::io::Error>(written)
    });

    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let service = Arc::clone(&service);
        let handle = tokio::spawn(async move { handle_line(&service, &line).await });
        if tx.send(handle).await.is_err() {
            break;
        }
    }
    drop(tx);

    writer_task.await.map_err(std::io::Error::other)?
}
