//! Newline-delimited JSON bridge for the host command channel.
//!
//! Reads `CommandEnvelope` lines, routes them through the
//! [`HostCommandServer`](crate::host::channel::HostCommandServer), and writes
//! `ResponseEnvelope` and `EventEnvelope` lines back.
//!
//! When run over stdio, stdout is reserved for the protocol; tracing must go
//! to stderr.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::{Mutex, oneshot};

use crate::error::{QuickSlotError, Result};
use crate::host::channel::{CommandRouter, HostCommandClient, command_channel};
use crate::host::contract::{CommandEnvelope, CommandName, EventEnvelope, ResponseEnvelope};

type SharedWriter<W> = Arc<Mutex<W>>;

/// Run the bridge over the process's stdin and stdout.
pub async fn run_stdio_bridge(router: Arc<CommandRouter>, request_capacity: usize) -> Result<()> {
    run_bridge(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        router,
        request_capacity,
    )
    .await
}

/// Run the bridge until `input` reaches EOF or `runtime.stop` is answered.
///
/// Responses and events share `output`; each line is written and flushed
/// under a lock so they never interleave. Events emitted by the last command
/// are written before this returns.
pub async fn run_bridge<R, W>(
    input: R,
    output: W,
    router: Arc<CommandRouter>,
    request_capacity: usize,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (client, server) = command_channel(request_capacity, router);
    let writer = Arc::new(Mutex::new(output));

    let server_handle = tokio::spawn(server.run());

    let event_writer = Arc::clone(&writer);
    let mut event_rx = client.subscribe_events();
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();
    let event_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                received = event_rx.recv() => match received {
                    Ok(event) => {
                        if forward_event(&event_writer, &event).await.is_err() {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "event forwarder lagged; events dropped");
                    }
                    Err(RecvError::Closed) => return,
                },
                _ = &mut shutdown_rx => break,
            }
        }
        // Routing has stopped; everything left is already buffered.
        loop {
            match event_rx.try_recv() {
                Ok(event) => {
                    if forward_event(&event_writer, &event).await.is_err() {
                        return;
                    }
                }
                Err(TryRecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "event forwarder lagged; events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return,
            }
        }
    });

    let reader_result = run_reader(input, client, Arc::clone(&writer)).await;

    // The server exits once the reader drops its client, after routing the
    // last command.
    let _ = server_handle.await;
    let _ = shutdown_tx.send(());
    let _ = event_handle.await;

    reader_result
}

async fn forward_event<W: AsyncWrite + Unpin>(
    writer: &SharedWriter<W>,
    event: &EventEnvelope,
) -> Result<()> {
    match serde_json::to_string(event) {
        Ok(json) => write_line(writer, &json).await.map_err(|e| {
            tracing::warn!(error = %e, "failed to write event; stopping forwarder");
            e
        }),
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize event; skipping");
            Ok(())
        }
    }
}

async fn run_reader<R, W>(
    mut input: R,
    client: HostCommandClient,
    writer: SharedWriter<W>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = String::new();

    loop {
        line.clear();
        let bytes_read = input
            .read_line(&mut line)
            .await
            .map_err(|e| QuickSlotError::Channel(format!("failed to read command line: {e}")))?;
        if bytes_read == 0 {
            tracing::info!("input closed; shutting down host bridge");
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let envelope: CommandEnvelope = match serde_json::from_str(trimmed) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, raw_line = %trimmed, "unparseable command envelope");
                let response = ResponseEnvelope::error(
                    "parse-error",
                    format!("failed to parse command envelope: {e}"),
                );
                write_response(&writer, &response).await?;
                continue;
            }
        };

        let is_stop = envelope.command == CommandName::RuntimeStop;
        let request_id = envelope.request_id.clone();
        let response = client.send(envelope).await.unwrap_or_else(|e| {
            tracing::error!(error = %e, "host command dispatch failed");
            ResponseEnvelope::error(request_id, format!("dispatch failed: {e}"))
        });
        write_response(&writer, &response).await?;

        if is_stop {
            tracing::info!("runtime.stop received; shutting down host bridge");
            break;
        }
    }

    Ok(())
}

async fn write_response<W: AsyncWrite + Unpin>(
    writer: &SharedWriter<W>,
    response: &ResponseEnvelope,
) -> Result<()> {
    let json = serde_json::to_string(response)
        .map_err(|e| QuickSlotError::Channel(format!("failed to serialize response: {e}")))?;
    write_line(writer, &json).await
}

async fn write_line<W: AsyncWrite + Unpin>(writer: &SharedWriter<W>, json: &str) -> Result<()> {
    let mut w = writer.lock().await;
    w.write_all(json.as_bytes())
        .await
        .map_err(|e| QuickSlotError::Channel(format!("failed to write line: {e}")))?;
    w.write_all(b"\n")
        .await
        .map_err(|e| QuickSlotError::Channel(format!("failed to write newline: {e}")))?;
    w.flush()
        .await
        .map_err(|e| QuickSlotError::Channel(format!("failed to flush output: {e}")))?;
    Ok(())
}
