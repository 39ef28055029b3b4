// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unix socket server.
//!
//! Accepts connections on a `0600` socket, classifies each by its first
//! line, and serves it until the peer leaves or shutdown is requested. The
//! accept loop and every connection task share one cancellation token and
//! one task tracker, so shutdown stops them together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, Stream, StreamExt};
use hearth_agent::{DebounceBuffer, Pipeline};
use hearth_config::model::IpcConfig;
use hearth_core::HearthError;
use serde_json::Value;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::mpsc;
use tokio_util::codec::{Framed, LinesCodecError};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::codec::{Frame, FrameCodec};
use crate::commands::CommandRegistry;
use crate::gateway::FrontendGateway;
use crate::protocol::{
    ClientFrame, FrontendCommand, Opening, OperatorRequest, classify_opening, error_line,
    progress_line, result_line,
};

/// How long shutdown waits for connection tasks to finish.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Outbound frames buffered per front-end before pushes wait.
const FRONTEND_QUEUE: usize = 64;

type Lines = Framed<UnixStream, FrameCodec>;

/// Everything connection handlers need.
pub struct ServerState {
    pub buffer: DebounceBuffer,
    pub pipeline: Arc<Pipeline>,
    pub gateway: Arc<FrontendGateway>,
    pub commands: CommandRegistry,
}

/// The IPC server over a bound listener.
pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    max_line_bytes: usize,
    state: Arc<ServerState>,
}

impl IpcServer {
    /// Binds the socket, replacing a stale socket file and restricting it to
    /// the owner.
    pub async fn bind(config: &IpcConfig, state: Arc<ServerState>) -> Result<Self, HearthError> {
        let socket_path = PathBuf::from(&config.socket_path);
        if let Some(parent) = socket_path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| channel_io(format!("failed to create {}", parent.display()), e))?;
        }
        remove_stale(&socket_path).await?;

        let listener = UnixListener::bind(&socket_path).map_err(|e| {
            channel_io(format!("failed to bind {}", socket_path.display()), e)
        })?;
        restrict_permissions(&socket_path).await?;
        info!(path = %socket_path.display(), "IPC server listening");

        Ok(Self {
            listener,
            socket_path,
            max_line_bytes: config.max_line_bytes,
            state,
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Serves connections until `shutdown` is cancelled, then notifies the
    /// front-end, drains connection tasks and removes the socket file.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), HearthError> {
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _)) => {
                        let state = self.state.clone();
                        let cancel = shutdown.child_token();
                        let codec = FrameCodec::new(self.max_line_bytes);
                        tracker.spawn(async move {
                            handle_connection(Framed::new(stream, codec), state, cancel).await;
                        });
                    }
                    Err(e) => warn!(error = %e, "failed to accept IPC connection"),
                },
            }
        }

        info!("IPC server shutting down");
        self.state.gateway.shutdown();
        self.state.buffer.clear();
        tracker.close();
        if tokio::time::timeout(DRAIN_TIMEOUT, tracker.wait()).await.is_err() {
            warn!(remaining = tracker.len(), "connection tasks still running at shutdown");
        }

        drop(self.listener);
        if let Err(e) = tokio::fs::remove_file(&self.socket_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %self.socket_path.display(), error = %e, "failed to remove socket file");
        }
        info!("IPC server stopped");
        Ok(())
    }
}

async fn remove_stale(path: &Path) -> Result<(), HearthError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale socket file");
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(channel_io(format!("failed to remove stale {}", path.display()), e)),
    }
}

#[cfg(unix)]
async fn restrict_permissions(path: &Path) -> Result<(), HearthError> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .await
        .map_err(|e| channel_io(format!("failed to set permissions on {}", path.display()), e))
}

#[cfg(not(unix))]
async fn restrict_permissions(_path: &Path) -> Result<(), HearthError> {
    Ok(())
}

fn channel_io(message: String, e: std::io::Error) -> HearthError {
    HearthError::Channel {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Reads the next complete line, skipping oversized ones.
async fn next_line<S>(lines: &mut S) -> Option<String>
where
    S: Stream<Item = Result<Frame, LinesCodecError>> + Unpin,
{
    loop {
        match lines.next().await? {
            Ok(Frame::Line(line)) => return Some(line),
            Ok(Frame::Oversized) => warn!("dropping oversized IPC line"),
            Err(e) => {
                debug!(error = %e, "IPC read failed");
                return None;
            }
        }
    }
}

async fn handle_connection(mut lines: Lines, state: Arc<ServerState>, cancel: CancellationToken) {
    let first = tokio::select! {
        _ = cancel.cancelled() => return,
        line = next_line(&mut lines) => line,
    };
    let Some(first) = first else {
        return;
    };

    match classify_opening(&first) {
        Ok(Opening::Frontend(name)) => serve_frontend(lines, name, state, cancel).await,
        Ok(Opening::Operator(request)) => serve_operator(lines, request, state).await,
        Err(message) => {
            warn!(%message, "rejecting IPC connection");
            let _ = lines.send(error_line(&message)).await;
        }
    }
}

async fn serve_frontend(
    lines: Lines,
    name: Option<String>,
    state: Arc<ServerState>,
    cancel: CancellationToken,
) {
    let (mut sink, mut stream) = lines.split();
    let (tx, mut rx) = mpsc::channel::<String>(FRONTEND_QUEUE);
    let handle = state.gateway.register(name, tx);

    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(e) = sink.send(line).await {
                debug!(error = %e, "front-end write failed");
                break;
            }
        }
    });

    loop {
        let line = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = handle.replaced.cancelled() => break,
            line = next_line(&mut stream) => line,
        };
        match line {
            Some(line) => handle_client_line(&line, &state).await,
            None => break,
        }
    }

    // On shutdown the server releases the registration itself, after queueing
    // the shutdown notice.
    if !cancel.is_cancelled() {
        state.gateway.unregister(handle.id);
    }
    // The writer ends once the gateway's sender is gone, after flushing any
    // queued frames such as the shutdown notice.
    if tokio::time::timeout(DRAIN_TIMEOUT, writer).await.is_err() {
        warn!(id = handle.id, "front-end writer did not finish");
    }
    info!(id = handle.id, "front-end disconnected");
}

async fn handle_client_line(line: &str, state: &ServerState) {
    let frame: ClientFrame = match serde_json::from_str(line) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "invalid front-end frame");
            return;
        }
    };

    match frame {
        ClientFrame::Inbound(envelope) => {
            let chat_id = envelope.chat_id.clone();
            if !state.buffer.add(envelope) {
                warn!(chat_id = %chat_id, "inbound message rejected by debounce buffer");
            }
        }
        ClientFrame::Command(command) => run_frontend_command(command, state).await,
        ClientFrame::Register { .. } => debug!("ignoring repeated register frame"),
    }
}

async fn run_frontend_command(command: FrontendCommand, state: &ServerState) {
    let chat_id = command.chat_id.as_str();
    let outcome = match command.command.as_str() {
        "reset" => state.pipeline.reset_segment(chat_id).await.map(|_| ()),
        "set_model" => match command.params.get("model").and_then(Value::as_str) {
            Some(model) => state.pipeline.set_model(chat_id, model).await,
            None => Err(HearthError::Config("set_model requires a `model` param".into())),
        },
        other => {
            warn!(command = other, chat_id, "unknown front-end command");
            return;
        }
    };
    if let Err(e) = outcome {
        error!(command = %command.command, chat_id, error = %e, "front-end command failed");
    }
}

async fn serve_operator(mut lines: Lines, request: OperatorRequest, state: Arc<ServerState>) {
    let (progress_tx, mut progress_rx) = mpsc::channel::<String>(32);
    let command = request.command.clone();

    let run = state
        .commands
        .dispatch(&request.command, request.params, progress_tx);
    tokio::pin!(run);

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            Some(progress) = progress_rx.recv() => {
                if lines.send(progress_line(&progress)).await.is_err() {
                    return;
                }
            }
        }
    };
    while let Ok(progress) = progress_rx.try_recv() {
        if lines.send(progress_line(&progress)).await.is_err() {
            return;
        }
    }

    let response = match outcome {
        Ok(result) => result_line(result),
        Err(e) => {
            warn!(command = %command, error = %e, "operator command failed");
            error_line(&e.to_string())
        }
    };
    if let Err(e) = lines.send(response).await {
        debug!(error = %e, "operator went away before the response");
    }
}
