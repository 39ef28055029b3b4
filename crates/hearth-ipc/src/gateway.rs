// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The registered front-end connection, as an [`OutboundSink`].
//!
//! At most one front-end is registered at a time; a newer registration
//! replaces the older one and cancels its connection.

use std::sync::Mutex;

use async_trait::async_trait;
use hearth_core::{HearthError, OutboundEnvelope, OutboundSink};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::protocol::ServerFrame;

struct Registration {
    id: u64,
    name: Option<String>,
    tx: mpsc::Sender<String>,
    replaced: CancellationToken,
}

#[derive(Default)]
struct State {
    next_id: u64,
    current: Option<Registration>,
}

/// Routes outbound frames to whichever front-end registered last.
#[derive(Default)]
pub struct FrontendGateway {
    state: Mutex<State>,
}

/// Handle a front-end connection keeps while it is registered.
pub struct FrontendHandle {
    pub id: u64,
    /// Cancelled when a newer front-end takes over.
    pub replaced: CancellationToken,
}

impl FrontendGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Makes `tx` the current front-end, displacing any previous one.
    pub fn register(&self, name: Option<String>, tx: mpsc::Sender<String>) -> FrontendHandle {
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        let replaced = CancellationToken::new();

        if let Some(old) = state.current.take() {
            info!(old = old.id, new = id, "front-end registration replaced");
            old.replaced.cancel();
        }
        info!(id, name = name.as_deref().unwrap_or("unnamed"), "front-end registered");
        state.current = Some(Registration {
            id,
            name,
            tx,
            replaced: replaced.clone(),
        });
        FrontendHandle { id, replaced }
    }

    /// Drops the registration if `id` is still the current one.
    pub fn unregister(&self, id: u64) {
        let mut state = self.state();
        if state.current.as_ref().is_some_and(|r| r.id == id) {
            state.current = None;
            debug!(id, "front-end unregistered");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state().current.is_some()
    }

    /// Name the current front-end registered with.
    pub fn frontend_name(&self) -> Option<String> {
        self.state().current.as_ref().and_then(|r| r.name.clone())
    }

    /// Queues the shutdown notice and releases the current front-end.
    ///
    /// Never waits: a front-end whose queue is full misses the notice.
    pub fn shutdown(&self) {
        let Some(registration) = self.state().current.take() else {
            return;
        };
        let line = match ServerFrame::Shutdown.to_line() {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "failed to encode shutdown frame");
                return;
            }
        };
        match registration.tx.try_send(line) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(id = registration.id, "front-end queue full, shutdown notice dropped");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!(id = registration.id, "front-end gone before shutdown notice");
            }
        }
    }

    fn sender(&self) -> Option<mpsc::Sender<String>> {
        self.state().current.as_ref().map(|r| r.tx.clone())
    }
}

#[async_trait]
impl OutboundSink for FrontendGateway {
    async fn push(&self, envelope: OutboundEnvelope) -> Result<(), HearthError> {
        let Some(tx) = self.sender() else {
            return Err(HearthError::Channel {
                message: "no front-end connected".into(),
                source: None,
            });
        };
        let line = ServerFrame::Outbound(envelope)
            .to_line()
            .map_err(|e| HearthError::Channel {
                message: "failed to encode outbound frame".into(),
                source: Some(Box::new(e)),
            })?;
        tx.send(line).await.map_err(|_| HearthError::Channel {
            message: "front-end connection closed".into(),
            source: None,
        })
    }
}
