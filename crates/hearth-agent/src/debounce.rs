// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-chat debounce buffer.
//!
//! Inbound envelopes are collected per `chat_id`. Every arrival restarts that
//! chat's quiet-period timer; once the timer elapses the whole batch is handed
//! to the [`FlushHandler`] in arrival order. Different chats flush
//! concurrently, while flushes of the same chat are serialized by a per-chat
//! lock so a slow handler never sees two overlapping batches for one chat.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use hearth_config::model::DebounceConfig;
use hearth_core::{HearthError, InboundEnvelope};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Receives a chat's accumulated envelopes once it goes quiet.
#[async_trait]
pub trait FlushHandler: Send + Sync {
    async fn flush(&self, chat_id: &str, batch: Vec<InboundEnvelope>) -> Result<(), HearthError>;
}

struct PendingChat {
    envelopes: Vec<InboundEnvelope>,
    /// Bumped on every arrival so a stale timer can tell it lost the race.
    generation: u64,
    timer: JoinHandle<()>,
}

struct Shared {
    delay: Duration,
    max_entries: usize,
    handler: Arc<dyn FlushHandler>,
    pending: Mutex<HashMap<String, PendingChat>>,
    flush_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

/// Debounces inbound envelopes per chat. Cheap to clone.
#[derive(Clone)]
pub struct DebounceBuffer {
    shared: Arc<Shared>,
}

impl DebounceBuffer {
    pub fn new(config: &DebounceConfig, handler: Arc<dyn FlushHandler>) -> Self {
        Self {
            shared: Arc::new(Shared {
                delay: Duration::from_millis(config.debounce_ms),
                max_entries: config.max_entries,
                handler,
                pending: Mutex::new(HashMap::new()),
                flush_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Queues an envelope. Returns `false` when the envelope opens a new chat
    /// while `max_entries` chats are already tracked.
    pub fn add(&self, envelope: InboundEnvelope) -> bool {
        let mut pending = lock(&self.shared.pending);
        let chat_id = envelope.chat_id.clone();

        if let Some(chat) = pending.get_mut(&chat_id) {
            chat.timer.abort();
            chat.generation += 1;
            chat.envelopes.push(envelope);
            chat.timer = self.spawn_timer(chat_id.clone(), chat.generation);
            debug!(chat_id = %chat_id, queued = chat.envelopes.len(), "debounce timer restarted");
            return true;
        }

        if pending.len() >= self.shared.max_entries {
            warn!(
                chat_id = %chat_id,
                max_entries = self.shared.max_entries,
                "debounce buffer full, rejecting message"
            );
            return false;
        }

        let timer = self.spawn_timer(chat_id.clone(), 0);
        pending.insert(
            chat_id,
            PendingChat {
                envelopes: vec![envelope],
                generation: 0,
                timer,
            },
        );
        true
    }

    /// Number of chats with envelopes waiting for their timer.
    pub fn tracked_chats(&self) -> usize {
        lock(&self.shared.pending).len()
    }

    /// Cancels every pending timer and drops the queued envelopes.
    pub fn clear(&self) {
        let mut pending = lock(&self.shared.pending);
        for (_, chat) in pending.drain() {
            chat.timer.abort();
        }
    }

    fn spawn_timer(&self, chat_id: String, generation: u64) -> JoinHandle<()> {
        let shared = self.shared.clone();
        tokio::spawn(async move {
            tokio::time::sleep(shared.delay).await;
            let Some(batch) = shared.take(&chat_id, generation) else {
                return;
            };
            shared.flush(&chat_id, batch).await;
        })
    }
}

impl Shared {
    /// Removes the chat's batch if `generation` is still current.
    fn take(&self, chat_id: &str, generation: u64) -> Option<Vec<InboundEnvelope>> {
        let mut pending = lock(&self.pending);
        match pending.get(chat_id) {
            Some(chat) if chat.generation == generation => {
                pending.remove(chat_id).map(|chat| chat.envelopes)
            }
            _ => None,
        }
    }

    async fn flush(&self, chat_id: &str, batch: Vec<InboundEnvelope>) {
        let flush_lock = lock(&self.flush_locks)
            .entry(chat_id.to_string())
            .or_default()
            .clone();

        {
            let _guard = flush_lock.lock().await;
            debug!(chat_id, count = batch.len(), "flushing debounced batch");
            if let Err(e) = self.handler.flush(chat_id, batch).await {
                error!(chat_id, error = %e, "debounce flush failed");
            }
        }

        // Map entry plus our clone: nobody else is waiting on this chat.
        let mut locks = lock(&self.flush_locks);
        if Arc::strong_count(&flush_lock) == 2 {
            locks.remove(chat_id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
