// SPDX-FileCopyrightText: 2026 Hearth Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Priority admission limiter for model calls.
//!
//! A fixed number of permits is shared by two classes of callers. When
//! permits run out, waiting interactive callers are always served before
//! waiting subagent callers; within a class, waiters are served in arrival
//! order. Permits are RAII guards, so a permit is returned on success,
//! error, panic and cancellation alike.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use hearth_config::model::LimiterConfig;
use tokio::sync::oneshot;
use tracing::trace;

/// Caller class used to order waiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// User-facing conversation turns.
    Interactive,
    /// Background task runs.
    Subagent,
}

struct State {
    available: usize,
    interactive: VecDeque<oneshot::Sender<()>>,
    subagent: VecDeque<oneshot::Sender<()>>,
}

impl State {
    fn queue(&mut self, priority: Priority) -> &mut VecDeque<oneshot::Sender<()>> {
        match priority {
            Priority::Interactive => &mut self.interactive,
            Priority::Subagent => &mut self.subagent,
        }
    }
}

struct Shared {
    capacity: usize,
    state: Mutex<State>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hands the permit to the next live waiter, or returns it to the pool.
    fn release(&self) {
        let mut state = self.state();
        loop {
            let next = match state.interactive.pop_front() {
                Some(tx) => tx,
                None => match state.subagent.pop_front() {
                    Some(tx) => tx,
                    None => break,
                },
            };
            // A closed receiver means that waiter was cancelled; skip it.
            if next.send(()).is_ok() {
                return;
            }
        }
        state.available += 1;
    }
}

/// Bounds concurrent model calls with interactive-first admission.
#[derive(Clone)]
pub struct PriorityLimiter {
    shared: Arc<Shared>,
}

/// A held admission permit, released on drop.
pub struct LimiterPermit {
    shared: Arc<Shared>,
}

impl Drop for LimiterPermit {
    fn drop(&mut self) {
        self.shared.release();
    }
}

/// Pending grant. If dropped after a grant arrived but before it was
/// observed, the grant is passed on instead of leaking.
struct Waiter {
    shared: Arc<Shared>,
    rx: Option<oneshot::Receiver<()>>,
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if let Some(mut rx) = self.rx.take() {
            rx.close();
            if rx.try_recv().is_ok() {
                self.shared.release();
            }
        }
    }
}

impl PriorityLimiter {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                capacity: max_concurrent,
                state: Mutex::new(State {
                    available: max_concurrent,
                    interactive: VecDeque::new(),
                    subagent: VecDeque::new(),
                }),
            }),
        }
    }

    pub fn from_config(config: &LimiterConfig) -> Self {
        Self::new(config.max_concurrent)
    }

    /// Waits for a permit at the given priority.
    pub async fn acquire(&self, priority: Priority) -> LimiterPermit {
        let rx = {
            let mut state = self.shared.state();
            if state.available > 0 {
                state.available -= 1;
                return self.permit();
            }
            let (tx, rx) = oneshot::channel();
            state.queue(priority).push_back(tx);
            rx
        };
        trace!(?priority, "waiting for limiter permit");

        let mut waiter = Waiter {
            shared: self.shared.clone(),
            rx: Some(rx),
        };
        if let Some(rx) = waiter.rx.as_mut() {
            // The sender is only dropped after a successful send or on
            // release, so an error here cannot strand a permit.
            let _ = rx.await;
        }
        waiter.rx = None;
        self.permit()
    }

    /// Runs `fut` while holding an interactive permit.
    pub async fn with_interactive_permit<F: Future>(&self, fut: F) -> F::Output {
        self.with_permit(Priority::Interactive, fut).await
    }

    /// Runs `fut` while holding a subagent permit.
    pub async fn with_subagent_permit<F: Future>(&self, fut: F) -> F::Output {
        self.with_permit(Priority::Subagent, fut).await
    }

    pub async fn with_permit<F: Future>(&self, priority: Priority, fut: F) -> F::Output {
        let _permit = self.acquire(priority).await;
        fut.await
    }

    /// Total permits.
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Permits not currently held.
    pub fn available(&self) -> usize {
        self.shared.state().available
    }

    /// Callers queued for a permit.
    pub fn waiting(&self) -> usize {
        let state = self.shared.state();
        state.interactive.len() + state.subagent.len()
    }

    fn permit(&self) -> LimiterPermit {
        LimiterPermit {
            shared: self.shared.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    async fn until_waiting(limiter: &PriorityLimiter, n: usize) {
        while limiter.waiting() < n {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn concurrency_never_exceeds_capacity() {
        let limiter = PriorityLimiter::new(2);
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for i in 0..6 {
            let limiter = limiter.clone();
            let active = active.clone();
            let peak = peak.clone();
            handles.push(tokio::spawn(async move {
                let work = async {
                    let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    active.fetch_sub(1, Ordering::SeqCst);
                };
                if i % 2 == 0 {
                    limiter.with_interactive_permit(work).await
                } else {
                    limiter.with_subagent_permit(work).await
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(limiter.available(), 2);
    }

    #[tokio::test]
    async fn interactive_overtakes_earlier_subagent() {
        let limiter = PriorityLimiter::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let held = limiter.acquire(Priority::Interactive).await;

        let sub = {
            let (limiter, order) = (limiter.clone(), order.clone());
            tokio::spawn(async move {
                limiter
                    .with_subagent_permit(async { order.lock().unwrap().push("subagent") })
                    .await
            })
        };
        until_waiting(&limiter, 1).await;

        let inter = {
            let (limiter, order) = (limiter.clone(), order.clone());
            tokio::spawn(async move {
                limiter
                    .with_interactive_permit(async { order.lock().unwrap().push("interactive") })
                    .await
            })
        };
        until_waiting(&limiter, 2).await;

        drop(held);
        sub.await.unwrap();
        inter.await.unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["interactive", "subagent"]);
    }

    #[tokio::test]
    async fn same_class_is_fifo() {
        let limiter = PriorityLimiter::new(1);
        let order = Arc::new(Mutex::new(Vec::new()));
        let held = limiter.acquire(Priority::Subagent).await;

        let mut handles = Vec::new();
        for i in 0..3 {
            let (l, order) = (limiter.clone(), order.clone());
            handles.push(tokio::spawn(async move {
                l.with_subagent_permit(async { order.lock().unwrap().push(i) })
                    .await
            }));
            until_waiting(&limiter, i + 1).await;
        }

        drop(held);
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn permit_released_on_error() {
        let limiter = PriorityLimiter::new(1);
        let result: Result<(), &str> = limiter
            .with_interactive_permit(async { Err("provider down") })
            .await;
        assert!(result.is_err());
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn permit_released_on_panic() {
        let limiter = PriorityLimiter::new(1);
        let l = limiter.clone();
        let joined = tokio::spawn(async move {
            l.with_subagent_permit(async { panic!("tool exploded") }).await
        })
        .await;
        assert!(joined.is_err());
        assert_eq!(limiter.available(), 1);
    }

    #[tokio::test]
    async fn cancelled_waiter_does_not_leak_permit() {
        let limiter = PriorityLimiter::new(1);
        let held = limiter.acquire(Priority::Interactive).await;

        let l = limiter.clone();
        let waiter = tokio::spawn(async move { l.acquire(Priority::Subagent).await });
        until_waiting(&limiter, 1).await;
        waiter.abort();
        let _ = waiter.await;

        drop(held);
        assert_eq!(limiter.available(), 1);
        assert_eq!(limiter.waiting(), 0);
    }

    #[tokio::test]
    async fn grant_to_dropped_waiter_is_passed_on() {
        let limiter = PriorityLimiter::new(1);
        let held = limiter.acquire(Priority::Interactive).await;

        // Poll the acquire once so it queues, then release while it is still
        // registered and drop it without observing the grant.
        let mut pending = Box::pin(limiter.acquire(Priority::Subagent));
        assert!(futures::poll!(pending.as_mut()).is_pending());
        drop(held);
        drop(pending);

        assert_eq!(limiter.available(), 1);
    }
}
