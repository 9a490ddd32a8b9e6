//! Outstanding-work tracking for graceful shutdown.
//!
//! # Responsibilities
//! - Count asynchronous work registered by handlers
//! - Let the server wait until the count reaches zero
//!
//! # Design Decisions
//! - RAII guard is the primary API; manual add/done kept for callers that
//!   hand completion to another owner
//! - Waiters are woken through `Notify`, no polling

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Shared counter of outstanding work, similar to a wait group.
#[derive(Debug, Clone, Default)]
pub struct InFlight {
    inner: Arc<Inner>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `n` units of work.
    pub fn add(&self, n: usize) {
        self.inner.count.fetch_add(n, Ordering::SeqCst);
    }

    /// Complete one unit of work.
    ///
    /// Calling `done` more often than `add` saturates at zero and logs.
    pub fn done(&self) {
        let previous = self
            .inner
            .count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |c| c.checked_sub(1));

        match previous {
            Ok(1) => self.inner.idle.notify_waiters(),
            Ok(_) => {}
            Err(_) => tracing::warn!("InFlight::done called with no outstanding work"),
        }
    }

    /// Register one unit of work, completed when the guard drops.
    pub fn track(&self) -> InFlightGuard {
        self.add(1);
        InFlightGuard {
            tracker: self.clone(),
        }
    }

    /// Current number of outstanding units.
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::SeqCst)
    }

    /// Wait until no work is outstanding.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // Register interest before re-checking to avoid a lost wakeup.
            notified.as_mut().enable();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }

    /// Wait until idle or the deadline passes. Returns `true` when idle.
    pub async fn wait_idle_timeout(&self, deadline: Duration) -> bool {
        tokio::time::timeout(deadline, self.wait_idle()).await.is_ok()
    }
}

/// Completes one unit of [`InFlight`] work on drop.
#[derive(Debug)]
pub struct InFlightGuard {
    tracker: InFlight,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.tracker.done();
    }
}
