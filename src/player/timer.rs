//! Auto-advance timer
//!
//! A single delayed action on the tokio runtime. Arming replaces whatever
//! was pending; cancelling or dropping the timer guarantees the action
//! never runs.

use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct PendingAdvance {
    task: JoinHandle<()>,
    live: Arc<AtomicBool>,
}

impl PendingAdvance {
    fn cancel(self) {
        // The flag covers a task that already left its sleep on another worker
        self.live.store(false, Ordering::SeqCst);
        self.task.abort();
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst) && !self.task.is_finished()
    }
}

/// Cancellable delayed action, at most one pending at a time
pub struct AutoAdvanceTimer {
    delay: Duration,
    pending: Option<PendingAdvance>,
}

impl AutoAdvanceTimer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `action` after the grace delay, replacing any pending one
    ///
    /// Returns false when called outside a tokio runtime; nothing is
    /// scheduled in that case.
    pub fn arm<F>(&mut self, action: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.cancel();

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Auto-advance unavailable without a runtime: {}", e);
                return false;
            }
        };

        let live = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&live);
        let delay = self.delay;
        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if flag.swap(false, Ordering::SeqCst) {
                action();
            }
        });

        debug!("Auto-advance armed for {:?}", delay);
        self.pending = Some(PendingAdvance { task, live });
        true
    }

    /// Drop the pending action. Returns true if one was still waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) => {
                let was_live = pending.is_live();
                pending.cancel();
                if was_live {
                    debug!("Auto-advance cancelled");
                }
                was_live
            }
            None => false,
        }
    }

    /// Whether an action is scheduled and has not fired yet
    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(PendingAdvance::is_live)
    }
}

impl Drop for AutoAdvanceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for AutoAdvanceTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoAdvanceTimer")
            .field("delay", &self.delay)
            .field("pending", &self.is_pending())
            .finish()
    }
}
