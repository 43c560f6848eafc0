//! Single-slot debounce scheduler.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Scheduler state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No run is waiting for its quiescence window
    Idle,
    /// A run is scheduled and its timer has not expired yet
    Pending,
}

/// Holds at most one pending task.
///
/// Scheduling replaces whatever is pending and restarts the timer. Once the
/// timer expires the task is detached onto its own tokio task, so a started
/// run can no longer be cancelled and always finishes.
#[derive(Debug)]
pub struct DebounceSlot {
    window: Duration,
    pending: Option<JoinHandle<()>>,
}

impl DebounceSlot {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Schedule `task` to start after the quiescence window, cancelling any
    /// task that has not started yet.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.cancel() {
            log::trace!("Pending regeneration superseded");
        }
        let window = self.window;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            // No await between here and the spawn: once the timer fires the
            // task is out of reach of abort().
            tokio::spawn(task);
        }));
    }

    /// Cancel the pending task. Returns whether one was waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    pub fn phase(&self) -> Phase {
        match &self.pending {
            Some(handle) if !handle.is_finished() => Phase::Pending,
            _ => Phase::Idle,
        }
    }
}

impl Drop for DebounceSlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
