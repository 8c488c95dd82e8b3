use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
struct Slot {
    /// Bumped by every schedule and cancel
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Cancellable delayed action
///
/// Each [`schedule`](Self::schedule) replaces the pending action and restarts
/// the quiet period. Only the wait is cancellable: once the delay elapses the
/// action runs as its own task and is never aborted. Dropping the debouncer
/// cancels whatever is still waiting.
///
/// A timer only starts its action while its generation is still current,
/// checked under the slot lock, so a replaced action never runs even when
/// its timer fires on another worker thread.
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Default)]
pub struct Debouncer {
    slot: Arc<Mutex<Slot>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `action` after `delay` unless rescheduled or cancelled first
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        let generation = slot.generation;

        let shared = self.slot.clone();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let current = shared.lock();
            if current.generation == generation {
                tokio::spawn(action);
            }
        });

        if let Some(previous) = slot.timer.replace(timer) {
            previous.abort();
        }
    }

    /// Cancel the pending action. Returns whether one was still waiting.
    pub fn cancel(&self) -> bool {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        match slot.timer.take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.slot
            .lock()
            .timer
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        let mut slot = self.slot.lock();
        slot.generation += 1;
        if let Some(handle) = slot.timer.take() {
            handle.abort();
        }
    }
}
