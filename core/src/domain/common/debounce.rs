use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::AbortHandle;

/// Runs a callback once `delay` has elapsed without a newer call.
///
/// Each `call` supersedes the pending one, so only the last callback of a
/// burst fires. Must be used from inside a tokio runtime.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    pending: Arc<Mutex<Option<AbortHandle>>>,
}

/// Cancels one scheduled callback.
#[derive(Debug, Clone)]
pub struct DebounceHandle {
    abort: AbortHandle,
}

impl DebounceHandle {
    pub fn cancel(&self) {
        self.abort.abort();
    }
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(None)),
        }
    }

    pub fn call<F>(&self, callback: F) -> DebounceHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let delay = self.delay;
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
        });
        let abort = task.abort_handle();

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.replace(abort.clone()) {
            previous.abort();
        }

        DebounceHandle { abort }
    }

    /// Drops whatever callback is still waiting.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }
}
