//! Handlers that record what they were given.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bazaar_events::EventHandler;

/// Records every event it handles. Can be told to fail a number of times
/// first, which leaves those events unrecorded.
pub struct Recorder<E> {
    events: Arc<Mutex<Vec<E>>>,
    failures_left: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

impl<E> Clone for Recorder<E> {
    fn clone(&self) -> Self {
        Self {
            events: Arc::clone(&self.events),
            failures_left: Arc::clone(&self.failures_left),
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<E: Clone> Default for Recorder<E> {
    fn default() -> Self {
        Self::failing(0)
    }
}

impl<E: Clone> Recorder<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(times: usize) -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(AtomicUsize::new(times)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn events(&self) -> Vec<E> {
        self.events.lock().unwrap().clone()
    }

    /// Invocations so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<E: Send + 'static> EventHandler<E> for Recorder<E> {
    async fn handle(&self, event: E) -> anyhow::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fail {
            anyhow::bail!("recorder told to fail");
        }
        self.events.lock().unwrap().push(event);
        Ok(())
    }
}
