//! Bus double with scripted publish outcomes.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use bazaar_events::{BusError, EventBus, InMemoryBus, Message, Subscription};

type Hook = Box<dyn Fn(&Message) + Send + Sync>;

/// Publishes go to an [`InMemoryBus`] unless a scripted failure is queued.
///
/// Successful publishes are recorded and can be inspected with
/// [`ScriptedBus::published`]. Subscriptions are served by the inner bus.
#[derive(Clone, Default)]
pub struct ScriptedBus {
    inner: InMemoryBus,
    state: Arc<State>,
}

#[derive(Default)]
struct State {
    script: Mutex<VecDeque<fn() -> BusError>>,
    published: Mutex<Vec<Message>>,
    attempts: Mutex<usize>,
    hook: Mutex<Option<Hook>>,
}

impl ScriptedBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bus whose next `times` publishes fail with a retryable error.
    pub fn failing(times: usize) -> Self {
        let bus = Self::new();
        bus.fail_next(times);
        bus
    }

    pub fn inner(&self) -> &InMemoryBus {
        &self.inner
    }

    /// Queue `times` broker-unavailable failures.
    pub fn fail_next(&self, times: usize) {
        self.fail_next_with(times, || {
            BusError::Unavailable(anyhow::anyhow!("connection refused"))
        });
    }

    pub fn fail_next_with(&self, times: usize, error: fn() -> BusError) {
        let mut script = self.state.script.lock().unwrap();
        script.extend(std::iter::repeat_n(error, times));
    }

    /// Run `hook` on every publish attempt, before the outcome is decided.
    pub fn on_publish(&self, hook: impl Fn(&Message) + Send + Sync + 'static) {
        *self.state.hook.lock().unwrap() = Some(Box::new(hook));
    }

    /// Messages accepted so far, in publish order.
    pub fn published(&self) -> Vec<Message> {
        self.state.published.lock().unwrap().clone()
    }

    /// Publish calls so far, including failed ones.
    pub fn attempts(&self) -> usize {
        *self.state.attempts.lock().unwrap()
    }
}

impl EventBus for ScriptedBus {
    async fn publish(&self, topic: &str, event_type: &str, payload: &[u8]) -> Result<(), BusError> {
        let message = Message::new(topic, event_type, payload.to_vec());
        *self.state.attempts.lock().unwrap() += 1;
        if let Some(hook) = self.state.hook.lock().unwrap().as_ref() {
            hook(&message);
        }

        let scripted = self.state.script.lock().unwrap().pop_front();
        if let Some(error) = scripted {
            return Err(error());
        }

        self.inner.publish(topic, event_type, payload).await?;
        self.state.published.lock().unwrap().push(message);
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, BusError> {
        self.inner.subscribe(topic).await
    }
}
