//! Typed handler registry and dispatcher.
//!
//! Handlers are registered per `(topic, event_type)` during startup. Each
//! binding pairs a factory that rebuilds the concrete event from raw bytes with
//! a handler for that type, so the type check happens once at registration and
//! dispatch itself is a map lookup. The registry is then frozen into an
//! immutable [`Dispatcher`] that can be shared across consumer tasks.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::warn;

use crate::bus::{Message, Settlement};
use crate::contract::Event;
use crate::error::{EventError, RegistryError};

/// Handles one concrete event type.
///
/// Plain async closures `Fn(E) -> impl Future<Output = anyhow::Result<()>>`
/// implement this trait.
pub trait EventHandler<E>: Send + Sync + 'static {
    fn handle(&self, event: E) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<E, F, Fut> EventHandler<E> for F
where
    E: Send + 'static,
    F: Fn(E) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send,
{
    fn handle(&self, event: E) -> impl Future<Output = anyhow::Result<()>> + Send {
        self(event)
    }
}

enum HandlerFailure {
    Decode(EventError),
    Handler(anyhow::Error),
}

trait ErasedHandler: Send + Sync {
    fn call<'a>(&'a self, payload: &'a [u8]) -> BoxFuture<'a, Result<(), HandlerFailure>>;
}

struct Binding<E, F, H> {
    factory: F,
    handler: H,
    _event: PhantomData<fn() -> E>,
}

impl<E, F, H> ErasedHandler for Binding<E, F, H>
where
    E: Send + 'static,
    F: Fn(&[u8]) -> Result<E, EventError> + Send + Sync + 'static,
    H: EventHandler<E>,
{
    fn call<'a>(&'a self, payload: &'a [u8]) -> BoxFuture<'a, Result<(), HandlerFailure>> {
        Box::pin(async move {
            let event = (self.factory)(payload).map_err(HandlerFailure::Decode)?;
            self.handler.handle(event).await.map_err(HandlerFailure::Handler)
        })
    }
}

type Bindings = HashMap<String, HashMap<String, Arc<dyn ErasedHandler>>>;

/// Mutable registration phase.
#[derive(Default)]
pub struct HandlerRegistry {
    bindings: Bindings,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `E` on the event's default topic.
    pub fn register<E, H>(&mut self, handler: H) -> Result<&mut Self, RegistryError>
    where
        E: Event,
        H: EventHandler<E>,
    {
        self.register_on::<E, H>(E::TOPIC, handler)
    }

    /// Register `handler` for `E` on an explicit topic.
    pub fn register_on<E, H>(&mut self, topic: &str, handler: H) -> Result<&mut Self, RegistryError>
    where
        E: Event,
        H: EventHandler<E>,
    {
        self.register_with_factory(topic, E::EVENT_TYPE, |bytes: &[u8]| E::decode(bytes), handler)
    }

    /// Register a handler with a custom factory that rebuilds the event from
    /// raw payload bytes.
    pub fn register_with_factory<E, F, H>(
        &mut self,
        topic: &str,
        event_type: &str,
        factory: F,
        handler: H,
    ) -> Result<&mut Self, RegistryError>
    where
        E: Send + 'static,
        F: Fn(&[u8]) -> Result<E, EventError> + Send + Sync + 'static,
        H: EventHandler<E>,
    {
        if topic.trim().is_empty() {
            return Err(RegistryError::InvalidArgument("topic must not be empty".into()));
        }
        if event_type.trim().is_empty() {
            return Err(RegistryError::InvalidArgument(
                "event type must not be empty".into(),
            ));
        }

        let by_type = self.bindings.entry(topic.to_owned()).or_default();
        if by_type.contains_key(event_type) {
            return Err(RegistryError::DuplicateHandler {
                topic: topic.to_owned(),
                event_type: event_type.to_owned(),
            });
        }

        by_type.insert(
            event_type.to_owned(),
            Arc::new(Binding {
                factory,
                handler,
                _event: PhantomData,
            }),
        );
        Ok(self)
    }

    /// Topics with at least one handler, sorted.
    pub fn topics(&self) -> Vec<String> {
        sorted_topics(&self.bindings)
    }

    pub fn len(&self) -> usize {
        self.bindings.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_dispatcher(self) -> Dispatcher {
        Dispatcher {
            bindings: Arc::new(self.bindings),
        }
    }
}

fn sorted_topics(bindings: &Bindings) -> Vec<String> {
    let mut topics: Vec<String> = bindings.keys().cloned().collect();
    topics.sort();
    topics
}

/// Outcome of dispatching one message.
#[derive(Debug)]
pub enum Disposition {
    Handled,
    /// No handler for this `(topic, event_type)`. Skipped, not an error.
    UnknownEventType,
    /// The factory could not rebuild the event. Redelivery would not help.
    Malformed(EventError),
    /// The handler failed and the message should be delivered again.
    Failed(anyhow::Error),
}

impl Disposition {
    pub fn should_ack(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn settlement(&self) -> Settlement {
        if self.should_ack() {
            Settlement::Ack
        } else {
            Settlement::Nack
        }
    }
}

/// Frozen, shareable view of a [`HandlerRegistry`].
#[derive(Clone)]
pub struct Dispatcher {
    bindings: Arc<Bindings>,
}

impl Dispatcher {
    pub fn topics(&self) -> Vec<String> {
        sorted_topics(&self.bindings)
    }

    pub fn handles(&self, topic: &str, event_type: &str) -> bool {
        self.binding(topic, event_type).is_some()
    }

    fn binding(&self, topic: &str, event_type: &str) -> Option<&Arc<dyn ErasedHandler>> {
        self.bindings.get(topic)?.get(event_type)
    }

    pub async fn dispatch(&self, message: &Message) -> Disposition {
        let Some(binding) = self.binding(&message.topic, &message.event_type) else {
            warn!(
                topic = %message.topic,
                event_type = %message.event_type,
                "no handler registered, skipping"
            );
            return Disposition::UnknownEventType;
        };

        match binding.call(&message.payload).await {
            Ok(()) => Disposition::Handled,
            Err(HandlerFailure::Decode(e)) => {
                warn!(
                    topic = %message.topic,
                    event_type = %message.event_type,
                    error = %e,
                    "failed to decode payload, skipping"
                );
                Disposition::Malformed(e)
            }
            Err(HandlerFailure::Handler(e)) => {
                warn!(
                    topic = %message.topic,
                    event_type = %message.event_type,
                    redelivered = message.redelivered,
                    error = %e,
                    "handler failed"
                );
                Disposition::Failed(e)
            }
        }
    }
}
