use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::EventError;

/// A typed event that can travel through the outbox and the bus.
///
/// `EVENT_TYPE` is the discriminator consumers use to pick a factory and
/// `TOPIC` is the default destination. The default codec is JSON; the
/// reconstruction factory for a type is [`Event::decode`].
pub trait Event: Serialize + DeserializeOwned + Send + Sync + 'static {
    const EVENT_TYPE: &'static str;
    const TOPIC: &'static str;

    fn encode(&self) -> Result<Vec<u8>, EventError> {
        serde_json::to_vec(self).map_err(|source| EventError::Encode {
            event_type: Self::EVENT_TYPE,
            source,
        })
    }

    fn decode(bytes: &[u8]) -> Result<Self, EventError> {
        serde_json::from_slice(bytes).map_err(|source| EventError::Decode {
            event_type: Self::EVENT_TYPE.to_owned(),
            source: Box::new(source),
        })
    }
}
