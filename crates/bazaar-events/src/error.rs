/// Failure to turn an event into bytes or bytes back into an event.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to encode {event_type}")]
    Encode {
        event_type: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode {event_type}")]
    Decode {
        event_type: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl EventError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Encode { .. } => "ENCODE",
            Self::Decode { .. } => "DECODE",
        }
    }
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum BusError {
    /// The message can never be delivered as-is (empty topic, bad encoding, ...).
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("broker unavailable: {0:#}")]
    Unavailable(#[source] anyhow::Error),
    #[error("bus closed")]
    Closed,
}

impl BusError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Malformed(_) => "MALFORMED",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Closed => "CLOSED",
        }
    }

    /// Whether publishing the same message again later may succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Malformed(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("handler already registered for {event_type} on topic {topic}")]
    DuplicateHandler { topic: String, event_type: String },
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl RegistryError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateHandler { .. } => "DUPLICATE_HANDLER",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}
