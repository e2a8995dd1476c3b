use bazaar_events::EventError;

#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    /// Caller misuse: the record can never be written as given.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to serialize event")]
    Serialization(#[from] EventError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl OutboxError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Serialization(_) => "SERIALIZATION",
            Self::Storage(_) => "STORAGE",
        }
    }
}
