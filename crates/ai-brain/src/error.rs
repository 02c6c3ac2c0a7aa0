use thiserror::Error;

/// Misuse of a [`MemoryStore`](crate::MemoryStore). Always a wiring bug in the agent type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error("memory key `{key}` is not registered for this brain")]
    Unregistered { key: &'static str },

    #[error("memory key `{key}` holds `{stored}`, not `{requested}`")]
    TypeMismatch {
        key: &'static str,
        stored: &'static str,
        requested: &'static str,
    },
}

/// Structural errors raised while building or wiring a brain.
#[derive(Debug, Error)]
pub enum BrainError {
    #[error("{context} refers to unregistered memory key `{key}`")]
    UnregisteredKey { context: String, key: &'static str },

    #[error("memory key id {id} registered as both `{first}` and `{second}`")]
    ConflictingKey {
        id: u64,
        first: String,
        second: String,
    },

    #[error("activity `{activity}` cannot number {count} behaviors from priority {start}")]
    PriorityOverflow {
        activity: String,
        start: u32,
        count: usize,
    },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// A persisted memory entry that could not be restored. Decoding skips it and continues.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("persisted entry `{key}` has no codec")]
    UnknownKey { key: String },

    #[error("persisted entry `{key}` is not registered on this brain")]
    NotRegistered { key: String },

    #[error("persisted entry `{key}` is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, BrainError>;
