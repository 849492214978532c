//! Watch Subsystem Error Hierarchy
//!
//! Defines error types for the key-change watch subsystem,
//! categorized by protocol layer and operational concerns.

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Wire framing failures for watched keys and values
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Per-watcher admission and delivery failures
    #[error(transparent)]
    Watch(#[from] WatchError),

    /// Registry bookkeeping failures
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodecError {
    /// Truncated buffer, inconsistent length prefix or trailing bytes
    #[error("malformed watch buffer: {0}")]
    MalformedInput(&'static str),

    /// A key record frames at least one key
    #[error("empty key list")]
    EmptyKeys,
}

#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Rejected at admission, never reaches the registry
    #[error("watch request contains no keys")]
    EmptyKeys,

    /// Lookup probes carry no request context and are never delivered to
    #[error("probe watcher is not deliverable")]
    ProbeNotDeliverable,

    /// The registry assigns a watcher id exactly once
    #[error("watcher id {0} already assigned")]
    IdAlreadyAssigned(u64),

    /// The client connection behind the pending request is gone
    #[error("session {session_id} is gone")]
    SessionGone { session_id: u64 },

    /// The pending reply slot was already consumed
    #[error("reply already transmitted")]
    ReplyAlreadyTransmitted,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("probe watchers cannot be registered")]
    ProbeRegistration,

    #[error("watcher {0} not found")]
    NotFound(u64),

    #[error("watch covers {count} keys, limit is {limit}")]
    TooManyKeys { count: usize, limit: usize },
}
