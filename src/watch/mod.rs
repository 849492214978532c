//! Key-change watch subsystem.
//!
//! A watch is a client's standing request to be notified exactly once when
//! a covered key changes past a baseline version, or when a deadline
//! passes, whichever happens first. Three triggers race toward a
//! watcher's single response: change dispatch, the expiration sweep and
//! client cancellation; the per-watcher gate in [`Watcher::send`]
//! guarantees at most one of them reaches the session layer.

mod ordering;
mod registry;
mod sweeper;
mod watcher;

pub use ordering::*;
pub use registry::*;
pub use sweeper::*;
pub use watcher::*;

#[cfg(test)]
mod sweeper_test;

// Storage-engine notification
// -----------------------------------------------------------------------------
use crate::WatchEventType;
use crate::WatchResponse;

/// A key-change notification from the storage engine.
///
/// Matching consults only `(table_id, key, version)`; `value` and `extend`
/// are forwarded to the client verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChange {
    pub table_id: u64,
    pub key: Vec<u8>,
    pub version: i64,
    pub value: Vec<u8>,
    pub extend: Vec<u8>,
}

impl WatchResponse {
    /// Response for a watcher whose covered key changed.
    pub fn key_changed(change: &KeyChange) -> Self {
        Self {
            event_type: WatchEventType::KeyChanged as i32,
            table_id: change.table_id,
            key: change.key.clone(),
            value: change.value.clone(),
            version: change.version,
            extend: change.extend.clone(),
        }
    }

    /// Response for a watcher whose deadline elapsed with no matching
    /// change.
    pub fn timed_out(table_id: u64) -> Self {
        Self {
            event_type: WatchEventType::TimedOut as i32,
            table_id,
            ..Default::default()
        }
    }
}
