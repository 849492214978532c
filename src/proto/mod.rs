//! Wire message types shared with the outer protocol layer.
//!
//! The session layer owns the full RPC schema; this module maintains only
//! the watch slice of it. Definitions are kept in sync with the server's
//! `rpc_service.proto` by hand since this subsystem never compiles the
//! full schema.

use serde::Deserialize;
use serde::Serialize;

/// The single response a watcher eventually delivers to its client.
#[derive(Clone, PartialEq, Serialize, Deserialize, ::prost::Message)]
pub struct WatchResponse {
    #[prost(enumeration = "WatchEventType", tag = "1")]
    pub event_type: i32,
    #[prost(uint64, tag = "2")]
    pub table_id: u64,
    #[prost(bytes = "vec", tag = "3")]
    pub key: Vec<u8>,
    #[prost(bytes = "vec", tag = "4")]
    pub value: Vec<u8>,
    #[prost(int64, tag = "5")]
    pub version: i64,
    #[prost(bytes = "vec", tag = "6")]
    pub extend: Vec<u8>,
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ::prost::Enumeration,
)]
#[repr(i32)]
pub enum WatchEventType {
    /// A covered key changed past the watcher's baseline version
    KeyChanged = 0,
    /// The deadline elapsed before any matching change
    TimedOut = 1,
}
