//! The watch registration entity.
//!
//! One `Watcher` owns everything needed to complete a single watch: the
//! covered keys, the version baseline, the deadline and the pending client
//! request. It also owns the exactly-once delivery guarantee for itself:
//! change dispatch, the expiration sweep and cancellation all funnel
//! through the same atomic gate, so concurrent triggers race safely and
//! exactly one transmits.

use std::fmt::Debug;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;
use tonic::Status;

use super::KeyChange;
use crate::constants::UNASSIGNED_WATCHER_ID;
use crate::Error;
use crate::RequestContext;
use crate::Result;
use crate::WatchError;
use crate::WatchReply;
use crate::WatchResponse;

/// Registry-assigned watcher identifier; `0` means "not yet admitted".
pub type WatcherId = u64;

/// Whether a watch covers exact keys or prefix ranges.
///
/// Decided once at construction; in [`WatchMode::Prefix`] every entry of
/// the key sequence is treated as a range prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMode {
    Key,
    Prefix,
}

/// Outcome of racing a reply through the exactly-once gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// This caller won the race; the reply went to the session layer
    Delivered,
    /// Another trigger already completed the watcher; no-op
    AlreadyCompleted,
}

pub struct Watcher {
    table_id: u64,
    keys: Vec<Vec<u8>>,
    mode: WatchMode,
    key_version: i64,
    watcher_id: AtomicU64,
    expire_time: i64,
    probe: bool,
    context: Mutex<Option<Box<dyn RequestContext>>>,
    sent_response: AtomicBool,
}

impl Debug for Watcher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Watcher")
            .field("table_id", &self.table_id)
            .field("mode", &self.mode)
            .field("watcher_id", &self.watcher_id())
            .field("expire_time", &self.expire_time)
            .finish()
    }
}

impl Watcher {
    /// Exact-key watch over `keys` in `table_id`, completing with a
    /// timeout response at `expire_time` (milliseconds) unless a change
    /// wins first.
    pub fn new(
        table_id: u64,
        keys: Vec<Vec<u8>>,
        key_version: i64,
        context: Box<dyn RequestContext>,
        expire_time: i64,
    ) -> Result<Self> {
        Self::with_mode(WatchMode::Key, table_id, keys, key_version, context, expire_time)
    }

    /// Watch with an explicit mode.
    pub fn with_mode(
        mode: WatchMode,
        table_id: u64,
        keys: Vec<Vec<u8>>,
        key_version: i64,
        context: Box<dyn RequestContext>,
        expire_time: i64,
    ) -> Result<Self> {
        Self::build(mode, table_id, keys, key_version, Some(context), expire_time, false)
    }

    /// Lookup-only comparison object: no request context, no deadline.
    ///
    /// Never deliverable and rejected by registry insertion; useful only
    /// for comparing against live watchers.
    pub fn probe(
        table_id: u64,
        keys: Vec<Vec<u8>>,
    ) -> Result<Self> {
        Self::build(WatchMode::Key, table_id, keys, 0, None, 0, true)
    }

    fn build(
        mode: WatchMode,
        table_id: u64,
        keys: Vec<Vec<u8>>,
        key_version: i64,
        context: Option<Box<dyn RequestContext>>,
        expire_time: i64,
        probe: bool,
    ) -> Result<Self> {
        // Every covered key is a non-empty byte string
        if keys.is_empty() || keys.iter().any(|key| key.is_empty()) {
            return Err(WatchError::EmptyKeys.into());
        }
        Ok(Self {
            table_id,
            keys,
            mode,
            key_version,
            watcher_id: AtomicU64::new(UNASSIGNED_WATCHER_ID),
            expire_time,
            probe,
            context: Mutex::new(context),
            sent_response: AtomicBool::new(false),
        })
    }

    pub fn table_id(&self) -> u64 {
        self.table_id
    }

    /// Read-only view of the covered keys; immutable post-construction.
    pub fn keys(&self) -> &[Vec<u8>] {
        &self.keys
    }

    pub fn mode(&self) -> WatchMode {
        self.mode
    }

    pub fn key_version(&self) -> i64 {
        self.key_version
    }

    pub fn expire_time(&self) -> i64 {
        self.expire_time
    }

    pub fn is_probe(&self) -> bool {
        self.probe
    }

    pub fn is_expired(
        &self,
        now_ms: i64,
    ) -> bool {
        !self.probe && self.expire_time <= now_ms
    }

    /// Session id of the pending request, until delivery consumes it.
    pub fn session_id(&self) -> Option<u64> {
        self.context.lock().as_ref().map(|context| context.session_id())
    }

    /// Registry bookkeeping id; assigned at most once, before the watcher
    /// is shared with any other thread.
    pub fn assign_id(
        &self,
        id: WatcherId,
    ) -> Result<()> {
        self.watcher_id
            .compare_exchange(UNASSIGNED_WATCHER_ID, id, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|current| WatchError::IdAlreadyAssigned(current).into())
    }

    pub fn watcher_id(&self) -> WatcherId {
        self.watcher_id.load(Ordering::Acquire)
    }

    /// True once any trigger has completed this watcher. Never resets.
    pub fn is_sent_response(&self) -> bool {
        self.sent_response.load(Ordering::Acquire)
    }

    /// Match test against a storage-layer change: same table, covered key
    /// and a version strictly newer than the baseline.
    pub fn matches(
        &self,
        change: &KeyChange,
    ) -> bool {
        if change.table_id != self.table_id || change.version <= self.key_version {
            return false;
        }
        match self.mode {
            WatchMode::Key => self.keys.iter().any(|key| key == &change.key),
            WatchMode::Prefix => self.keys.iter().any(|prefix| change.key.starts_with(prefix)),
        }
    }

    /// Attempts to deliver `response` to the pending client request.
    ///
    /// May be called concurrently from the change-dispatch, expiration and
    /// cancellation paths; a single atomic transition claims the right to
    /// deliver, so exactly one caller transmits and the rest observe
    /// [`SendOutcome::AlreadyCompleted`]. A session-layer failure is
    /// surfaced to the winner, but the watcher still counts as completed:
    /// an attempt was dispatched, and the gate never reopens.
    pub fn send(
        &self,
        response: WatchResponse,
    ) -> Result<SendOutcome> {
        self.complete(Ok(response))
    }

    /// Completes the watcher with a cancellation sentinel instead of a
    /// change or timeout response. Third racer through the same gate.
    pub fn cancel(&self) -> Result<SendOutcome> {
        self.complete(Err(Status::cancelled("watch cancelled before completion")))
    }

    fn complete(
        &self,
        reply: WatchReply,
    ) -> Result<SendOutcome> {
        if self.probe {
            return Err(WatchError::ProbeNotDeliverable.into());
        }
        // Claim the right to deliver; the loser must not touch the context.
        if self
            .sent_response
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(SendOutcome::AlreadyCompleted);
        }
        // Lock held only for the take; transmission happens outside it.
        let context = self.context.lock().take();
        match context {
            Some(context) => {
                context.transmit(reply)?;
                Ok(SendOutcome::Delivered)
            }
            // The gate admits one winner, so an empty slot means the
            // watcher was built inconsistently.
            None => Err(Error::Fatal(format!(
                "watcher {} lost its request context before delivery",
                self.watcher_id()
            ))),
        }
    }
}
