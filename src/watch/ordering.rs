//! Deadline ordering for expiration scheduling.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::Watcher;
use super::WatcherId;

/// Deadline-queue entry: a snapshot of a watcher's expiration key, taken
/// at insertion so the queue never dereferences a completed watcher.
///
/// Orders by deadline first, then by watcher id, so ties on identical
/// deadlines break deterministically and pop order is reproducible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpireEntry {
    pub expire_time: i64,
    pub watcher_id: WatcherId,
}

impl ExpireEntry {
    pub fn of(watcher: &Watcher) -> Self {
        Self {
            expire_time: watcher.expire_time(),
            watcher_id: watcher.watcher_id(),
        }
    }
}

impl Ord for ExpireEntry {
    /// `a > b` when `a` expires later (or on a tie, was admitted later).
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        (self.expire_time, self.watcher_id).cmp(&(other.expire_time, other.watcher_id))
    }
}

impl PartialOrd for ExpireEntry {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Generic greater-than inversion: wraps any ordered value so that a
/// max-heap container pops its smallest element first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Greater<T>(pub T);

impl<T: Ord> Ord for Greater<T> {
    fn cmp(
        &self,
        other: &Self,
    ) -> Ordering {
        other.0.cmp(&self.0)
    }
}

impl<T: Ord> PartialOrd for Greater<T> {
    fn partial_cmp(
        &self,
        other: &Self,
    ) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `BinaryHeap` is a max-heap; inverted entries make its root the next
/// watcher to expire, with peek/pop in logarithmic time.
pub type ExpireQueue = BinaryHeap<Greater<ExpireEntry>>;
