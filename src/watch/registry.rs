//! Live-watcher registry and dispatcher.
//!
//! Indexes watchers three ways: a master liveness map by id, exact-key
//! and prefix indices addressed by the codec's encoded key records, and a
//! deadline-ordered queue driving the expiration sweep. Ids pulled out of
//! a secondary structure are validated against the master map before use,
//! so a stale entry can never revive a completed watcher.

use std::collections::HashSet;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use autometrics::autometrics;
use dashmap::DashMap;
#[cfg(test)]
use mockall::automock;
use parking_lot::Mutex;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use super::ExpireEntry;
use super::ExpireQueue;
use super::Greater;
use super::KeyChange;
use super::SendOutcome;
use super::WatchMode;
use super::Watcher;
use super::WatcherId;
use crate::constants::FIRST_WATCHER_ID;
use crate::encode_key;
use crate::metrics::PENDING_WATCHES_METRIC;
use crate::metrics::WATCH_COMPLETED_METRIC;
use crate::metrics::WATCH_DELIVERY_FAILURE_METRIC;
use crate::metrics::WATCH_REGISTERED_METRIC;
use crate::RegistryError;
use crate::Result;
use crate::WatchConfig;
use crate::WatchResponse;
use crate::API_SLO;

/// Registry contract the server composes the watch subsystem through.
#[cfg_attr(test, automock)]
pub trait WatchRegistryApis: Send + Sync + 'static {
    /// Admits `watcher`, assigns its id and indexes it by key and by
    /// deadline. The id is unique for the registry's lifetime.
    fn register(
        &self,
        watcher: Watcher,
    ) -> Result<WatcherId>;

    /// Routes a storage-layer change to every matching live watcher and
    /// removes the completed ones from all indices.
    ///
    /// Returns how many watchers the change completed. Watchers whose
    /// baseline version is at or above `change.version` stay registered.
    fn dispatch_change(
        &self,
        change: &KeyChange,
    ) -> Result<usize>;

    /// Completes every watcher whose deadline is at or before `now_ms`
    /// with a timeout response. Returns how many watchers expired.
    fn sweep_expired(
        &self,
        now_ms: i64,
    ) -> Result<usize>;

    /// Client-requested cancellation: completes the watcher through the
    /// same exactly-once gate and removes it from all indices.
    fn unwatch(
        &self,
        watcher_id: WatcherId,
    ) -> Result<()>;

    fn get(
        &self,
        watcher_id: WatcherId,
    ) -> Option<Arc<Watcher>>;

    fn contains(
        &self,
        watcher_id: WatcherId,
    ) -> bool;

    /// Earliest deadline currently scheduled. May refer to an
    /// already-completed watcher; the sweep discards those lazily.
    fn next_expire_time(&self) -> Option<i64>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool;
}

pub struct WatchRegistry {
    next_watcher_id: AtomicU64,
    max_keys_per_watch: usize,
    /// Liveness authority: a watcher is live iff its id is here
    watchers: DashMap<WatcherId, Arc<Watcher>>,
    key_index: DashMap<Vec<u8>, HashSet<WatcherId>>,
    prefix_index: DashMap<Vec<u8>, HashSet<WatcherId>>,
    expire_queue: Mutex<ExpireQueue>,
}

impl WatchRegistry {
    pub fn new(config: &WatchConfig) -> Self {
        Self {
            next_watcher_id: AtomicU64::new(FIRST_WATCHER_ID),
            max_keys_per_watch: config.max_keys_per_watch,
            watchers: DashMap::new(),
            key_index: DashMap::new(),
            prefix_index: DashMap::new(),
            expire_queue: Mutex::new(ExpireQueue::new()),
        }
    }

    /// Index address of one covered key: the codec's encoded single-key
    /// record, so index addressing and the wire format can never diverge.
    fn index_addr(
        table_id: u64,
        key: &[u8],
    ) -> Vec<u8> {
        encode_key(table_id, &[key]).expect("single covered key is never an empty list")
    }

    fn index_for(
        &self,
        mode: WatchMode,
    ) -> &DashMap<Vec<u8>, HashSet<WatcherId>> {
        match mode {
            WatchMode::Key => &self.key_index,
            WatchMode::Prefix => &self.prefix_index,
        }
    }

    /// Candidate ids for a changed key: one exact lookup plus one prefix
    /// lookup per prefix length. Cost is proportional to the matches and
    /// the key length, never to the watcher population.
    fn candidates(
        &self,
        change: &KeyChange,
    ) -> HashSet<WatcherId> {
        let mut ids = HashSet::new();
        if let Some(found) = self.key_index.get(&Self::index_addr(change.table_id, &change.key)) {
            ids.extend(found.iter().copied());
        }
        for end in 1..=change.key.len() {
            if let Some(found) = self.prefix_index.get(&Self::index_addr(change.table_id, &change.key[..end])) {
                ids.extend(found.iter().copied());
            }
        }
        ids
    }

    /// Removes a watcher from every index. Idempotent: the change and
    /// expiration paths may both reach here for the same watcher.
    fn remove(
        &self,
        watcher: &Watcher,
    ) {
        let id = watcher.watcher_id();
        if self.watchers.remove(&id).is_some() {
            PENDING_WATCHES_METRIC.dec();
        }
        let index = self.index_for(watcher.mode());
        for key in watcher.keys() {
            let addr = Self::index_addr(watcher.table_id(), key);
            if let Some(mut ids) = index.get_mut(&addr) {
                ids.remove(&id);
            }
            index.remove_if(&addr, |_, ids| ids.is_empty());
        }
        // Deadline-queue entries are discarded lazily by the sweep.
    }

    #[cfg(test)]
    pub(crate) fn index_population(&self) -> (usize, usize) {
        (self.key_index.len(), self.prefix_index.len())
    }
}

impl WatchRegistryApis for WatchRegistry {
    #[autometrics(objective = API_SLO)]
    fn register(
        &self,
        watcher: Watcher,
    ) -> Result<WatcherId> {
        if watcher.is_probe() {
            return Err(RegistryError::ProbeRegistration.into());
        }
        let count = watcher.keys().len();
        if count > self.max_keys_per_watch {
            return Err(RegistryError::TooManyKeys {
                count,
                limit: self.max_keys_per_watch,
            }
            .into());
        }

        let id = self.next_watcher_id.fetch_add(1, Ordering::Relaxed);
        watcher.assign_id(id)?;
        let watcher = Arc::new(watcher);

        let index = self.index_for(watcher.mode());
        for key in watcher.keys() {
            index
                .entry(Self::index_addr(watcher.table_id(), key))
                .or_default()
                .insert(id);
        }
        self.expire_queue.lock().push(Greater(ExpireEntry::of(&watcher)));

        WATCH_REGISTERED_METRIC.with_label_values(&[mode_label(watcher.mode())]).inc();
        PENDING_WATCHES_METRIC.inc();
        trace!("registered watcher {} on table {}", id, watcher.table_id());

        // Publish last: id assigned and indices populated before any other
        // thread can reach the watcher through the master map.
        self.watchers.insert(id, watcher);
        Ok(id)
    }

    #[autometrics(objective = API_SLO)]
    fn dispatch_change(
        &self,
        change: &KeyChange,
    ) -> Result<usize> {
        let mut completed = 0;
        for id in self.candidates(change) {
            // Stale index entries must never revive a completed watcher.
            let Some(watcher) = self.watchers.get(&id).map(|found| Arc::clone(&found)) else {
                continue;
            };
            if !watcher.matches(change) {
                // Covered key, but the version is not past the baseline
                // (or another key of a multi-key watcher aliased here).
                continue;
            }
            match watcher.send(WatchResponse::key_changed(change)) {
                Ok(SendOutcome::Delivered) => {
                    completed += 1;
                    WATCH_COMPLETED_METRIC.with_label_values(&["change"]).inc();
                    debug!("watcher {} completed by change on table {}", id, change.table_id);
                }
                Ok(SendOutcome::AlreadyCompleted) => {
                    trace!("watcher {} already completed; change dispatch is a no-op", id);
                }
                Err(e) => {
                    WATCH_DELIVERY_FAILURE_METRIC.with_label_values(&["change"]).inc();
                    warn!("watcher {} change delivery failed: {:?}", id, e);
                }
            }
            // A send attempt was dispatched: completed either way.
            self.remove(&watcher);
        }
        Ok(completed)
    }

    #[autometrics(objective = API_SLO)]
    fn sweep_expired(
        &self,
        now_ms: i64,
    ) -> Result<usize> {
        let mut expired = 0;
        loop {
            // O(1) under the lock: peek, pop if due, release.
            let due = {
                let mut queue = self.expire_queue.lock();
                let is_due = matches!(queue.peek(), Some(Greater(entry)) if entry.expire_time <= now_ms);
                if is_due {
                    queue.pop().map(|inverted| inverted.0)
                } else {
                    None
                }
            };
            let Some(entry) = due else { break };

            // Lazy deletion: completed watchers leave stale entries behind.
            let Some(watcher) = self.watchers.get(&entry.watcher_id).map(|found| Arc::clone(&found)) else {
                continue;
            };
            match watcher.send(WatchResponse::timed_out(watcher.table_id())) {
                Ok(SendOutcome::Delivered) => {
                    expired += 1;
                    WATCH_COMPLETED_METRIC.with_label_values(&["expire"]).inc();
                    debug!("watcher {} expired at {}", entry.watcher_id, entry.expire_time);
                }
                Ok(SendOutcome::AlreadyCompleted) => {
                    trace!("watcher {} already completed; expiration is a no-op", entry.watcher_id);
                }
                Err(e) => {
                    WATCH_DELIVERY_FAILURE_METRIC.with_label_values(&["expire"]).inc();
                    warn!("watcher {} timeout delivery failed: {:?}", entry.watcher_id, e);
                }
            }
            self.remove(&watcher);
        }
        Ok(expired)
    }

    #[autometrics(objective = API_SLO)]
    fn unwatch(
        &self,
        watcher_id: WatcherId,
    ) -> Result<()> {
        let Some(watcher) = self.watchers.get(&watcher_id).map(|found| Arc::clone(&found)) else {
            return Err(RegistryError::NotFound(watcher_id).into());
        };
        match watcher.cancel() {
            Ok(SendOutcome::Delivered) => {
                WATCH_COMPLETED_METRIC.with_label_values(&["cancel"]).inc();
                debug!("watcher {} cancelled", watcher_id);
            }
            Ok(SendOutcome::AlreadyCompleted) => {
                trace!("watcher {} already completed; cancel is a no-op", watcher_id);
            }
            // The client asked to stop; a gone session changes nothing.
            Err(e) => {
                warn!("watcher {} cancel delivery failed: {:?}", watcher_id, e);
            }
        }
        self.remove(&watcher);
        Ok(())
    }

    fn get(
        &self,
        watcher_id: WatcherId,
    ) -> Option<Arc<Watcher>> {
        self.watchers.get(&watcher_id).map(|found| Arc::clone(&found))
    }

    fn contains(
        &self,
        watcher_id: WatcherId,
    ) -> bool {
        self.watchers.contains_key(&watcher_id)
    }

    fn next_expire_time(&self) -> Option<i64> {
        self.expire_queue.lock().peek().map(|inverted| inverted.0.expire_time)
    }

    fn len(&self) -> usize {
        self.watchers.len()
    }

    fn is_empty(&self) -> bool {
        self.watchers.is_empty()
    }
}

fn mode_label(mode: WatchMode) -> &'static str {
    match mode {
        WatchMode::Key => "key",
        WatchMode::Prefix => "prefix",
    }
}
