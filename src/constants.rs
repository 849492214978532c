// -
// Watcher id namespace

/// Sentinel id of a watcher not yet admitted by the registry
pub(crate) const UNASSIGNED_WATCHER_ID: u64 = 0;

/// First id the registry hands out; `0` is reserved for "unassigned"
pub(crate) const FIRST_WATCHER_ID: u64 = 1;
