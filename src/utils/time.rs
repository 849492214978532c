use std::time::{SystemTime, UNIX_EPOCH};

/// return millisecond, signed to match the deadline and version fields
pub fn now_millis() -> i64 {
    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).expect("Time went backwards");
    since_epoch.as_millis() as i64
}

/// return second
pub(crate) fn now_secs() -> u64 {
    let now = SystemTime::now();
    let since_epoch = now.duration_since(UNIX_EPOCH).expect("Time went backwards");
    since_epoch.as_secs()
}
