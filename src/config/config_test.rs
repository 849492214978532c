use super::WatchConfig;

#[test]
fn test_defaults_validate() {
    let config = WatchConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.sweep_interval_ms, 100);
    assert_eq!(config.default_watch_timeout_ms, 30_000);
    assert_eq!(config.max_watch_timeout_ms, 3_600_000);
    assert_eq!(config.max_keys_per_watch, 64);
}

#[test]
fn test_validate_rejects_zero_sweep_interval() {
    let config = WatchConfig {
        sweep_interval_ms: 0,
        ..WatchConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_default_timeout_above_max() {
    let config = WatchConfig {
        default_watch_timeout_ms: 10_000,
        max_watch_timeout_ms: 5_000,
        ..WatchConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_zero_key_limit() {
    let config = WatchConfig {
        max_keys_per_watch: 0,
        ..WatchConfig::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_expire_at_applies_default_ttl() {
    let config = WatchConfig::default();
    assert_eq!(config.expire_at(1_000, None), 1_000 + 30_000);
}

#[test]
fn test_expire_at_clamps_requested_ttl() {
    let config = WatchConfig {
        max_watch_timeout_ms: 60_000,
        ..WatchConfig::default()
    };
    assert_eq!(config.expire_at(0, Some(90_000)), 60_000);
    // A zero TTL still yields a future deadline
    assert_eq!(config.expire_at(500, Some(0)), 501);
    assert_eq!(config.expire_at(500, Some(2_000)), 2_500);
}

#[test]
fn test_load_reads_environment_overrides() {
    temp_env::with_vars(
        [
            ("WATCH__SWEEP_INTERVAL_MS", Some("250")),
            ("WATCH__MAX_KEYS_PER_WATCH", Some("8")),
        ],
        || {
            let config = WatchConfig::load().unwrap();
            assert_eq!(config.sweep_interval_ms, 250);
            assert_eq!(config.max_keys_per_watch, 8);
            // Untouched fields fall back to defaults
            assert_eq!(config.default_watch_timeout_ms, 30_000);
        },
    );
}
