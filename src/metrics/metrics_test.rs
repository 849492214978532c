use super::register_watch_metrics;
use super::PENDING_WATCHES_METRIC;
use super::REGISTRY;
use super::WATCH_COMPLETED_METRIC;

#[test]
fn test_register_and_collect() {
    register_watch_metrics();

    WATCH_COMPLETED_METRIC.with_label_values(&["change"]).inc();
    PENDING_WATCHES_METRIC.inc();
    PENDING_WATCHES_METRIC.dec();

    let families = REGISTRY.gather();
    assert!(families.iter().any(|family| family.get_name() == "watch_completed_total"));
    assert!(families.iter().any(|family| family.get_name() == "watch_pending"));
}
