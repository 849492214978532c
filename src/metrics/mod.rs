use lazy_static::lazy_static;
use prometheus::IntCounterVec;
use prometheus::IntGauge;
use prometheus::Opts;
use prometheus::Registry;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref WATCH_REGISTERED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_registered_total", "watches admitted by the registry"),
        &["mode"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_COMPLETED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_completed_total", "watches completed, by winning trigger"),
        &["cause"]
    )
    .expect("metric can not be created");

    pub static ref WATCH_DELIVERY_FAILURE_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("watch_delivery_failures_total", "reply attempts the session layer rejected"),
        &["cause"]
    )
    .expect("metric can not be created");

    pub static ref PENDING_WATCHES_METRIC: IntGauge =
        IntGauge::new("watch_pending", "live watchers currently registered")
            .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

pub fn register_watch_metrics() {
    REGISTRY
        .register(Box::new(WATCH_REGISTERED_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(WATCH_COMPLETED_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(WATCH_DELIVERY_FAILURE_METRIC.clone()))
        .expect("collector can be registered");
    REGISTRY
        .register(Box::new(PENDING_WATCHES_METRIC.clone()))
        .expect("collector can be registered");
}
