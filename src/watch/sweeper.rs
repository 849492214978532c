//! Periodic expiration sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::interval;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::WatchRegistryApis;
use crate::utils::time::now_millis;
use crate::WatchConfig;

/// Drives [`WatchRegistryApis::sweep_expired`] on a fixed cadence until
/// its cancellation token fires.
pub struct ExpirationSweeper<R>
where
    R: WatchRegistryApis,
{
    registry: Arc<R>,
    tick_interval: Duration,
    shutdown: CancellationToken,
}

impl<R> ExpirationSweeper<R>
where
    R: WatchRegistryApis,
{
    pub fn new(
        registry: Arc<R>,
        config: &WatchConfig,
    ) -> Self {
        Self {
            registry,
            tick_interval: Duration::from_millis(config.sweep_interval_ms),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token the server cancels on shutdown.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(self) {
        let mut tick = interval(self.tick_interval);
        // A stalled sweep must not burst to catch up afterwards.
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    info!("expiration sweeper stopped");
                    return;
                }
                _ = tick.tick() => {
                    match self.registry.sweep_expired(now_millis()) {
                        Ok(0) => {}
                        Ok(expired) => debug!("expiration sweep completed {} watchers", expired),
                        Err(e) => error!("expiration sweep failed: {:?}", e),
                    }
                }
            }
        }
    }
}
