//! Periodic expiry of lapsed booking holds.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use messaging::{BookingNotification, Publisher};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::coordinator::BookingCoordinator;
use crate::store::BookingStore;

/// Runs [`BookingCoordinator::expire_overdue`] on a fixed interval until told to stop.
pub struct ExpirySweeper<S, P>
where
    S: BookingStore,
    P: Publisher<BookingNotification>,
{
    coordinator: Arc<BookingCoordinator<S, P>>,
    interval: Duration,
}

impl<S, P> ExpirySweeper<S, P>
where
    S: BookingStore + 'static,
    P: Publisher<BookingNotification> + 'static,
{
    pub fn new(coordinator: Arc<BookingCoordinator<S, P>>, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
        }
    }

    /// Sweeps once per interval. Returns when `shutdown` flips to `true` or
    /// its sender is dropped.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::info!(interval_secs = self.interval.as_secs(), "expiry sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.coordinator.expire_overdue(Utc::now()).await {
                        tracing::error!(error = %e, "expiry sweep failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::info!("expiry sweeper stopped");
    }

    /// Spawns [`Self::run`] on the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
