use crate::{latch::ProducerGuard, station::StationQueue, stop::StopListener};
use queuenet_core::{Delay, Entity, EntityId};
use std::sync::Arc;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Produces a fixed number of entities at a fixed interval into the entry
/// station.
///
/// Every entity is created one `interval` after the previous one was
/// accepted, so on a rendezvous entry station the arrivals slow down to
/// the pace of the consumers.
pub(crate) struct Generator {
    arrivals: u64,
    interval: Delay,
    entry: Arc<StationQueue>,
    epoch: Instant,
    guard: ProducerGuard,
}

impl Generator {
    pub(crate) fn new(
        arrivals: u64,
        interval: Delay,
        entry: Arc<StationQueue>,
        epoch: Instant,
        guard: ProducerGuard,
    ) -> Self {
        Self {
            arrivals,
            interval,
            entry,
            epoch,
            guard,
        }
    }

    pub(crate) async fn run(self, mut stop: StopListener) {
        tokio::select! {
            biased;
            reason = stop.stopped() => {
                debug!(station = %self.entry.id(), %reason, "generator stopped");
            }
            () = self.produce() => {
                debug!(station = %self.entry.id(), arrivals = self.arrivals, "generator done");
            }
        }

        // releasing the guard marks the entry station's generator as finished
        drop(self.guard);
    }

    async fn produce(&self) {
        let interval = self.interval.into_duration();

        for id in 0..self.arrivals {
            sleep(interval).await;

            let entity = Entity::new(EntityId::new(id), self.epoch.elapsed());
            debug!(entity = id, station = %self.entry.id(), "arrival");
            self.entry.put(entity).await;
        }
    }
}
