use crate::{
    latch::ProducerGuard,
    station::{Departure, StationQueue},
    stop::StopListener,
};
use queuenet_core::{Delay, LinkId};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::debug;

/// One server of a link.
///
/// Pulls the oldest entity from the upstream station, adds the time it
/// waited there to its accumulated wait, serves it for the link's service
/// delay and pushes it downstream. Stops once the upstream station is
/// closed. The servers of the same link only share the two stations, so
/// with several of them entities may overtake each other.
pub(crate) struct LinkWorker {
    link: LinkId,
    worker: usize,
    service_delay: Delay,
    upstream: Arc<StationQueue>,
    downstream: Arc<StationQueue>,
    guard: ProducerGuard,
}

impl LinkWorker {
    pub(crate) fn new(
        link: LinkId,
        worker: usize,
        service_delay: Delay,
        upstream: Arc<StationQueue>,
        downstream: Arc<StationQueue>,
        guard: ProducerGuard,
    ) -> Self {
        Self {
            link,
            worker,
            service_delay,
            upstream,
            downstream,
            guard,
        }
    }

    pub(crate) async fn run(self, mut stop: StopListener) {
        let served = tokio::select! {
            biased;
            reason = stop.stopped() => {
                debug!(link = %self.link, worker = self.worker, %reason, "worker stopped");
                return;
            }
            served = self.serve() => served,
        };

        debug!(link = %self.link, worker = self.worker, served, "worker done");
        // the last worker out finishes the downstream station
        drop(self.guard);
    }

    async fn serve(&self) -> u64 {
        let service_delay = self.service_delay.into_duration();
        let mut served = 0;

        while let Some(Departure { mut entity, wait }) = self.upstream.take().await {
            entity.record_wait(self.upstream.id(), wait);
            debug!(
                link = %self.link,
                worker = self.worker,
                entity = %entity.id(),
                ?wait,
                "serving"
            );

            sleep(service_delay).await;
            self.downstream.put(entity).await;
            served += 1;
        }

        served
    }
}
