//! Wait-time statistics and per-station observability types.
//!
//! [`WaitStats`] aggregates the accumulated waits of the entities that left
//! the network. [`StationStats`] is a snapshot of one station at the end
//! of a run, used to spot where the queue builds up.

use crate::{
    entity::Entity,
    station::{CapacityPolicy, StationId},
};
use std::time::Duration;

/// Aggregate of the accumulated waits of a set of entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WaitStats {
    count: usize,
    total: Duration,
    max: Duration,
}

impl WaitStats {
    pub fn from_entities<'a, I>(entities: I) -> Self
    where
        I: IntoIterator<Item = &'a Entity>,
    {
        entities
            .into_iter()
            .fold(Self::default(), |mut stats, entity| {
                let wait = entity.accumulated_wait();
                stats.count += 1;
                stats.total = stats.total.saturating_add(wait);
                stats.max = stats.max.max(wait);
                stats
            })
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn total(&self) -> Duration {
        self.total
    }

    #[inline]
    pub fn max(&self) -> Duration {
        self.max
    }

    /// The mean accumulated wait, `None` when no entity was observed.
    pub fn mean(&self) -> Option<Duration> {
        mean(self.total, self.count as u64)
    }
}

/// Snapshot of a single station once the run is over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StationStats {
    pub id: StationId,
    pub name: String,
    pub capacity: CapacityPolicy,
    /// Entities that entered the station buffer.
    pub arrivals: u64,
    /// Entities taken out of the buffer by a consumer.
    pub departures: u64,
    /// Highest number of entities buffered at the same time.
    pub peak_occupancy: usize,
    /// Sum of the waits of the departed entities.
    pub total_wait: Duration,
    /// Entities still buffered when the snapshot was taken.
    pub remaining: usize,
}

impl StationStats {
    /// Mean time an entity waited in this station before being taken.
    pub fn mean_wait(&self) -> Option<Duration> {
        mean(self.total_wait, self.departures)
    }
}

fn mean(total: Duration, count: u64) -> Option<Duration> {
    if count == 0 {
        return None;
    }
    let nanos = total.as_nanos() / u128::from(count);
    Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityId;

    fn waited(id: u64, millis: &[u64]) -> Entity {
        let mut entity = Entity::new(EntityId::new(id), Duration::ZERO);
        for wait in millis {
            entity.record_wait(StationId::ZERO, Duration::from_millis(*wait));
        }
        entity
    }

    #[test]
    fn empty() {
        let stats = WaitStats::from_entities(std::iter::empty());

        assert_eq!(stats.count(), 0);
        assert_eq!(stats.mean(), None);
    }

    #[test]
    fn mean_of_accumulated_waits() {
        let entities = [waited(0, &[0]), waited(1, &[10, 5]), waited(2, &[45])];
        let stats = WaitStats::from_entities(&entities);

        assert_eq!(stats.count(), 3);
        assert_eq!(stats.total(), Duration::from_millis(60));
        assert_eq!(stats.max(), Duration::from_millis(45));
        assert_eq!(stats.mean(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn station_mean_wait() {
        let mut stats = StationStats {
            id: StationId::ZERO,
            name: "serving".to_owned(),
            capacity: CapacityPolicy::Unbounded,
            arrivals: 4,
            departures: 0,
            peak_occupancy: 3,
            total_wait: Duration::ZERO,
            remaining: 4,
        };
        assert_eq!(stats.mean_wait(), None);

        stats.departures = 4;
        stats.remaining = 0;
        stats.total_wait = Duration::from_millis(90);
        assert_eq!(stats.mean_wait(), Some(Duration::from_micros(22_500)));
    }
}
