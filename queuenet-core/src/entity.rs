use crate::station::StationId;
use std::{fmt, time::Duration};

/// Sequence number of an [`Entity`], assigned by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(u64);

impl EntityId {
    pub const ZERO: Self = Self::new(0);

    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The wait an entity accumulated in one station buffer, from the moment
/// it arrived at the station until a server started serving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hop {
    pub station: StationId,
    pub wait: Duration,
}

/// One unit of work (a person in the line) flowing through the network.
///
/// The identity fields are fixed at generation. The accumulated wait only
/// ever grows: every link worker that serves the entity adds the time the
/// entity spent in the upstream buffer, and keeps a [`Hop`] for it so that
/// `accumulated_wait` is always the sum of [`Entity::hops`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    id: EntityId,
    created_at: Duration,
    accumulated_wait: Duration,
    hops: Vec<Hop>,
}

impl Entity {
    /// `created_at` is the elapsed simulated time since the run started.
    pub fn new(id: EntityId, created_at: Duration) -> Self {
        Self {
            id,
            created_at,
            accumulated_wait: Duration::ZERO,
            hops: Vec::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> EntityId {
        self.id
    }

    #[inline]
    pub fn created_at(&self) -> Duration {
        self.created_at
    }

    #[inline]
    pub fn accumulated_wait(&self) -> Duration {
        self.accumulated_wait
    }

    /// The per-station waits, in the order the stations were crossed.
    #[inline]
    pub fn hops(&self) -> &[Hop] {
        &self.hops
    }

    /// Account for the time spent waiting in `station`'s buffer.
    pub fn record_wait(&mut self, station: StationId, wait: Duration) {
        self.accumulated_wait = self.accumulated_wait.saturating_add(wait);
        self.hops.push(Hop { station, wait });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_entity_has_not_waited() {
        let entity = Entity::new(EntityId::new(7), Duration::from_millis(70));

        assert_eq!(entity.id(), EntityId::new(7));
        assert_eq!(entity.created_at(), Duration::from_millis(70));
        assert_eq!(entity.accumulated_wait(), Duration::ZERO);
        assert!(entity.hops().is_empty());
    }

    #[test]
    fn wait_accumulates_per_hop() {
        let mut entity = Entity::new(EntityId::ZERO, Duration::ZERO);

        entity.record_wait(StationId::ZERO, Duration::from_millis(15));
        entity.record_wait(StationId::ONE, Duration::ZERO);
        entity.record_wait(StationId::ONE, Duration::from_millis(5));

        assert_eq!(entity.accumulated_wait(), Duration::from_millis(20));
        assert_eq!(entity.hops().len(), 3);
        assert_eq!(
            entity.hops().iter().map(|hop| hop.wait).sum::<Duration>(),
            entity.accumulated_wait()
        );
    }
}
