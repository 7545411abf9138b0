use queuenet_core::{CapacityPolicy, Entity, StationId, StationStats};
use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};
use tokio::{sync::Notify, time::Instant};

/// The runtime buffer of a station: a FIFO queue with blocking `put` and
/// `take`, and an explicit count of the producers still feeding it.
///
/// The station is *exhausted* once every producer called
/// [`finish_producer`](StationQueue::finish_producer), and *closed* once it
/// is exhausted and empty. A [`take`](StationQueue::take) on a closed
/// station returns `None`.
///
/// All the state sits behind a single mutex, which is never held across
/// an `.await`. Any change of the state wakes every waiting task, which
/// then re-evaluates its own condition.
#[derive(Debug)]
pub(crate) struct StationQueue {
    id: StationId,
    name: String,
    capacity: CapacityPolicy,

    state: Mutex<State>,
    changed: Notify,
}

/// An entity taken out of a station, with the time it waited there.
#[derive(Debug)]
pub(crate) struct Departure {
    pub(crate) entity: Entity,
    pub(crate) wait: Duration,
}

#[derive(Debug)]
struct Queued {
    entity: Entity,
    arrived_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    buffer: VecDeque<Queued>,
    /// producers that have not finished yet
    producers: usize,

    arrivals: u64,
    departures: u64,
    peak_occupancy: usize,
    total_wait: Duration,
}

impl StationQueue {
    pub(crate) fn new(
        id: StationId,
        name: impl Into<String>,
        capacity: CapacityPolicy,
        producers: usize,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            capacity,
            state: Mutex::new(State {
                producers,
                ..State::default()
            }),
            changed: Notify::new(),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> StationId {
        self.id
    }

    #[inline]
    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // the state is consistent after every statement, a panicking
        // holder cannot leave it half updated
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn has_room(&self, state: &State) -> bool {
        self.capacity
            .capacity()
            .is_none_or(|capacity| state.buffer.len() < capacity)
    }

    /// Number of entities currently buffered.
    pub(crate) fn occupancy(&self) -> usize {
        self.lock().buffer.len()
    }

    /// `true` once every producer has finished.
    pub(crate) fn is_exhausted(&self) -> bool {
        self.lock().producers == 0
    }

    /// `true` once the station is exhausted and its buffer drained.
    pub(crate) fn is_closed(&self) -> bool {
        let state = self.lock();
        state.producers == 0 && state.buffer.is_empty()
    }

    /// Enqueue `entity`.
    ///
    /// Returns immediately on an unbounded station. On a rendezvous
    /// station, waits for the buffer to be free, then waits again until a
    /// consumer took the entity. The wait accounted to the entity starts
    /// when `put` is called, so time spent blocked in front of a full
    /// station counts as queuing time.
    pub(crate) async fn put(&self, entity: Entity) {
        let arrived_at = Instant::now();
        let mut entity = Some(entity);

        let ticket = loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if self.has_room(&state) {
                    if let Some(entity) = entity.take() {
                        state.buffer.push_back(Queued { entity, arrived_at });
                    }
                    state.arrivals += 1;
                    state.peak_occupancy = state.peak_occupancy.max(state.buffer.len());
                    self.changed.notify_waiters();
                    break state.arrivals;
                }
            }

            notified.await;
        };

        if !self.capacity.is_rendezvous() {
            return;
        }

        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.lock().departures >= ticket {
                return;
            }

            notified.await;
        }
    }

    /// Dequeue the oldest entity.
    ///
    /// Waits while the buffer is empty and some producer may still send
    /// an entity. Returns `None` once the station is closed.
    pub(crate) async fn take(&self) -> Option<Departure> {
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(departure) = Self::depart(&mut state) {
                    self.changed.notify_waiters();
                    return Some(departure);
                }
                if state.producers == 0 {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Dequeue every buffered entity without waiting.
    pub(crate) fn drain(&self) -> Vec<Entity> {
        let mut state = self.lock();
        let drained: Vec<_> = std::iter::from_fn(|| Self::depart(&mut state))
            .map(|departure| departure.entity)
            .collect();
        if !drained.is_empty() {
            self.changed.notify_waiters();
        }
        drained
    }

    fn depart(state: &mut State) -> Option<Departure> {
        let Queued { entity, arrived_at } = state.buffer.pop_front()?;
        let wait = Instant::now().saturating_duration_since(arrived_at);

        state.departures += 1;
        state.total_wait = state.total_wait.saturating_add(wait);

        Some(Departure { entity, wait })
    }

    /// One of the producers will never send another entity.
    pub(crate) fn finish_producer(&self) {
        let mut state = self.lock();
        state.producers = state.producers.saturating_sub(1);
        if state.producers == 0 {
            tracing::debug!(station = %self.id, name = %self.name, "station exhausted");
        }
        self.changed.notify_waiters();
    }

    pub(crate) fn stats(&self) -> StationStats {
        let state = self.lock();
        StationStats {
            id: self.id,
            name: self.name.clone(),
            capacity: self.capacity,
            arrivals: state.arrivals,
            departures: state.departures,
            peak_occupancy: state.peak_occupancy,
            total_wait: state.total_wait,
            remaining: state.buffer.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuenet_core::EntityId;
    use std::sync::Arc;
    use tokio::time::{sleep, timeout};

    fn entity(id: u64) -> Entity {
        Entity::new(EntityId::new(id), Duration::ZERO)
    }

    fn station(capacity: CapacityPolicy, producers: usize) -> Arc<StationQueue> {
        Arc::new(StationQueue::new(StationId::ZERO, "test", capacity, producers))
    }

    #[tokio::test(start_paused = true)]
    async fn fifo() {
        let station = station(CapacityPolicy::Unbounded, 1);

        for id in 0..3 {
            station.put(entity(id)).await;
        }
        assert_eq!(station.occupancy(), 3);

        for id in 0..3 {
            let departure = station.take().await.unwrap();
            assert_eq!(departure.entity.id(), EntityId::new(id));
        }
        assert!(!station.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn closed_once_exhausted_and_empty() {
        let station = station(CapacityPolicy::Unbounded, 1);
        station.put(entity(0)).await;
        station.finish_producer();

        assert!(station.is_exhausted());
        assert!(!station.is_closed());

        assert!(station.take().await.is_some());
        assert!(station.is_closed());
        assert!(station.take().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn take_waits_for_producer() {
        let station = station(CapacityPolicy::Unbounded, 1);

        let consumer = tokio::spawn({
            let station = Arc::clone(&station);
            async move { station.take().await.map(|d| (d.entity.id(), d.wait)) }
        });

        sleep(Duration::from_millis(20)).await;
        assert!(!consumer.is_finished());

        station.put(entity(4)).await;
        let (id, wait) = consumer.await.unwrap().unwrap();
        assert_eq!(id, EntityId::new(4));
        assert_eq!(wait, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_time_spent_buffered() {
        let station = station(CapacityPolicy::Unbounded, 1);
        station.put(entity(0)).await;

        sleep(Duration::from_millis(35)).await;

        let departure = station.take().await.unwrap();
        assert_eq!(departure.wait, Duration::from_millis(35));
        assert_eq!(station.stats().total_wait, Duration::from_millis(35));
    }

    #[tokio::test(start_paused = true)]
    async fn finished_producer_wakes_consumers() {
        let station = station(CapacityPolicy::Unbounded, 2);

        let consumer = tokio::spawn({
            let station = Arc::clone(&station);
            async move { station.take().await.is_none() }
        });

        station.finish_producer();
        sleep(Duration::from_millis(1)).await;
        assert!(!consumer.is_finished());

        station.finish_producer();
        assert!(consumer.await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn rendezvous_blocks_until_taken() {
        let station = station(CapacityPolicy::RendezvousOne, 1);

        let producer = tokio::spawn({
            let station = Arc::clone(&station);
            async move {
                station.put(entity(0)).await;
                station.put(entity(1)).await;
            }
        });

        sleep(Duration::from_millis(10)).await;
        assert_eq!(station.occupancy(), 1);
        assert!(!producer.is_finished());

        let first = station.take().await.unwrap();
        assert_eq!(first.entity.id(), EntityId::new(0));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(station.occupancy(), 1);
        assert!(!producer.is_finished());

        let second = station.take().await.unwrap();
        assert_eq!(second.entity.id(), EntityId::new(1));
        assert_eq!(second.wait, Duration::from_millis(10));

        producer.await.unwrap();
        assert_eq!(station.stats().peak_occupancy, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unbounded_put_never_blocks() {
        let station = station(CapacityPolicy::Unbounded, 1);

        timeout(Duration::from_millis(1), async {
            for id in 0..1_000 {
                station.put(entity(id)).await;
            }
        })
        .await
        .unwrap();

        let stats = station.stats();
        assert_eq!(stats.arrivals, 1_000);
        assert_eq!(stats.peak_occupancy, 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn drain() {
        let station = station(CapacityPolicy::Unbounded, 1);
        for id in 0..4 {
            station.put(entity(id)).await;
        }

        let drained = station.drain();
        assert_eq!(drained.len(), 4);
        assert_eq!(station.occupancy(), 0);
        assert_eq!(station.stats().departures, 4);
        assert!(station.drain().is_empty());
    }
}
