mod id;

use crate::{measure::Delay, station::StationId};

pub use self::id::LinkId;

/// Configuration for a timed service stage between two [`Station`]s.
///
/// A `Link` is the canonical record stored in the [`Topology`]. It has no
/// working state: the runtime spawns `workers` independent servers for it,
/// each one pulling from the upstream station, waiting `service_delay` and
/// pushing into the downstream station.
///
/// With more than one worker the relative order of entities is only kept
/// per worker, parallel servers may reorder them.
///
/// [`Station`]: crate::station::Station
/// [`Topology`]: crate::topology::Topology
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    id: LinkId,
    from: StationId,
    to: StationId,
    service_delay: Delay,
    workers: usize,
}

impl Link {
    pub(crate) fn new(
        id: LinkId,
        from: StationId,
        to: StationId,
        service_delay: Delay,
        workers: usize,
    ) -> Self {
        Self {
            id,
            from,
            to,
            service_delay,
            workers,
        }
    }

    #[inline]
    pub fn id(&self) -> LinkId {
        self.id
    }

    /// The upstream station this link consumes from.
    #[inline]
    pub fn from(&self) -> StationId {
        self.from
    }

    /// The downstream station this link produces into.
    #[inline]
    pub fn to(&self) -> StationId {
        self.to
    }

    /// Time spent serving every single entity.
    #[inline]
    pub fn service_delay(&self) -> Delay {
        self.service_delay
    }

    /// Number of servers operating this link in parallel.
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }
}
