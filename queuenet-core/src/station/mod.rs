mod id;

pub use self::id::StationId;
use crate::defaults::DEFAULT_CAPACITY;
use std::fmt;

/// How many entities a station can hold at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapacityPolicy {
    /// The station never blocks a producer: an infinite queuing area.
    Unbounded,
    /// At most one entity in transit. A producer hands its entity over and
    /// stays blocked until a consumer took it, which makes the station a
    /// visible bottleneck.
    RendezvousOne,
}

impl CapacityPolicy {
    /// The maximum number of entities the station buffers, `None` when
    /// unbounded.
    pub fn capacity(self) -> Option<usize> {
        match self {
            Self::Unbounded => None,
            Self::RendezvousOne => Some(1),
        }
    }

    pub fn is_rendezvous(self) -> bool {
        matches!(self, Self::RendezvousOne)
    }
}

impl fmt::Display for CapacityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => f.write_str("unbounded"),
            Self::RendezvousOne => f.write_str("rendezvous"),
        }
    }
}

/// Configuration record of a buffering point between two service stages.
///
/// Created through [`TopologyBuilder::new_station`]; the runtime buffer is
/// built from it when the simulation starts.
///
/// [`TopologyBuilder::new_station`]: crate::topology::TopologyBuilder::new_station
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Station {
    id: StationId,
    name: String,
    capacity: CapacityPolicy,
}

impl Station {
    pub(crate) fn new(id: StationId, name: String) -> Self {
        Self {
            id,
            name,
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub(crate) fn set_capacity(&mut self, capacity: CapacityPolicy) {
        self.capacity = capacity;
    }

    #[inline]
    pub fn id(&self) -> StationId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn capacity(&self) -> CapacityPolicy {
        self.capacity
    }
}
