use std::fmt;

/// The identifier of a station in a [`Topology`].
///
/// Identifiers are handed out sequentially by the [`TopologyBuilder`]
/// that created the station, starting at `0`.
///
/// [`Topology`]: crate::topology::Topology
/// [`TopologyBuilder`]: crate::topology::TopologyBuilder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(u64);

impl StationId {
    pub const ZERO: Self = StationId::new(0);
    pub const ONE: Self = StationId::new(1);

    pub(crate) const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use = "function does not modify the current value"]
    pub(crate) fn next(self) -> Self {
        Self::new(self.0 + 1)
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "station#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential() {
        assert_eq!(StationId::ZERO.next(), StationId::ONE);
        assert_eq!(StationId::ONE.index(), 1);
    }

    #[test]
    fn print() {
        assert_eq!(format!("{}", StationId(42)), "station#42")
    }
}
