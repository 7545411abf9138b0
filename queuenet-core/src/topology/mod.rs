mod order;

use self::order::topological_order;
use crate::{
    defaults::{DEFAULT_SERVICE_DELAY, DEFAULT_WORKERS},
    link::{Link, LinkId},
    measure::Delay,
    station::{CapacityPolicy, Station, StationId},
};
use std::collections::HashMap;
use thiserror::Error;

/// Collects stations and links before validating them into a [`Topology`].
///
/// Stations are declared with [`new_station`](TopologyBuilder::new_station)
/// and wired with [`configure_link`](TopologyBuilder::configure_link). The
/// generator feeds the station selected with
/// [`set_entry`](TopologyBuilder::set_entry).
///
/// ## Example
///
/// ```
/// use queuenet_core::{measure::Delay, topology::TopologyBuilder};
///
/// let mut builder = TopologyBuilder::new();
/// let line = builder.new_station("line").build();
/// let served = builder.new_station("served").build();
///
/// builder
///     .configure_link(line, served)
///     .set_service_delay(Delay::from_millis(100))
///     .apply();
/// builder.set_entry(line);
///
/// let topology = builder.build().unwrap();
/// assert!(topology.is_terminal(served));
/// ```
#[derive(Debug)]
pub struct TopologyBuilder {
    stations: Vec<Station>,
    links: Vec<Link>,
    entry: Option<StationId>,

    /// identifier for the next station
    station_id: StationId,
    /// identifier for the next link
    link_id: LinkId,
}

/// Builder for configuring a new station before registering it.
///
/// Obtained via [`TopologyBuilder::new_station`]. The station is
/// [`CapacityPolicy::Unbounded`] unless configured otherwise.
pub struct StationBuilder<'a> {
    station: Station,

    builder: &'a mut TopologyBuilder,
}

/// Builder for configuring a link between two stations.
///
/// Obtained via [`TopologyBuilder::configure_link`]. Call
/// [`LinkBuilder::apply`] to commit the configuration.
///
/// ## Defaults
///
/// | Setting | Default |
/// |---------|---------|
/// | Service delay | 5ms ([`DEFAULT_SERVICE_DELAY`]) |
/// | Workers | 1 ([`DEFAULT_WORKERS`]) |
pub struct LinkBuilder<'a> {
    from: StationId,
    to: StationId,
    service_delay: Delay,
    workers: usize,
    builder: &'a mut TopologyBuilder,
}

/// Error returned when a [`TopologyBuilder`] does not describe a network
/// that can be simulated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Station name `{name}' is used by both {first} and {second}")]
    DuplicateStation {
        name: String,
        first: StationId,
        second: StationId,
    },
    #[error("No entry station: call set_entry before building the topology")]
    MissingEntry,
    #[error("Entry station ({station}) Not Found")]
    UndefinedEntry { station: StationId },
    /// The identifier was not issued by this builder.
    #[error("Link ({link}) references an undefined station ({station})")]
    UndefinedStation { link: LinkId, station: StationId },
    #[error("Link ({link}) has no worker: entities would never leave {from}")]
    NoWorkers { link: LinkId, from: StationId },
    /// Draining the network relies on the graph being acyclic.
    #[error("Topology contains a cycle involving {}", display_stations(.stations))]
    Cycle { stations: Vec<StationId> },
}

fn display_stations(stations: &[StationId]) -> String {
    stations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl StationBuilder<'_> {
    pub fn set_capacity(mut self, capacity: CapacityPolicy) -> Self {
        self.station.set_capacity(capacity);
        self
    }

    /// Register the station and return its [`StationId`].
    pub fn build(self) -> StationId {
        let Self { station, builder } = self;
        let id = station.id();

        builder.stations.push(station);

        id
    }
}

impl LinkBuilder<'_> {
    /// Set the time every worker spends serving one entity.
    pub fn set_service_delay(mut self, service_delay: Delay) -> Self {
        self.service_delay = service_delay;
        self
    }

    /// Set how many servers operate this link in parallel.
    pub fn set_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Commit the link configuration to the topology.
    ///
    /// Unlike a network link, declaring the same pair twice adds a second,
    /// parallel link.
    pub fn apply(self) -> LinkId {
        let Self {
            from,
            to,
            service_delay,
            workers,
            builder,
        } = self;

        let id = builder.link_id;
        builder.link_id = id.next();
        builder
            .links
            .push(Link::new(id, from, to, service_delay, workers));

        id
    }
}

impl Default for TopologyBuilder {
    fn default() -> Self {
        Self {
            stations: Vec::new(),
            links: Vec::new(),
            entry: None,
            station_id: StationId::ZERO,
            link_id: LinkId::ZERO,
        }
    }
}

impl TopologyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a new station and return a builder to configure it.
    ///
    /// Station IDs are assigned sequentially starting at `0` and are only
    /// meaningful for this builder.
    pub fn new_station(&mut self, name: impl Into<String>) -> StationBuilder<'_> {
        let id = self.station_id;
        self.station_id = id.next();
        StationBuilder {
            station: Station::new(id, name.into()),
            builder: self,
        }
    }

    /// Configure a link consuming from `from` and producing into `to`.
    pub fn configure_link(&mut self, from: StationId, to: StationId) -> LinkBuilder<'_> {
        LinkBuilder {
            from,
            to,
            service_delay: DEFAULT_SERVICE_DELAY,
            workers: DEFAULT_WORKERS,
            builder: self,
        }
    }

    /// Select the station the generator produces into.
    pub fn set_entry(&mut self, station: StationId) -> &mut Self {
        self.entry = Some(station);
        self
    }

    /// Look up a declared station by name.
    pub fn station_id(&self, name: &str) -> Option<StationId> {
        self.stations
            .iter()
            .find(|station| station.name() == name)
            .map(Station::id)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::DuplicateStation`] if two stations share a name.
    /// - [`TopologyError::MissingEntry`] / [`TopologyError::UndefinedEntry`]
    ///   if the entry station is not set or unknown.
    /// - [`TopologyError::UndefinedStation`] if a link endpoint is unknown.
    /// - [`TopologyError::NoWorkers`] if a link has no server.
    /// - [`TopologyError::Cycle`] if the graph is not acyclic.
    pub fn build(self) -> Result<Topology, TopologyError> {
        let Self {
            stations,
            links,
            entry,
            ..
        } = self;

        {
            let mut names: HashMap<&str, StationId> = HashMap::with_capacity(stations.len());
            for station in &stations {
                if let Some(first) = names.insert(station.name(), station.id()) {
                    return Err(TopologyError::DuplicateStation {
                        name: station.name().to_owned(),
                        first,
                        second: station.id(),
                    });
                }
            }
        }

        let defined = |station: StationId| station.index() < stations.len();

        let entry = entry.ok_or(TopologyError::MissingEntry)?;
        if !defined(entry) {
            return Err(TopologyError::UndefinedEntry { station: entry });
        }

        for link in &links {
            for station in [link.from(), link.to()] {
                if !defined(station) {
                    return Err(TopologyError::UndefinedStation {
                        link: link.id(),
                        station,
                    });
                }
            }
            if link.workers() == 0 {
                return Err(TopologyError::NoWorkers {
                    link: link.id(),
                    from: link.from(),
                });
            }
        }

        let order = topological_order(stations.len(), &links)
            .map_err(|stations| TopologyError::Cycle { stations })?;

        Ok(Topology {
            stations,
            order,
            links,
            entry,
        })
    }
}

/// A validated, acyclic wiring of stations and links.
///
/// Obtained from [`TopologyBuilder::build`]; it cannot be modified
/// afterwards.
#[derive(Debug, Clone)]
pub struct Topology {
    /// indexed by [`StationId`]
    stations: Vec<Station>,
    /// topological order of the stations
    order: Vec<StationId>,
    links: Vec<Link>,
    entry: StationId,
}

impl Topology {
    /// The station the generator produces into.
    #[inline]
    pub fn entry(&self) -> StationId {
        self.entry
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.stations.get(id.index())
    }

    /// All the stations, upstream ones first.
    pub fn stations(&self) -> impl Iterator<Item = &Station> + '_ {
        self.order.iter().map(|id| &self.stations[id.index()])
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Links producing into `station`.
    pub fn incoming(&self, station: StationId) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |link| link.to() == station)
    }

    /// Links consuming from `station`.
    pub fn outgoing(&self, station: StationId) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |link| link.from() == station)
    }

    /// A terminal station has no outgoing link; what reaches it leaves the
    /// network.
    pub fn is_terminal(&self, station: StationId) -> bool {
        self.outgoing(station).next().is_none()
    }

    /// The terminal stations, in topological order.
    pub fn terminals(&self) -> impl Iterator<Item = StationId> + '_ {
        self.order
            .iter()
            .copied()
            .filter(|station| self.is_terminal(*station))
    }

    /// How many producers must finish before `station` is exhausted: one
    /// per incoming link, plus the generator for the entry station.
    pub fn producers(&self, station: StationId) -> usize {
        let generator = usize::from(station == self.entry);
        self.incoming(station).count() + generator
    }
}
