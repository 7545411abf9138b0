use crate::{
    generator::Generator,
    latch::Latch,
    link::LinkWorker,
    station::StationQueue,
    stop::{StopListener, StopReason, Stopper},
};
use queuenet_core::{
    Delay, Entity, StationId, StationStats, Topology, TopologyBuilder, TopologyError, WaitStats,
    defaults::{DEFAULT_ARRIVALS, DEFAULT_INTER_ARRIVAL, DEFAULT_TIMEOUT},
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tokio::{
    task::{JoinError, JoinHandle, JoinSet},
    time::{Instant, timeout},
};
use tracing::{debug, info, warn};

/// Parameters of a run that are not part of the [`Topology`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimConfiguration {
    /// Number of entities the generator produces.
    pub arrivals: u64,
    /// Time between two consecutive arrivals.
    pub inter_arrival: Delay,
    /// Bound on the duration of the whole run.
    pub timeout: Duration,
}

impl Default for SimConfiguration {
    fn default() -> Self {
        Self {
            arrivals: DEFAULT_ARRIVALS,
            inter_arrival: DEFAULT_INTER_ARRIVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The entities collected at one terminal station, in the order they
/// reached it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalOutput {
    pub station: StationId,
    pub entities: Vec<Entity>,
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("{0}")]
    Configuration(#[from] TopologyError),
    /// The network did not drain in time. `collected` holds what already
    /// reached the terminal stations; it is partial.
    #[error(
        "Simulation did not drain within {timeout:?}, {} entities collected",
        count(.collected)
    )]
    Timeout {
        timeout: Duration,
        collected: Vec<TerminalOutput>,
    },
    #[error("Simulation task failed")]
    Task(#[from] JoinError),
}

fn count(outputs: &[TerminalOutput]) -> usize {
    outputs.iter().map(|output| output.entities.len()).sum()
}

impl SimulationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// The entities collected before the run was cut short.
    pub fn partial(&self) -> Option<&[TerminalOutput]> {
        match self {
            Self::Timeout { collected, .. } => Some(collected),
            Self::Configuration(_) | Self::Task(_) => None,
        }
    }
}

/// Outcome of a run that drained completely.
#[derive(Debug, Clone)]
pub struct Report {
    terminals: Vec<TerminalOutput>,
    stations: Vec<StationStats>,
    wait: WaitStats,
    elapsed: Duration,
}

impl Report {
    /// Per terminal station collections, in topological order.
    pub fn terminals(&self) -> &[TerminalOutput] {
        &self.terminals
    }

    /// The collection of one terminal station.
    pub fn terminal(&self, station: StationId) -> Option<&[Entity]> {
        self.terminals
            .iter()
            .find(|output| output.station == station)
            .map(|output| output.entities.as_slice())
    }

    /// Every entity that left the network.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.terminals
            .iter()
            .flat_map(|output| output.entities.iter())
    }

    pub fn completed(&self) -> usize {
        self.wait.count()
    }

    /// The mean accumulated wait of the entities that left the network,
    /// `None` if none did.
    pub fn mean_wait(&self) -> Option<Duration> {
        self.wait.mean()
    }

    pub fn wait_stats(&self) -> &WaitStats {
        &self.wait
    }

    /// Station snapshots, upstream ones first.
    pub fn stations(&self) -> &[StationStats] {
        &self.stations
    }

    pub fn station(&self, station: StationId) -> Option<&StationStats> {
        self.stations.iter().find(|stats| stats.id == station)
    }

    /// Simulated time between the start of the run and the moment the
    /// last terminal station closed.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// The network driver.
///
/// Owns a validated [`Topology`] and the [`SimConfiguration`] of the run.
/// [`run`](Simulation::run) spawns the generator, every link worker and a
/// collector per terminal station on the current tokio runtime, then waits
/// for the whole graph to drain.
///
/// ```
/// # use queuenet::{Delay, SimConfiguration, Simulation, TopologyBuilder};
/// # use std::time::Duration;
/// # #[tokio::main(flavor = "current_thread", start_paused = true)]
/// # async fn main() -> Result<(), queuenet::SimulationError> {
/// let mut builder = TopologyBuilder::new();
/// let line = builder.new_station("line").build();
/// let done = builder.new_station("done").build();
/// builder
///     .configure_link(line, done)
///     .set_service_delay(Delay::from_millis(5))
///     .apply();
/// builder.set_entry(line);
///
/// let configuration = SimConfiguration {
///     arrivals: 10,
///     inter_arrival: Delay::from_millis(10),
///     timeout: Duration::from_secs(1),
/// };
/// let report = Simulation::from_builder(builder, configuration)?.run().await?;
///
/// assert_eq!(report.completed(), 10);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Simulation {
    topology: Topology,
    configuration: SimConfiguration,
}

impl Simulation {
    pub fn new(topology: Topology, configuration: SimConfiguration) -> Self {
        Self {
            topology,
            configuration,
        }
    }

    /// Validate `builder` and create the driver.
    ///
    /// # Errors
    ///
    /// [`SimulationError::Configuration`] if the topology is invalid; no
    /// task is started in that case.
    pub fn from_builder(
        builder: TopologyBuilder,
        configuration: SimConfiguration,
    ) -> Result<Self, SimulationError> {
        Ok(Self::new(builder.build()?, configuration))
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn configuration(&self) -> &SimConfiguration {
        &self.configuration
    }

    /// Run the simulation until every terminal station is closed.
    ///
    /// # Errors
    ///
    /// - [`SimulationError::Timeout`] if the network did not drain within
    ///   the configured timeout. Every task is stopped and the entities
    ///   still in service are discarded.
    /// - [`SimulationError::Task`] if a task panicked.
    pub async fn run(self) -> Result<Report, SimulationError> {
        let Self {
            topology,
            configuration,
        } = self;

        info!(
            stations = topology.stations().count(),
            links = topology.links().len(),
            arrivals = configuration.arrivals,
            inter_arrival = %configuration.inter_arrival,
            timeout = ?configuration.timeout,
            "Starting simulation"
        );

        let epoch = Instant::now();
        let stopper = Stopper::new();
        let stations = open_stations(&topology);
        let station = |id: StationId| Arc::clone(&stations[&id]);

        let mut tasks = JoinSet::new();

        let entry = station(topology.entry());
        for guard in Latch::new(1, Arc::clone(&entry)) {
            let generator = Generator::new(
                configuration.arrivals,
                configuration.inter_arrival,
                Arc::clone(&entry),
                epoch,
                guard,
            );
            tasks.spawn(generator.run(stopper.listener()));
        }

        for link in topology.links() {
            let downstream = station(link.to());
            let guards = Latch::new(link.workers(), Arc::clone(&downstream));

            for (worker, guard) in guards.into_iter().enumerate() {
                let worker = LinkWorker::new(
                    link.id(),
                    worker,
                    link.service_delay(),
                    station(link.from()),
                    Arc::clone(&downstream),
                    guard,
                );
                tasks.spawn(worker.run(stopper.listener()));
            }
        }

        let mut collectors: Vec<(StationId, JoinHandle<Vec<Entity>>)> = topology
            .terminals()
            .map(|id| {
                let collector = collect(station(id), stopper.listener());
                (id, tokio::spawn(collector))
            })
            .collect();

        let mut terminals = Vec::with_capacity(collectors.len());
        let drained = timeout(configuration.timeout, async {
            while let Some(result) = tasks.join_next().await {
                result?;
            }
            for (id, collector) in collectors.iter_mut() {
                let entities = collector.await?;
                terminals.push(TerminalOutput {
                    station: *id,
                    entities,
                });
            }
            Ok::<_, JoinError>(())
        })
        .await;

        match drained {
            Ok(result) => result?,
            Err(_elapsed) => {
                stopper.stop(StopReason::TimedOut(configuration.timeout));

                // the collectors already awaited are at the front
                let pending = collectors.into_iter().skip(terminals.len());
                for (id, collector) in pending {
                    let entities = collector.await?;
                    terminals.push(TerminalOutput {
                        station: id,
                        entities,
                    });
                }
                while let Some(result) = tasks.join_next().await {
                    result?;
                }

                for queue in topology.stations().map(|s| &stations[&s.id()]) {
                    let stuck = queue.occupancy();
                    if stuck > 0 {
                        debug!(
                            station = %queue.id(),
                            name = queue.name(),
                            stuck,
                            exhausted = queue.is_exhausted(),
                            "entities left behind"
                        );
                    }
                }

                let error = SimulationError::Timeout {
                    timeout: configuration.timeout,
                    collected: terminals,
                };
                warn!(%error, "Simulation cancelled");
                return Err(error);
            }
        }

        let elapsed = epoch.elapsed();
        let stations: Vec<StationStats> = topology
            .stations()
            .map(|s| stations[&s.id()].stats())
            .collect();
        let wait = WaitStats::from_entities(terminals.iter().flat_map(|t| t.entities.iter()));

        info!(
            completed = wait.count(),
            mean_wait = ?wait.mean(),
            ?elapsed,
            "Simulation drained"
        );

        Ok(Report {
            terminals,
            stations,
            wait,
            elapsed,
        })
    }
}

fn open_stations(topology: &Topology) -> HashMap<StationId, Arc<StationQueue>> {
    topology
        .stations()
        .map(|station| {
            let producers = topology.producers(station.id());
            if producers == 0 {
                warn!(
                    station = %station.id(),
                    name = station.name(),
                    "station has no producer, it is closed from the start"
                );
            }

            let queue = StationQueue::new(
                station.id(),
                station.name(),
                station.capacity(),
                producers,
            );
            (station.id(), Arc::new(queue))
        })
        .collect()
}

/// Drain a terminal station until it closes.
///
/// Once stopped, returns what was already collected plus whatever is still
/// buffered in the station.
async fn collect(station: Arc<StationQueue>, mut stop: StopListener) -> Vec<Entity> {
    let mut collected = Vec::new();

    loop {
        tokio::select! {
            biased;
            reason = stop.stopped() => {
                debug!(station = %station.id(), %reason, "collecting what is left");
                collected.extend(station.drain());
                break;
            }
            departure = station.take() => match departure {
                Some(departure) => collected.push(departure.entity),
                None => break,
            },
        }
    }

    debug!(
        station = %station.id(),
        name = station.name(),
        collected = collected.len(),
        closed = station.is_closed(),
        "collector done"
    );
    collected
}

#[cfg(test)]
mod tests {
    use super::*;
    use queuenet_core::CapacityPolicy;

    fn configuration(arrivals: u64, inter_arrival_ms: u64) -> SimConfiguration {
        SimConfiguration {
            arrivals,
            inter_arrival: Delay::from_millis(inter_arrival_ms),
            timeout: Duration::from_secs(60),
        }
    }

    #[test]
    fn default_configuration() {
        let configuration = SimConfiguration::default();

        assert_eq!(configuration.arrivals, 100);
        assert_eq!(configuration.inter_arrival, Delay::from_millis(90));
        assert_eq!(configuration.timeout, Duration::from_secs(30));
    }

    #[test]
    fn configuration_error_before_running() {
        let mut builder = TopologyBuilder::new();
        let a = builder.new_station("a").build();
        builder.configure_link(a, a).apply();
        builder.set_entry(a);

        let error = Simulation::from_builder(builder, SimConfiguration::default()).unwrap_err();
        assert!(matches!(
            error,
            SimulationError::Configuration(TopologyError::Cycle { .. })
        ));
        assert!(!error.is_timeout());
        assert!(error.partial().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn entry_without_link_is_terminal() {
        let mut builder = TopologyBuilder::new();
        let only = builder.new_station("only").build();
        builder.set_entry(only);

        let report = Simulation::from_builder(builder, configuration(5, 10))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.completed(), 5);
        assert_eq!(report.mean_wait(), Some(Duration::ZERO));
        assert_eq!(report.elapsed(), Duration::from_millis(50));
    }

    #[tokio::test(start_paused = true)]
    async fn queuing_delay_behind_a_slow_server() {
        // arrivals at 10, 20, 30, 40, 50ms; service 25ms
        // service starts at 10, 35, 60, 85, 110ms
        let mut builder = TopologyBuilder::new();
        let line = builder.new_station("line").build();
        let done = builder.new_station("done").build();
        builder
            .configure_link(line, done)
            .set_service_delay(Delay::from_millis(25))
            .apply();
        builder.set_entry(line);

        let report = Simulation::from_builder(builder, configuration(5, 10))
            .unwrap()
            .run()
            .await
            .unwrap();

        let waits: Vec<_> = report
            .entities()
            .map(|entity| entity.accumulated_wait().as_millis())
            .collect();
        assert_eq!(waits, vec![0, 15, 30, 45, 60]);
        assert_eq!(report.mean_wait(), Some(Duration::from_millis(30)));
        assert_eq!(report.elapsed(), Duration::from_millis(135));

        let line = report.station(line).unwrap();
        assert_eq!(line.arrivals, 5);
        assert_eq!(line.departures, 5);
        assert_eq!(line.remaining, 0);
        assert_eq!(line.total_wait, Duration::from_millis(150));
        assert_eq!(line.peak_occupancy, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_station_does_not_block_the_drain() {
        let mut builder = TopologyBuilder::new();
        let entry = builder.new_station("entry").build();
        let orphan = builder.new_station("orphan").build();
        let sink = builder.new_station("sink").build();
        builder.configure_link(entry, sink).apply();
        builder.configure_link(orphan, sink).apply();
        builder.set_entry(entry);

        let report = Simulation::from_builder(builder, configuration(3, 10))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.terminal(sink).map(<[Entity]>::len), Some(3));
        assert_eq!(report.station(orphan).unwrap().arrivals, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rendezvous_station_in_the_middle() {
        let mut builder = TopologyBuilder::new();
        let line = builder.new_station("line").build();
        let counter = builder
            .new_station("counter")
            .set_capacity(CapacityPolicy::RendezvousOne)
            .build();
        let done = builder.new_station("done").build();
        builder
            .configure_link(line, counter)
            .set_service_delay(Delay::from_millis(1))
            .apply();
        builder
            .configure_link(counter, done)
            .set_service_delay(Delay::from_millis(30))
            .apply();
        builder.set_entry(line);

        let report = Simulation::from_builder(builder, configuration(6, 5))
            .unwrap()
            .run()
            .await
            .unwrap();

        assert_eq!(report.completed(), 6);
        let counter = report.station(counter).unwrap();
        assert_eq!(counter.peak_occupancy, 1);
        // the slow stage backs the queue up into the unbounded line
        assert!(report.station(line).unwrap().peak_occupancy > 1);
    }
}
