/*!
# Queueing network simulator

Runs a [`Topology`] of stations and links on the tokio runtime: a
generator feeds the entry station at a fixed interval, link workers move
the entities downstream after their service delay, and the driver collects
everything that reaches a terminal station until the network drained.

Use [`Simulation`] to drive a run and read the [`Report`].

*/

mod generator;
mod latch;
mod link;
mod simulation;
mod station;
mod stop;

// convenient re-export of `queuenet_core` core objects
pub use queuenet_core::{
    CapacityPolicy, Delay, DurationParseError, Entity, EntityId, Hop, Link, LinkId, Station,
    StationId, StationStats, Topology, TopologyBuilder, TopologyError, WaitStats, defaults,
};

pub use self::simulation::{Report, SimConfiguration, Simulation, SimulationError, TerminalOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn simple() {
        let mut builder = TopologyBuilder::new();
        let a = builder.new_station("a").build();
        let b = builder.new_station("b").build();
        builder
            .configure_link(a, b)
            .set_service_delay(Delay::from_millis(5))
            .apply();
        builder.set_entry(a);

        let configuration = SimConfiguration {
            arrivals: 1,
            inter_arrival: Delay::from_millis(10),
            timeout: Duration::from_secs(1),
        };
        let report = Simulation::from_builder(builder, configuration)
            .unwrap()
            .run()
            .await
            .unwrap();

        let entity = report.entities().next().unwrap();
        assert_eq!(entity.id(), EntityId::new(0));
        assert_eq!(entity.created_at(), Duration::from_millis(10));
        assert_eq!(entity.accumulated_wait(), Duration::ZERO);
        // 10ms before the arrival and 5ms of service
        assert_eq!(report.elapsed(), Duration::from_millis(15));
    }
}
