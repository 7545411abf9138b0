use anyhow::{Context as _, Result, bail};
use clap::Parser;
use queuenet::{
    CapacityPolicy, Delay, Report, SimConfiguration, Simulation, SimulationError, TopologyBuilder,
};
use tracing_subscriber::EnvFilter;

/// Lunch line of a cafeteria: a serving counter, two self-serve stations
/// and two cashiers, each self-serve station leading to its own cashier.
#[derive(Parser)]
struct Command {
    /// number of people coming for lunch
    #[arg(long, default_value = "100")]
    arrivals: u64,

    /// time between two people joining the line
    #[arg(long, default_value = "90ms")]
    interval: Delay,

    /// give up if the cafeteria is not empty after that long
    #[arg(long, default_value = "30s")]
    timeout: Delay,

    /// no room to wait at the stations: each holds one person at most,
    /// which shows where people get stuck rather than where queues grow
    #[arg(long)]
    rendezvous: bool,
}

const SERVING: Delay = Delay::from_millis(100);
const SELF_SERVE: Delay = Delay::from_millis(300);
const CASHIER: Delay = Delay::from_millis(50);

/// line -> serving -> self-serve 1 -> cashier 1
///                 -> self-serve 2 -> cashier 2
fn cafeteria(rendezvous: bool) -> TopologyBuilder {
    let capacity = if rendezvous {
        CapacityPolicy::RendezvousOne
    } else {
        CapacityPolicy::Unbounded
    };

    let mut builder = TopologyBuilder::new();
    let line = builder.new_station("line").build();
    let mut station = |name: &str| builder.new_station(name).set_capacity(capacity).build();
    let serving = station("serving");
    let self_serve = [station("self-serve 1"), station("self-serve 2")];
    let cashiers = [station("cashier 1"), station("cashier 2")];

    builder
        .configure_link(line, serving)
        .set_service_delay(SERVING)
        .apply();
    for (self_serve, cashier) in self_serve.into_iter().zip(cashiers) {
        builder
            .configure_link(serving, self_serve)
            .set_service_delay(SELF_SERVE)
            .apply();
        builder
            .configure_link(self_serve, cashier)
            .set_service_delay(CASHIER)
            .apply();
    }
    builder.set_entry(line);

    builder
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,queuenet=info")),
        )
        .init();

    let cmd = Command::parse();

    let configuration = SimConfiguration {
        arrivals: cmd.arrivals,
        inter_arrival: cmd.interval,
        timeout: cmd.timeout.into_duration(),
    };
    let simulation = Simulation::from_builder(cafeteria(cmd.rendezvous), configuration)
        .context("Invalid cafeteria layout")?;

    let configuration = simulation.configuration();
    println!(
        "{} people every {} through {} stations, {} mode",
        configuration.arrivals,
        configuration.inter_arrival,
        simulation.topology().stations().count(),
        if cmd.rendezvous { "rendezvous" } else { "unbounded" },
    );

    match simulation.run().await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(SimulationError::Timeout { timeout, collected }) => {
            let served: usize = collected.iter().map(|t| t.entities.len()).sum();
            bail!(
                "cafeteria still busy after {timeout:?}: {served} of {} people served",
                cmd.arrivals
            )
        }
        Err(error) => Err(error.into()),
    }
}

fn print_report(report: &Report) {
    let Some(mean) = report.mean_wait() else {
        println!("nobody came for lunch");
        return;
    };
    let stats = report.wait_stats();

    println!(
        "{} people served in {:?}, waited {mean:?} on average (longest {:?})",
        report.completed(),
        report.elapsed(),
        stats.max(),
    );
    println!();
    println!(
        "{:<12} {:>10} {:>8} {:>8} {:>6} {:>14}",
        "station", "capacity", "in", "out", "peak", "mean wait"
    );
    for station in report.stations() {
        let mean_wait = station
            .mean_wait()
            .map(|wait| format!("{wait:?}"))
            .unwrap_or_else(|| "-".to_owned());
        println!(
            "{:<12} {:>10} {:>8} {:>8} {:>6} {:>14}",
            station.name,
            station.capacity.to_string(),
            station.arrivals,
            station.departures,
            station.peak_occupancy,
            mean_wait,
        );
    }
}
