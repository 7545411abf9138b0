/*!
# Queueing network core

Deterministic, runtime-free building blocks of a queueing-network
simulation: entities, stations with a capacity policy, timed service
links, the validated [`Topology`] wiring them into an acyclic graph, and
the statistics computed once the network drained.

```
use queuenet_core::{
    measure::Delay,
    station::CapacityPolicy,
    topology::TopologyBuilder,
};

let mut builder = TopologyBuilder::new();
let queue = builder.new_station("queue").build();
let cashier = builder
    .new_station("cashier")
    .set_capacity(CapacityPolicy::RendezvousOne)
    .build();
let exit = builder.new_station("exit").build();

builder
    .configure_link(queue, cashier)
    .set_service_delay("100ms".parse::<Delay>().unwrap())
    .apply();
builder
    .configure_link(cashier, exit)
    .set_service_delay(Delay::from_millis(50))
    .set_workers(2)
    .apply();
builder.set_entry(queue);

let topology = builder.build().unwrap();
assert_eq!(topology.terminals().collect::<Vec<_>>(), vec![exit]);
```
*/

pub mod defaults;
pub mod entity;
pub mod link;
pub mod measure;
pub mod station;
pub mod stats;
pub(crate) mod time;
pub mod topology;

pub use self::{
    entity::{Entity, EntityId, Hop},
    link::{Link, LinkId},
    measure::Delay,
    station::{CapacityPolicy, Station, StationId},
    stats::{StationStats, WaitStats},
    time::DurationParseError,
    topology::{Topology, TopologyBuilder, TopologyError},
};
