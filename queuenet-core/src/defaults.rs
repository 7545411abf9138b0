use crate::{measure::Delay, station::CapacityPolicy};
use std::time::Duration;

/// Default service [`Delay`] of a [`Link`].
///
/// ```
/// # use queuenet_core::defaults::*;
/// assert_eq!(
///     DEFAULT_SERVICE_DELAY.to_string(),
///     "5ms"
/// );
/// ```
///
/// [`Link`]: crate::link::Link
pub const DEFAULT_SERVICE_DELAY: Delay = Delay::new(Duration::from_millis(5));

/// Default number of servers operating a [`Link`].
///
/// [`Link`]: crate::link::Link
pub const DEFAULT_WORKERS: usize = 1;

/// Default [`CapacityPolicy`] of a station: an infinite queuing area.
pub const DEFAULT_CAPACITY: CapacityPolicy = CapacityPolicy::Unbounded;

/// Default number of entities produced by the generator.
pub const DEFAULT_ARRIVALS: u64 = 100;

/// Default time between two arrivals.
///
/// ```
/// # use queuenet_core::defaults::*;
/// assert_eq!(
///     DEFAULT_INTER_ARRIVAL.to_string(),
///     "90ms"
/// );
/// ```
pub const DEFAULT_INTER_ARRIVAL: Delay = Delay::new(Duration::from_millis(90));

/// Default bound on the duration of a whole run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
