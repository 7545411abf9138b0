use std::{fmt, time::Duration};
use tokio::sync::watch;

/// Why the tasks of a run are asked to stop before the network drained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StopReason {
    /// The run exceeded its timeout.
    TimedOut(Duration),
    /// The driver went away without saying why.
    Abandoned,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimedOut(timeout) => write!(f, "timed out after {timeout:?}"),
            Self::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// Held by the driver. Stopping is final: the reason is broadcast once
/// to every [`StopListener`] and the stopper is consumed.
pub(crate) struct Stopper(watch::Sender<Option<StopReason>>);

/// Handed to the generator, to each link worker and to each collector.
#[derive(Clone)]
pub(crate) struct StopListener(watch::Receiver<Option<StopReason>>);

impl Stopper {
    pub(crate) fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self(sender)
    }

    pub(crate) fn listener(&self) -> StopListener {
        StopListener(self.0.subscribe())
    }

    pub(crate) fn stop(self, reason: StopReason) {
        self.0.send_replace(Some(reason));
    }
}

impl StopListener {
    /// Resolves with the reason once the run is stopped. Dropping the
    /// [`Stopper`] without a reason counts as [`StopReason::Abandoned`].
    pub(crate) async fn stopped(&mut self) -> StopReason {
        match self.0.wait_for(Option::is_some).await {
            Ok(reason) => (*reason).unwrap_or(StopReason::Abandoned),
            Err(_closed) => StopReason::Abandoned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    #[tokio::test(start_paused = true)]
    async fn pending_until_stopped() {
        let stopper = Stopper::new();
        let mut listener = stopper.listener();

        assert!(
            timeout(Duration::from_millis(10), listener.stopped())
                .await
                .is_err()
        );

        let reason = StopReason::TimedOut(Duration::from_millis(50));
        stopper.stop(reason);
        assert_eq!(listener.stopped().await, reason);
        // late listeners still see it
        assert_eq!(listener.clone().stopped().await, reason);
    }

    #[tokio::test]
    async fn dropped_stopper_abandons_the_run() {
        let stopper = Stopper::new();
        let mut listener = stopper.listener();

        drop(stopper);
        assert_eq!(listener.stopped().await, StopReason::Abandoned);
    }

    #[test]
    fn display() {
        assert_eq!(
            StopReason::TimedOut(Duration::from_millis(50)).to_string(),
            "timed out after 50ms"
        );
        assert_eq!(StopReason::Abandoned.to_string(), "abandoned");
    }
}
