use crate::station::StationQueue;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Counts the running workers of one producer (a link, or the generator)
/// and tells the downstream station when the last one is gone.
///
/// Every worker owns a [`ProducerGuard`]; the guard is released when the
/// worker exits, whether it ran out of entities or was cancelled.
#[derive(Debug)]
pub(crate) struct Latch {
    remaining: AtomicUsize,
    downstream: Arc<StationQueue>,
}

/// A running worker of a [`Latch`].
#[derive(Debug)]
pub(crate) struct ProducerGuard(Arc<Latch>);

/// use total ordering for the atomic operations so the last worker
/// out is observed by exactly one guard.
const ORDERING: Ordering = Ordering::SeqCst;

impl Latch {
    /// Create a latch for `workers` workers feeding `downstream` and return
    /// their guards.
    pub(crate) fn new(workers: usize, downstream: Arc<StationQueue>) -> Vec<ProducerGuard> {
        let latch = Arc::new(Self {
            remaining: AtomicUsize::new(workers),
            downstream,
        });

        (0..workers)
            .map(|_| ProducerGuard(Arc::clone(&latch)))
            .collect()
    }

    #[cfg(test)]
    fn remaining(&self) -> usize {
        self.remaining.load(ORDERING)
    }
}

impl ProducerGuard {
    /// Workers of the same producer still running, this one included.
    #[cfg(test)]
    pub(crate) fn remaining(&self) -> usize {
        self.0.remaining()
    }
}

impl Drop for ProducerGuard {
    fn drop(&mut self) {
        if self.0.remaining.fetch_sub(1, ORDERING) == 1 {
            self.0.downstream.finish_producer();
        }
    }
}
