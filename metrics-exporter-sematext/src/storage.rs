use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use metrics::{CounterFn, Key};
use metrics_util::registry::Storage;
use quanta::{Clock, Instant};

use crate::distribution::AtomicDistribution;

/// A monotonic counter that remembers when it was created.
///
/// The creation time lets a counter double as a meter: its mean rate is the count divided by the time elapsed since
/// creation.
#[derive(Debug)]
pub(crate) struct AtomicCounter {
    value: AtomicU64,
    created: Instant,
}

impl AtomicCounter {
    fn new(created: Instant) -> Self {
        Self { value: AtomicU64::new(0), created }
    }

    /// Gets the current count.
    pub fn count(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Gets the mean rate of the counter since it was created, in events per second, as of `now`.
    pub fn mean_rate(&self, now: Instant) -> f64 {
        let count = self.count();
        let elapsed = now.duration_since(self.created).as_secs_f64();
        if count == 0 || elapsed <= 0.0 {
            return 0.0;
        }

        count as f64 / elapsed
    }
}

impl CounterFn for AtomicCounter {
    fn increment(&self, value: u64) {
        self.value.fetch_add(value, Ordering::Release);
    }

    fn absolute(&self, value: u64) {
        self.value.fetch_max(value, Ordering::AcqRel);
    }
}

/// Storage for metrics registered through the `metrics` facade.
///
/// - Counters are plain atomic counts, stamped with their creation time so they can be reported as meters.
/// - Gauges hold the bit pattern of their latest `f64` value.
/// - Histograms keep a running summary rather than individual samples, and are never reset by reading them.
pub(crate) struct SematextStorage {
    clock: Clock,
}

impl SematextStorage {
    /// Creates a new `SematextStorage`.
    pub fn new(clock: Clock) -> Self {
        Self { clock }
    }
}

impl Storage<Key> for SematextStorage {
    type Counter = Arc<AtomicCounter>;
    type Gauge = Arc<metrics::atomics::AtomicU64>;
    type Histogram = Arc<AtomicDistribution>;

    fn counter(&self, _: &Key) -> Self::Counter {
        Arc::new(AtomicCounter::new(self.clock.now()))
    }

    fn gauge(&self, _: &Key) -> Self::Gauge {
        Arc::new(metrics::atomics::AtomicU64::new(0))
    }

    fn histogram(&self, _: &Key) -> Self::Histogram {
        Arc::new(AtomicDistribution::new())
    }
}
