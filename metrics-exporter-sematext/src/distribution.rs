use metrics::HistogramFn;
use parking_lot::Mutex;

use crate::kind::Snapshot;

/// Running summary of a distribution.
///
/// Only the count, sum, and extremes are tracked, which is everything needed to produce a [`Snapshot`]. Memory usage is
/// constant regardless of how many values are recorded, and reading the summary does not reset it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Summary {
    count: u64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Summary {
    fn record(&mut self, value: f64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        self.sum += value;
    }

    fn snapshot(&self) -> Snapshot {
        if self.count == 0 {
            return Snapshot::default();
        }

        Snapshot { min: self.min, max: self.max, mean: self.sum / self.count as f64 }
    }
}

/// A thread-safe distribution of `f64` values.
#[derive(Debug, Default)]
pub(crate) struct AtomicDistribution {
    inner: Mutex<Summary>,
}

impl AtomicDistribution {
    /// Creates a new, empty `AtomicDistribution`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value.
    pub fn record(&self, value: f64) {
        self.inner.lock().record(value);
    }

    /// Gets the number of values recorded.
    pub fn count(&self) -> u64 {
        self.inner.lock().count
    }

    /// Takes a snapshot of the distribution.
    ///
    /// An empty distribution reports zero for all values.
    pub fn snapshot(&self) -> Snapshot {
        self.inner.lock().snapshot()
    }
}

impl HistogramFn for AtomicDistribution {
    fn record(&self, value: f64) {
        AtomicDistribution::record(self, value);
    }

    fn record_many(&self, value: f64, count: usize) {
        let mut inner = self.inner.lock();
        for _ in 0..count {
            inner.record(value);
        }
    }
}
