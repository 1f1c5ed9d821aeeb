use std::{
    any::Any,
    fmt,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::atomic::{AtomicI64, AtomicU64, Ordering},
    time::Duration,
};

use quanta::{Clock, Instant};

use crate::{
    distribution::AtomicDistribution,
    kind::{GaugeValue, Snapshot},
    source::MetricError,
};

/// An incrementing and decrementing count.
///
/// The count is signed, so decrementing past zero yields a negative count.
#[derive(Debug, Default)]
pub struct Counter {
    count: AtomicI64,
}

impl Counter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Increments the counter by one.
    pub fn inc(&self) {
        self.increment(1);
    }

    /// Increments the counter by `value`.
    pub fn increment(&self, value: i64) {
        self.count.fetch_add(value, Ordering::Relaxed);
    }

    /// Decrements the counter by one.
    pub fn dec(&self) {
        self.decrement(1);
    }

    /// Decrements the counter by `value`.
    pub fn decrement(&self, value: i64) {
        self.count.fetch_sub(value, Ordering::Relaxed);
    }

    /// Resets the counter to zero.
    pub fn clear(&self) {
        self.count.store(0, Ordering::Release);
    }

    /// Gets the current count.
    pub fn count(&self) -> i64 {
        self.count.load(Ordering::Acquire)
    }
}

/// Marks the occurrence of events and measures their mean rate.
#[derive(Debug)]
pub struct Meter {
    count: AtomicU64,
    clock: Clock,
    start: Instant,
}

impl Meter {
    pub(crate) fn new(clock: Clock) -> Self {
        let start = clock.now();
        Meter { count: AtomicU64::new(0), clock, start }
    }

    /// Marks the occurrence of one event.
    pub fn mark(&self) {
        self.mark_n(1);
    }

    /// Marks the occurrence of `n` events.
    pub fn mark_n(&self, n: u64) {
        self.count.fetch_add(n, Ordering::Relaxed);
    }

    /// Gets the number of events marked.
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    /// Gets the mean rate of events since the meter was created, in events per second.
    ///
    /// A meter that has not been marked, or that was created in the same instant it is read, has a rate of zero.
    pub fn mean_rate(&self) -> f64 {
        let count = self.count();
        let elapsed = self.clock.now().duration_since(self.start).as_secs_f64();
        if count == 0 || elapsed <= 0.0 {
            return 0.0;
        }

        count as f64 / elapsed
    }
}

/// Tracks the distribution of arbitrary values.
#[derive(Debug, Default)]
pub struct Histogram {
    distribution: AtomicDistribution,
}

impl Histogram {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a value.
    pub fn update(&self, value: f64) {
        self.distribution.record(value);
    }

    /// Gets the number of values recorded.
    pub fn count(&self) -> u64 {
        self.distribution.count()
    }

    /// Takes a snapshot of the recorded values.
    pub fn snapshot(&self) -> Snapshot {
        self.distribution.snapshot()
    }
}

/// Tracks the distribution of durations.
///
/// Durations are stored with nanosecond precision and converted to the configured duration unit when reported.
#[derive(Debug)]
pub struct Timer {
    distribution: AtomicDistribution,
    clock: Clock,
}

impl Timer {
    pub(crate) fn new(clock: Clock) -> Self {
        Timer { distribution: AtomicDistribution::new(), clock }
    }

    /// Records a duration.
    pub fn update(&self, duration: Duration) {
        self.distribution.record(duration.as_nanos() as f64);
    }

    /// Runs `f`, recording how long it took.
    pub fn time<F, T>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
    {
        let start = self.clock.now();
        let result = f();
        self.update(self.clock.now().duration_since(start));
        result
    }

    /// Gets the number of durations recorded.
    pub fn count(&self) -> u64 {
        self.distribution.count()
    }

    /// Takes a snapshot of the recorded durations, in nanoseconds.
    pub fn snapshot(&self) -> Snapshot {
        self.distribution.snapshot()
    }
}

type ReadFn = dyn Fn() -> Result<GaugeValue, MetricError> + Send + Sync;

/// A value sampled on demand by calling a callback.
pub struct Gauge {
    read: Box<ReadFn>,
}

impl Gauge {
    pub(crate) fn new<F>(read: F) -> Self
    where
        F: Fn() -> Result<GaugeValue, MetricError> + Send + Sync + 'static,
    {
        Gauge { read: Box::new(read) }
    }

    /// Reads the current value of the gauge.
    ///
    /// # Errors
    ///
    /// If the callback returns an error, or panics, an error is returned.
    pub fn value(&self) -> Result<GaugeValue, MetricError> {
        catch_unwind(AssertUnwindSafe(|| (self.read)()))
            .unwrap_or_else(|payload| Err(MetricError::Panicked { reason: panic_reason(&*payload) }))
    }
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gauge").finish_non_exhaustive()
    }
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;
    use quanta::Clock;

    use super::{Counter, Gauge, Histogram, Meter, Timer};
    use crate::{kind::GaugeValue, source::MetricError};

    #[test]
    fn counter() {
        let counter = Counter::new();
        counter.inc();
        counter.increment(41);
        assert_eq!(counter.count(), 42);

        counter.increment(7);
        counter.clear();
        assert_eq!(counter.count(), 0);
    }

    #[test]
    fn counter_goes_negative() {
        let counter = Counter::new();
        counter.inc();
        counter.decrement(3);
        assert_eq!(counter.count(), -2);

        counter.dec();
        assert_eq!(counter.count(), -3);
    }

    #[test]
    fn meter_mean_rate() {
        let (clock, mock) = Clock::mock();
        let meter = Meter::new(clock);
        assert_relative_eq!(meter.mean_rate(), 0.0);

        meter.mark_n(30);
        assert_relative_eq!(meter.mean_rate(), 0.0);

        mock.increment(Duration::from_secs(10));
        meter.mark();
        meter.mark_n(9);
        assert_eq!(meter.count(), 40);
        assert_relative_eq!(meter.mean_rate(), 4.0);
    }

    #[test]
    fn histogram() {
        let histogram = Histogram::new();
        histogram.update(2.0);
        histogram.update(4.0);
        assert_eq!(histogram.count(), 2);
        assert_relative_eq!(histogram.snapshot().mean, 3.0);
    }

    #[test]
    fn timer() {
        let (clock, mock) = Clock::mock();
        let timer = Timer::new(clock);
        timer.update(Duration::from_millis(5));

        let value = timer.time(|| {
            mock.increment(Duration::from_millis(15));
            "done"
        });
        assert_eq!(value, "done");

        let snapshot = timer.snapshot();
        assert_eq!(timer.count(), 2);
        assert_relative_eq!(snapshot.min, 5_000_000.0);
        assert_relative_eq!(snapshot.max, 15_000_000.0);
        assert_relative_eq!(snapshot.mean, 10_000_000.0);
    }

    #[test]
    fn gauge_values_and_failures() {
        let gauge = Gauge::new(|| Ok(GaugeValue::from(12u32)));
        assert_eq!(gauge.value(), Ok(GaugeValue::Unsigned(12)));

        let failing = Gauge::new(|| Err(MetricError::Callback { reason: "pool closed".to_string() }));
        assert_eq!(
            failing.value(),
            Err(MetricError::Callback { reason: "pool closed".to_string() })
        );

        let panicking = Gauge::new(|| panic!("connection lost"));
        assert_eq!(
            panicking.value(),
            Err(MetricError::Panicked { reason: "connection lost".to_string() })
        );
    }
}
