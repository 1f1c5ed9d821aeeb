//! A registry of metrics identified by structured names.
//!
//! [`MetricsRegistry`] holds counters, gauges, meters, histograms, and timers keyed by [`MetricName`], and can be
//! reported to Sematext by passing it to [`ReporterBuilder::with_registry`][crate::ReporterBuilder::with_registry].
//!
//! Names are formatted as dotted strings (see [`MetricName::format`]) before being matched against the reporter's
//! filter and written into datapoints. Meter rates from this registry are always reported as events per second.
mod handles;

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;
use quanta::Clock;

pub use self::handles::{Counter, Gauge, Histogram, Meter, Timer};
use crate::{
    filter::MetricFilter,
    kind::{GaugeValue, Metric, MetricKind},
    name::MetricName,
    source::{MetricError, MetricSource},
};

type Handles<T> = RwLock<HashMap<MetricName, Arc<T>>>;

/// A registry of metrics identified by [`MetricName`].
pub struct MetricsRegistry {
    counters: Handles<Counter>,
    gauges: Handles<Gauge>,
    meters: Handles<Meter>,
    histograms: Handles<Histogram>,
    timers: Handles<Timer>,
    clock: Clock,
}

impl MetricsRegistry {
    /// Creates an empty `MetricsRegistry`.
    pub fn new() -> Self {
        Self::with_clock(Clock::new())
    }

    /// Creates an empty `MetricsRegistry` that measures time with the given clock.
    ///
    /// The clock is used by meters, to calculate their mean rate, and by [`Timer::time`].
    pub fn with_clock(clock: Clock) -> Self {
        MetricsRegistry {
            counters: RwLock::default(),
            gauges: RwLock::default(),
            meters: RwLock::default(),
            histograms: RwLock::default(),
            timers: RwLock::default(),
            clock,
        }
    }

    /// Gets the counter registered under `name`, creating it if it doesn't yet exist.
    pub fn counter(&self, name: MetricName) -> Arc<Counter> {
        get_or_create(&self.counters, name, Counter::new)
    }

    /// Gets the meter registered under `name`, creating it if it doesn't yet exist.
    pub fn meter(&self, name: MetricName) -> Arc<Meter> {
        get_or_create(&self.meters, name, || Meter::new(self.clock.clone()))
    }

    /// Gets the histogram registered under `name`, creating it if it doesn't yet exist.
    pub fn histogram(&self, name: MetricName) -> Arc<Histogram> {
        get_or_create(&self.histograms, name, Histogram::new)
    }

    /// Gets the timer registered under `name`, creating it if it doesn't yet exist.
    pub fn timer(&self, name: MetricName) -> Arc<Timer> {
        get_or_create(&self.timers, name, || Timer::new(self.clock.clone()))
    }

    /// Registers a gauge whose value is read by calling `read`.
    ///
    /// Any gauge previously registered under the same name is replaced.
    pub fn gauge<F, V>(&self, name: MetricName, read: F) -> Arc<Gauge>
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<GaugeValue>,
    {
        self.register_gauge(name, Gauge::new(move || Ok(read().into())))
    }

    /// Registers a gauge whose value is read by calling a fallible `read`.
    ///
    /// When `read` fails, the gauge is skipped for that reporting cycle and the error is logged.
    ///
    /// Any gauge previously registered under the same name is replaced.
    pub fn fallible_gauge<F, V, E>(&self, name: MetricName, read: F) -> Arc<Gauge>
    where
        F: Fn() -> Result<V, E> + Send + Sync + 'static,
        V: Into<GaugeValue>,
        E: std::fmt::Display,
    {
        self.register_gauge(
            name,
            Gauge::new(move || {
                read().map(Into::into).map_err(|e| MetricError::Callback { reason: e.to_string() })
            }),
        )
    }

    fn register_gauge(&self, name: MetricName, gauge: Gauge) -> Arc<Gauge> {
        let gauge = Arc::new(gauge);
        self.gauges.write().insert(name, Arc::clone(&gauge));
        gauge
    }

    /// Removes every metric registered under `name`, of any kind.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&self, name: &MetricName) -> bool {
        let removed = [
            self.counters.write().remove(name).is_some(),
            self.gauges.write().remove(name).is_some(),
            self.meters.write().remove(name).is_some(),
            self.histograms.write().remove(name).is_some(),
            self.timers.write().remove(name).is_some(),
        ];
        removed.contains(&true)
    }

    /// Gets the number of registered metrics, across all kinds.
    pub fn len(&self) -> usize {
        self.counters.read().len()
            + self.gauges.read().len()
            + self.meters.read().len()
            + self.histograms.read().len()
            + self.timers.read().len()
    }

    /// Returns `true` if no metrics are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        MetricsRegistry::new()
    }
}

impl MetricSource for MetricsRegistry {
    fn visit_metrics(
        &self,
        filter: &dyn MetricFilter,
        visitor: &mut dyn FnMut(&str, Result<Metric, MetricError>),
    ) {
        for kind in MetricKind::ALL {
            match kind {
                MetricKind::Timer => visit(&self.timers, kind, filter, visitor, |t| {
                    Ok(Metric::Timer(t.snapshot()))
                }),
                MetricKind::Meter => visit(&self.meters, kind, filter, visitor, |m| {
                    Ok(Metric::Meter { count: m.count(), mean_rate: m.mean_rate() })
                }),
                MetricKind::Gauge => {
                    visit(&self.gauges, kind, filter, visitor, |g| g.value().map(Metric::Gauge));
                }
                MetricKind::Histogram => visit(&self.histograms, kind, filter, visitor, |h| {
                    Ok(Metric::Histogram(h.snapshot()))
                }),
                MetricKind::Counter => {
                    visit(&self.counters, kind, filter, visitor, |c| Ok(Metric::Counter(c.count())));
                }
            }
        }
    }

    fn scales_rates(&self) -> bool {
        false
    }
}

fn get_or_create<T, F>(handles: &Handles<T>, name: MetricName, create: F) -> Arc<T>
where
    F: FnOnce() -> T,
{
    if let Some(existing) = handles.read().get(&name) {
        return Arc::clone(existing);
    }

    Arc::clone(handles.write().entry(name).or_insert_with(|| Arc::new(create())))
}

/// Visits the handles of a single kind, in name order.
///
/// Handles are collected up front so that no lock is held while metrics are read: gauge callbacks are free to touch
/// the registry.
fn visit<T, R>(
    handles: &Handles<T>,
    kind: MetricKind,
    filter: &dyn MetricFilter,
    visitor: &mut dyn FnMut(&str, Result<Metric, MetricError>),
    read: R,
) where
    R: Fn(&T) -> Result<Metric, MetricError>,
{
    let mut selected = handles
        .read()
        .iter()
        .map(|(name, handle)| (name.format(), Arc::clone(handle)))
        .filter(|(name, _)| filter.matches(name, kind))
        .collect::<Vec<_>>();
    selected.sort_by(|(a, _), (b, _)| a.cmp(b));

    for (name, handle) in selected {
        visitor(&name, read(&handle));
    }
}
