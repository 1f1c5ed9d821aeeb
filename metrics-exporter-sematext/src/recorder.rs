use std::{
    collections::HashMap,
    sync::{atomic::Ordering, Arc},
};

use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
use metrics_util::registry::Registry;
use parking_lot::RwLock;
use quanta::Clock;

use crate::{
    builder::BuildError,
    filter::MetricFilter,
    kind::{GaugeValue, Metric, MetricKind, Snapshot},
    name::MetricName,
    source::{MetricError, MetricSource},
    storage::SematextStorage,
    unit::TimeUnit,
};

struct Inner {
    registry: Registry<Key, SematextStorage>,
    counter_units: RwLock<HashMap<String, Unit>>,
    histogram_units: RwLock<HashMap<String, Unit>>,
    clock: Clock,
}

impl Inner {
    fn counter_unit(&self, key: &Key) -> Option<Unit> {
        self.counter_units.read().get(key.name()).cloned()
    }

    fn histogram_time_unit(&self, key: &Key) -> Option<TimeUnit> {
        self.histogram_units.read().get(key.name()).and_then(TimeUnit::from_metrics_unit)
    }
}

/// A recorder that collects metrics from the [`metrics`] facade for reporting to Sematext.
///
/// Counters, gauges, and histograms are mapped onto Sematext metric kinds as follows:
///
/// - counters described with [`Unit::CountPerSecond`] are reported as meters, with their mean rate since registration
/// - all other counters are reported as counters
/// - gauges are reported as gauges
/// - histograms described with a unit of time (seconds, milliseconds, microseconds, or nanoseconds) are reported as
///   timers, and their values are converted to the reporter's duration unit
/// - all other histograms are reported as histograms
///
/// Metric names are built from the key name, with the `group`, `type`, and `scope` labels filling in the matching
/// segments of a [`MetricName`]. Other labels are not part of the reported name, so keys that differ only in other
/// labels collide and are reported as separate datapoints under the same name.
///
/// Clone is shallow; clones share the same underlying data.
#[derive(Clone)]
pub struct SematextRecorder {
    inner: Arc<Inner>,
}

impl SematextRecorder {
    /// Creates a new `SematextRecorder`.
    pub fn new() -> Self {
        Self::with_clock(Clock::new())
    }

    /// Creates a new `SematextRecorder` that measures meter rates with the given clock.
    pub fn with_clock(clock: Clock) -> Self {
        let inner = Inner {
            registry: Registry::new(SematextStorage::new(clock.clone())),
            counter_units: RwLock::default(),
            histogram_units: RwLock::default(),
            clock,
        };
        SematextRecorder { inner: Arc::new(inner) }
    }

    /// Installs a clone of this recorder as the global recorder.
    ///
    /// The recorder itself can still be handed to a reporter afterwards, as clones share the same metrics.
    ///
    /// # Errors
    ///
    /// If a global recorder is already installed, an error will be returned.
    pub fn install(&self) -> Result<(), BuildError> {
        metrics::set_global_recorder(self.clone()).map_err(|_| BuildError::FailedToInstall)
    }

    fn collect(&self, filter: &dyn MetricFilter) -> Vec<(MetricKind, String, Metric)> {
        let inner = &self.inner;

        // Read everything first, so that the filter never runs while a registry shard is locked.
        let mut readings = Vec::new();
        let now = inner.clock.now();
        inner.registry.visit_counters(|key, counter| {
            let reading = if inner.counter_unit(key) == Some(Unit::CountPerSecond) {
                Metric::Meter { count: counter.count(), mean_rate: counter.mean_rate(now) }
            } else {
                Metric::Counter(i64::try_from(counter.count()).unwrap_or(i64::MAX))
            };
            readings.push((key.clone(), reading));
        });

        inner.registry.visit_gauges(|key, gauge| {
            let value = f64::from_bits(gauge.load(Ordering::Acquire));
            readings.push((key.clone(), Metric::Gauge(GaugeValue::Float(value))));
        });

        inner.registry.visit_histograms(|key, histogram| {
            let snapshot = histogram.snapshot();
            let reading = match inner.histogram_time_unit(key) {
                Some(unit) => Metric::Timer(to_nanos(snapshot, unit)),
                None => Metric::Histogram(snapshot),
            };
            readings.push((key.clone(), reading));
        });

        let mut collected = readings
            .into_iter()
            .map(|(key, metric)| (metric.kind(), MetricName::from(&key).format(), metric))
            .filter(|(kind, name, _)| filter.matches(name, *kind))
            .collect::<Vec<_>>();
        collected.sort_by(|(ak, an, _), (bk, bn, _)| ak.cmp(bk).then_with(|| an.cmp(bn)));
        collected
    }
}

impl Default for SematextRecorder {
    fn default() -> Self {
        SematextRecorder::new()
    }
}

fn to_nanos(snapshot: Snapshot, unit: TimeUnit) -> Snapshot {
    let scale = unit.as_nanos() as f64;
    Snapshot { min: snapshot.min * scale, max: snapshot.max * scale, mean: snapshot.mean * scale }
}

impl MetricSource for SematextRecorder {
    fn visit_metrics(
        &self,
        filter: &dyn MetricFilter,
        visitor: &mut dyn FnMut(&str, Result<Metric, MetricError>),
    ) {
        for (_, name, metric) in self.collect(filter) {
            visitor(&name, Ok(metric));
        }
    }
}

impl Recorder for SematextRecorder {
    fn describe_counter(&self, key: KeyName, unit: Option<Unit>, _: SharedString) {
        if let Some(unit) = unit {
            self.inner.counter_units.write().insert(key.as_str().to_string(), unit);
        }
    }

    fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

    fn describe_histogram(&self, key: KeyName, unit: Option<Unit>, _: SharedString) {
        if let Some(unit) = unit {
            self.inner.histogram_units.write().insert(key.as_str().to_string(), unit);
        }
    }

    fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
        self.inner
            .registry
            .get_or_create_counter(key, |existing| Counter::from_arc(Arc::clone(existing)))
    }

    fn register_gauge(&self, key: &Key, _: &Metadata<'_>) -> Gauge {
        self.inner.registry.get_or_create_gauge(key, |existing| Gauge::from_arc(Arc::clone(existing)))
    }

    fn register_histogram(&self, key: &Key, _: &Metadata<'_>) -> Histogram {
        self.inner
            .registry
            .get_or_create_histogram(key, |existing| Histogram::from_arc(Arc::clone(existing)))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use approx::assert_relative_eq;
    use metrics::{
        counter, describe_counter, describe_histogram, gauge, histogram, with_local_recorder, Unit,
    };
    use quanta::Clock;

    use super::SematextRecorder;
    use crate::{
        filter::{AllMetrics, MetricFilter},
        kind::{GaugeValue, Metric, MetricKind, Snapshot},
        source::MetricSource,
    };

    fn collect(recorder: &SematextRecorder, filter: &dyn MetricFilter) -> Vec<(String, Metric)> {
        let mut visited = Vec::new();
        recorder.visit_metrics(filter, &mut |name, metric| {
            visited.push((name.to_string(), metric.expect("recorder reads are infallible")));
        });
        visited
    }

    #[test]
    fn counters_gauges_and_histograms() {
        let recorder = SematextRecorder::new();
        with_local_recorder(&recorder, || {
            counter!("requests", "type" => "Server").increment(3);
            counter!("requests", "type" => "Server").increment(4);
            gauge!("queue.depth").set(12.5);
            histogram!("payload.size").record(100.0);
            histogram!("payload.size").record(300.0);
        });

        let visited = collect(&recorder, &AllMetrics);
        assert_eq!(
            visited,
            vec![
                ("queue.depth".to_string(), Metric::Gauge(GaugeValue::Float(12.5))),
                (
                    "payload.size".to_string(),
                    Metric::Histogram(Snapshot { min: 100.0, max: 300.0, mean: 200.0 })
                ),
                ("Server.requests".to_string(), Metric::Counter(7)),
            ]
        );
    }

    #[test]
    fn time_unit_histograms_are_timers() {
        let recorder = SematextRecorder::new();
        with_local_recorder(&recorder, || {
            describe_histogram!("db.query", Unit::Milliseconds, "query latency");
            histogram!("db.query").record(2.0);
            histogram!("db.query").record(4.0);

            describe_histogram!("rpc.call", Unit::Seconds, "call latency");
            histogram!("rpc.call").record(0.5);
        });

        let visited = collect(&recorder, &AllMetrics);
        let kinds = visited.iter().map(|(_, m)| m.kind()).collect::<Vec<_>>();
        assert_eq!(kinds, [MetricKind::Timer, MetricKind::Timer]);

        assert_eq!(visited[0].0, "db.query");
        match visited[0].1 {
            Metric::Timer(snapshot) => {
                assert_relative_eq!(snapshot.min, 2_000_000.0);
                assert_relative_eq!(snapshot.max, 4_000_000.0);
                assert_relative_eq!(snapshot.mean, 3_000_000.0);
            }
            ref other => panic!("unexpected reading: {other:?}"),
        }

        assert_eq!(visited[1].0, "rpc.call");
        match visited[1].1 {
            Metric::Timer(snapshot) => assert_relative_eq!(snapshot.mean, 500_000_000.0),
            ref other => panic!("unexpected reading: {other:?}"),
        }
    }

    #[test]
    fn count_per_second_counters_are_meters() {
        let (clock, mock) = Clock::mock();
        let recorder = SematextRecorder::with_clock(clock);
        with_local_recorder(&recorder, || {
            describe_counter!("logins", Unit::CountPerSecond, "successful logins");
            counter!("logins").increment(20);
        });
        mock.increment(Duration::from_secs(4));

        let visited = collect(&recorder, &AllMetrics);
        assert_eq!(visited.len(), 1);
        assert_eq!(visited[0].0, "logins");
        match visited[0].1 {
            Metric::Meter { count, mean_rate } => {
                assert_eq!(count, 20);
                assert_relative_eq!(mean_rate, 5.0);
            }
            ref other => panic!("unexpected reading: {other:?}"),
        }
    }

    #[test]
    fn names_use_structured_labels() {
        let recorder = SematextRecorder::new();
        with_local_recorder(&recorder, || {
            counter!("hits", "group" => "web", "type" => "Cache", "scope" => "eu", "host" => "a1")
                .increment(1);
        });

        let visited = collect(&recorder, &AllMetrics);
        assert_eq!(visited, vec![("web.Cache.hits.eu".to_string(), Metric::Counter(1))]);
    }

    #[test]
    fn keys_differing_in_other_labels_share_a_name() {
        let recorder = SematextRecorder::new();
        with_local_recorder(&recorder, || {
            counter!("hits", "type" => "Cache", "host" => "a1").increment(1);
            counter!("hits", "type" => "Cache", "host" => "b2").increment(2);
        });

        let mut visited = collect(&recorder, &AllMetrics);
        visited.sort_by_key(|(_, metric)| match metric {
            Metric::Counter(count) => *count,
            _ => 0,
        });
        assert_eq!(
            visited,
            vec![
                ("Cache.hits".to_string(), Metric::Counter(1)),
                ("Cache.hits".to_string(), Metric::Counter(2)),
            ]
        );
    }

    #[test]
    fn filter_applies_to_formatted_names() {
        let recorder = SematextRecorder::new();
        with_local_recorder(&recorder, || {
            counter!("hits", "type" => "Cache").increment(1);
            counter!("misses", "type" => "Cache").increment(1);
            gauge!("hits.ratio").set(0.5);
        });

        let filter = |name: &str, kind: MetricKind| name == "Cache.hits" || kind == MetricKind::Gauge;
        let names = collect(&recorder, &filter).into_iter().map(|(name, _)| name).collect::<Vec<_>>();
        assert_eq!(names, ["hits.ratio", "Cache.hits"]);
    }

    #[test]
    fn clones_share_metrics() {
        let recorder = SematextRecorder::new();
        let clone = recorder.clone();
        with_local_recorder(&clone, || counter!("shared").increment(2));

        assert_eq!(collect(&recorder, &AllMetrics), vec![("shared".to_string(), Metric::Counter(2))]);
    }
}
