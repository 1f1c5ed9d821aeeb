use std::{sync::Arc, time::Duration};

use tracing::{debug, error, trace};

use crate::{
    builder::{BuildError, ReporterBuilder},
    client::SematextClient,
    datapoint::Datapoint,
    filter::MetricFilter,
    scheduler::{self, ReporterHandle},
    source::MetricSource,
    translate::Translator,
};

/// Totals for a single reporting cycle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ReportSummary {
    /// Number of metrics that passed the filter.
    pub metrics: usize,

    /// Number of datapoints handed to the client.
    pub datapoints: usize,

    /// Number of metrics that could not be read, and were skipped.
    pub failures: usize,
}

/// Reports the metrics of a registry to Sematext.
///
/// Each call to [`report`][Self::report] snapshots every metric accepted by the filter, translates the readings into
/// datapoints, and hands them to the client as a single batch.
pub struct SematextReporter {
    client: Arc<dyn SematextClient>,
    source: Arc<dyn MetricSource>,
    filter: Box<dyn MetricFilter>,
    translator: Translator,
}

impl SematextReporter {
    pub(crate) fn new(
        client: Arc<dyn SematextClient>,
        source: Arc<dyn MetricSource>,
        filter: Box<dyn MetricFilter>,
        translator: Translator,
    ) -> Self {
        SematextReporter { client, source, filter, translator }
    }

    /// Creates a [`ReporterBuilder`] with the given client already configured.
    pub fn for_client<C>(client: C) -> ReporterBuilder
    where
        C: SematextClient + 'static,
    {
        ReporterBuilder::default().with_client(client)
    }

    /// Runs a single reporting cycle.
    ///
    /// Metrics are visited by kind (timers, meters, gauges, histograms, and then counters) and by name within each
    /// kind. A metric that cannot be read is logged and skipped without affecting the rest of the cycle.
    ///
    /// The client is called exactly once, even when there are no datapoints to send.
    pub fn report(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        let mut datapoints: Vec<Datapoint> = Vec::new();

        self.source.visit_metrics(&*self.filter, &mut |name, reading| {
            summary.metrics += 1;
            match reading {
                Ok(metric) => {
                    let produced = self.translator.translate(name, &metric, &mut datapoints);
                    trace!(metric_name = name, kind = %metric.kind(), produced, "Translated metric.");
                }
                Err(e) => {
                    summary.failures += 1;
                    error!(metric_name = name, error = %e, "Failed to read metric. Skipping.");
                }
            }
        });

        summary.datapoints = datapoints.len();
        debug!(
            metrics = summary.metrics,
            datapoints = summary.datapoints,
            failures = summary.failures,
            "Sending datapoints."
        );
        self.client.send(datapoints);

        summary
    }

    /// Starts reporting on a background thread, once every `interval`.
    ///
    /// The first report happens one interval after starting. When the returned handle is stopped or dropped, one final
    /// report is made before the thread exits.
    ///
    /// An interval too large to schedule is treated as never elapsing: the reporter then only reports once, when
    /// stopped.
    ///
    /// # Errors
    ///
    /// If `interval` is zero, or the background thread cannot be spawned, an error will be returned.
    pub fn start(self, interval: Duration) -> Result<ReporterHandle, BuildError> {
        scheduler::spawn(self, interval)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, Instant},
    };

    use approx::assert_relative_eq;
    use mockall::mock;
    use parking_lot::Mutex;
    use quanta::Clock;

    use super::{ReportSummary, SematextReporter};
    use crate::{
        builder::BuildError,
        client::SematextClient,
        datapoint::{AggregationType, Datapoint},
        kind::MetricKind,
        name::MetricName,
        registry::MetricsRegistry,
        unit::TimeUnit,
    };

    mock! {
        pub Client {}

        impl SematextClient for Client {
            fn send(&self, datapoints: Vec<Datapoint>);
        }
    }

    type Batches = Arc<Mutex<Vec<Vec<Datapoint>>>>;

    fn capturing_client() -> (impl SematextClient, Batches) {
        let batches = Batches::default();
        let sink = Arc::clone(&batches);
        (move |batch: Vec<Datapoint>| sink.lock().push(batch), batches)
    }

    #[test]
    fn sends_exactly_one_batch_per_report() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.counter(MetricName::new("jobs")).increment(3);
        registry.histogram(MetricName::new("sizes")).update(10.0);

        let mut client = MockClient::new();
        client
            .expect_send()
            .withf(|batch| batch.len() == 4)
            .times(1)
            .return_const(());

        let reporter = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .build()
            .expect("valid configuration");

        let summary = reporter.report();
        assert_eq!(summary, ReportSummary { metrics: 2, datapoints: 4, failures: 0 });
    }

    #[test]
    fn empty_batch_is_still_sent() {
        let mut client = MockClient::new();
        client.expect_send().withf(|batch| batch.is_empty()).times(1).return_const(());

        let reporter = SematextReporter::for_client(client)
            .with_registry(Arc::new(MetricsRegistry::new()))
            .with_filter(|_: &str, _: MetricKind| false)
            .build()
            .expect("valid configuration");

        assert_eq!(reporter.report(), ReportSummary::default());
    }

    #[test]
    fn batch_order_and_contents() {
        let (clock, mock) = Clock::mock();
        let registry = Arc::new(MetricsRegistry::with_clock(clock));
        registry.counter(MetricName::for_type("web", "Server", "requests")).increment(12);
        registry.gauge(MetricName::new("threads"), || 8u32);
        registry.timer(MetricName::new("db.query")).update(Duration::from_micros(2500));
        let meter = registry.meter(MetricName::new("logins"));
        meter.mark_n(120);
        mock.increment(Duration::from_secs(60));

        let (client, batches) = capturing_client();
        let reporter = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .with_rate_unit(TimeUnit::Minutes)
            .build()
            .expect("valid configuration");
        reporter.report();

        let batches = batches.lock();
        assert_eq!(batches.len(), 1);
        let batch = &batches[0];

        let names = batch.iter().map(Datapoint::name).collect::<Vec<_>>();
        assert_eq!(
            names,
            ["db.query", "db.query", "db.query", "logins", "threads", "web.Server.requests"]
        );

        let aggregations = batch.iter().map(Datapoint::aggregation).collect::<Vec<_>>();
        assert_eq!(
            aggregations,
            [
                AggregationType::Min,
                AggregationType::Max,
                AggregationType::Avg,
                AggregationType::Avg,
                AggregationType::Avg,
                AggregationType::Avg
            ]
        );

        // Timer values are converted to milliseconds, the default duration unit.
        assert_relative_eq!(batch[2].value(), 2.5);
        assert_eq!(batch[2].filter1(), Some("agg.type=avg"));

        // Meter rates from a structured registry are events per second, whatever the rate unit.
        assert_relative_eq!(batch[3].value(), 2.0);
        assert_eq!(batch[3].filter1(), None);

        assert_relative_eq!(batch[4].value(), 8.0);
        assert_relative_eq!(batch[5].value(), 12.0);
    }

    #[test]
    fn failing_metric_does_not_affect_others() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.fallible_gauge(MetricName::new("pool.size"), || Err::<u32, _>("pool closed"));
        registry.gauge(MetricName::new("pool.waiters"), || -> u32 { panic!("waiters unavailable") });
        registry.gauge(MetricName::new("pool.active"), || 3i64);

        let (client, batches) = capturing_client();
        let reporter = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .build()
            .expect("valid configuration");

        let summary = reporter.report();
        assert_eq!(summary, ReportSummary { metrics: 3, datapoints: 1, failures: 2 });

        let batches = batches.lock();
        assert_eq!(batches[0], vec![Datapoint::new("pool.active", 3.0, AggregationType::Avg)]);
    }

    #[test]
    fn reports_are_repeatable() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.histogram(MetricName::new("sizes")).update(4.0);
        registry.histogram(MetricName::new("sizes")).update(8.0);

        let (client, batches) = capturing_client();
        let reporter = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .build()
            .expect("valid configuration");
        reporter.report();
        reporter.report();

        let batches = batches.lock();
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], batches[1]);
    }

    #[test]
    fn stopping_makes_a_final_report() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.counter(MetricName::new("jobs")).inc();

        let (client, batches) = capturing_client();
        let handle = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .build()
            .expect("valid configuration")
            .start(Duration::from_secs(3600))
            .expect("thread spawned");

        let started = Instant::now();
        handle.stop();
        assert!(started.elapsed() < Duration::from_secs(60));

        let batches = batches.lock();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec![Datapoint::new("jobs", 1.0, AggregationType::Avg)]);
    }

    #[test]
    fn oversized_interval_still_makes_a_final_report() {
        let (client, batches) = capturing_client();
        let handle = SematextReporter::for_client(client)
            .with_registry(Arc::new(MetricsRegistry::new()))
            .with_all_metrics()
            .build()
            .expect("valid configuration")
            .start(Duration::MAX)
            .expect("thread spawned");

        handle.stop();
        assert_eq!(batches.lock().len(), 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let (client, batches) = capturing_client();
        let result = SematextReporter::for_client(client)
            .with_registry(Arc::new(MetricsRegistry::new()))
            .with_all_metrics()
            .build()
            .expect("valid configuration")
            .start(Duration::ZERO);

        assert!(matches!(result, Err(BuildError::InvalidInterval)));
        assert!(batches.lock().is_empty());
    }

    #[test]
    fn negative_counts_are_reported() {
        let registry = Arc::new(MetricsRegistry::new());
        registry.counter(MetricName::new("inflight")).dec();

        let (client, batches) = capturing_client();
        let reporter = SematextReporter::for_client(client)
            .with_registry(registry)
            .with_all_metrics()
            .build()
            .expect("valid configuration");
        reporter.report();

        let batches = batches.lock();
        assert_eq!(batches[0], vec![Datapoint::new("inflight", -1.0, AggregationType::Avg)]);
    }

    #[test]
    fn reports_periodically() {
        let (client, batches) = capturing_client();
        let handle = SematextReporter::for_client(client)
            .with_registry(Arc::new(MetricsRegistry::new()))
            .with_all_metrics()
            .build()
            .expect("valid configuration")
            .start(Duration::from_millis(10))
            .expect("thread spawned");

        std::thread::sleep(Duration::from_millis(100));
        drop(handle);

        assert!(batches.lock().len() >= 2);
    }
}
