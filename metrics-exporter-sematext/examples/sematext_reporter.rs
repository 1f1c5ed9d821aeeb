use std::{sync::Arc, thread::sleep, time::Duration};

use metrics::{counter, describe_histogram, histogram, Unit};
use metrics_exporter_sematext::{
    registry::MetricsRegistry, Datapoint, MetricName, SematextRecorder, SematextReporter,
};
use tracing::info;

fn log_client(datapoints: Vec<Datapoint>) {
    for dp in datapoints {
        info!(
            name = dp.name(),
            value = dp.value(),
            aggregation = %dp.aggregation(),
            filter1 = dp.filter1(),
            "Datapoint."
        );
    }
}

fn main() {
    tracing_subscriber::fmt::init();

    // Structured registry, with a callback gauge.
    let registry = Arc::new(MetricsRegistry::new());
    let requests = registry.meter(MetricName::for_type("demo", "Server", "requests"));
    let latency = registry.timer(MetricName::for_type("demo", "Server", "latency"));
    registry.gauge(MetricName::for_type("demo", "Server", "threads"), || 4u32);

    let structured = SematextReporter::for_client(log_client)
        .with_registry(Arc::clone(&registry))
        .with_all_metrics()
        .build()
        .expect("failed to build reporter")
        .start(Duration::from_secs(1))
        .expect("failed to start reporter");

    // `metrics` facade, through the recorder.
    let recorder = SematextRecorder::new();
    recorder.install().expect("failed to install recorder");
    describe_histogram!("job.duration", Unit::Seconds, "time spent per job");

    let facade = SematextReporter::for_client(log_client)
        .with_registry(recorder)
        .with_all_metrics()
        .build()
        .expect("failed to build reporter")
        .start(Duration::from_secs(1))
        .expect("failed to start reporter");

    for i in 0..50u64 {
        requests.mark();
        latency.time(|| sleep(Duration::from_millis(20 + i % 7)));

        counter!("jobs", "type" => "Worker").increment(1);
        histogram!("job.duration", "type" => "Worker").record(0.02 + (i % 5) as f64 / 100.0);
        sleep(Duration::from_millis(80));
    }

    structured.stop();
    facade.stop();
}
