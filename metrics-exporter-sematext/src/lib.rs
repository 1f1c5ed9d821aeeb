//! A metrics reporter for sending metrics to [Sematext][sematext].
//!
//! [sematext]: https://sematext.com/
//!
//! # Usage
//!
//! A reporter ties together three things: a registry to read metrics from, a filter that selects which metrics to
//! report, and a client that delivers the resulting datapoints:
//!
//! ```no_run
//! # use std::{sync::Arc, time::Duration};
//! # use metrics_exporter_sematext::{registry::MetricsRegistry, Datapoint, MetricName, SematextReporter, TimeUnit};
//! let registry = Arc::new(MetricsRegistry::new());
//! registry.counter(MetricName::for_type("web", "Server", "requests")).inc();
//!
//! // Any `Fn(Vec<Datapoint>)` can act as a client. Real clients handle transport, authentication, and buffering.
//! let client = |datapoints: Vec<Datapoint>| {
//!     for datapoint in datapoints {
//!         println!("{} = {}", datapoint.name(), datapoint.value());
//!     }
//! };
//!
//! let reporter = SematextReporter::for_client(client)
//!     .with_registry(Arc::clone(&registry))
//!     .with_all_metrics()
//!     .with_duration_unit(TimeUnit::Microseconds)
//!     .build()
//!     .expect("failed to build reporter");
//!
//! // Report once...
//! reporter.report();
//!
//! // ...or on a background thread, until the handle is stopped or dropped.
//! let handle = reporter.start(Duration::from_secs(10)).expect("failed to start reporter");
//! # handle.stop();
//! ```
//!
//! # Registries
//!
//! Two kinds of registry can be reported:
//!
//! - [`registry::MetricsRegistry`], holding counters, gauges, meters, histograms, and timers identified by structured
//!   [`MetricName`]s. Gauges are callbacks, and may fail without affecting the rest of a report.
//! - [`SematextRecorder`], a [`metrics`] recorder. Metrics registered through the `metrics` macros are reported, with
//!   the `group`, `type`, and `scope` labels filling in the name segments. Rates from this recorder are scaled by the
//!   configured rate unit.
//!
//! # Datapoints
//!
//! Every metric turns into one or more [`Datapoint`]s. Counters, numeric gauges, and meters produce a single `avg`
//! datapoint. Histograms and timers produce a `min`, `max`, and `avg` datapoint each, tagged with their aggregation
//! type so that Sematext can tell them apart.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod builder;
pub use self::builder::{BuildError, ReporterBuilder};

mod client;
pub use self::client::SematextClient;

mod datapoint;
pub use self::datapoint::{AggregationType, Datapoint};

mod distribution;

mod filter;
pub use self::filter::{AllMetrics, MetricFilter, PatternFilter};

mod kind;
pub use self::kind::{GaugeValue, Metric, MetricKind, Snapshot};

mod name;
pub use self::name::MetricName;

mod recorder;
pub use self::recorder::SematextRecorder;

pub mod registry;

mod reporter;
pub use self::reporter::{ReportSummary, SematextReporter};

mod scheduler;
pub use self::scheduler::ReporterHandle;

mod source;
pub use self::source::{MetricError, MetricSource};

mod storage;
mod translate;

mod unit;
pub use self::unit::TimeUnit;
