use std::sync::Arc;

use thiserror::Error;

use crate::{
    client::SematextClient,
    filter::{AllMetrics, MetricFilter},
    reporter::SematextReporter,
    source::MetricSource,
    translate::Translator,
    unit::TimeUnit,
};

const DEFAULT_RATE_UNIT: TimeUnit = TimeUnit::Seconds;
const DEFAULT_DURATION_UNIT: TimeUnit = TimeUnit::Milliseconds;

/// Errors that could occur while building, starting, or installing a Sematext reporter.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No client was configured.
    #[error("client should be defined")]
    MissingClient,

    /// No registry was configured.
    #[error("registry should be defined")]
    MissingRegistry,

    /// No filter was configured.
    #[error("filter should be defined")]
    MissingFilter,

    /// Failed to build a metric filter.
    #[error("invalid filter: {reason}")]
    InvalidFilter {
        /// Details about the failure.
        reason: String,
    },

    /// A scheduled reporter was started with a zero interval.
    #[error("reporting interval must be greater than zero")]
    InvalidInterval,

    /// Failed to spawn the background thread for a scheduled reporter.
    #[error("failed to spawn background thread for scheduled reporter")]
    Backend,

    /// Failed to install the recorder due to an existing global recorder already being installed.
    #[error("failed to install recorder as global recorder")]
    FailedToInstall,
}

/// Builder for a [`SematextReporter`].
///
/// A client, a registry, and a filter must be configured before the reporter can be built. Rate and duration units are
/// optional.
pub struct ReporterBuilder {
    client: Option<Arc<dyn SematextClient>>,
    registry: Option<Arc<dyn MetricSource>>,
    filter: Option<Box<dyn MetricFilter>>,
    rate_unit: TimeUnit,
    duration_unit: TimeUnit,
}

impl ReporterBuilder {
    /// Sets the client that datapoints are sent through.
    #[must_use]
    pub fn with_client<C>(mut self, client: C) -> Self
    where
        C: SematextClient + 'static,
    {
        self.client = Some(Arc::new(client));
        self
    }

    /// Sets the registry to report metrics from.
    ///
    /// Either registry generation can be used: a shared [`MetricsRegistry`][crate::registry::MetricsRegistry], or a
    /// [`SematextRecorder`][crate::SematextRecorder] collecting metrics from the `metrics` facade.
    #[must_use]
    pub fn with_registry<S>(mut self, registry: S) -> Self
    where
        S: MetricSource + 'static,
    {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Sets the filter that selects which metrics are reported.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: MetricFilter + 'static,
    {
        self.filter = Some(Box::new(filter));
        self
    }

    /// Reports every registered metric.
    ///
    /// Equivalent to `with_filter(AllMetrics)`.
    #[must_use]
    pub fn with_all_metrics(self) -> Self {
        self.with_filter(AllMetrics)
    }

    /// Sets the unit that meter rates are reported in, as events per unit.
    ///
    /// Only applies to registries that scale their rates; see
    /// [`MetricSource::scales_rates`][crate::MetricSource::scales_rates].
    ///
    /// Defaults to seconds.
    #[must_use]
    pub fn with_rate_unit(mut self, rate_unit: TimeUnit) -> Self {
        self.rate_unit = rate_unit;
        self
    }

    /// Sets the unit that timer durations are reported in.
    ///
    /// Defaults to milliseconds.
    #[must_use]
    pub fn with_duration_unit(mut self, duration_unit: TimeUnit) -> Self {
        self.duration_unit = duration_unit;
        self
    }

    /// Builds the reporter.
    ///
    /// # Errors
    ///
    /// If the client, registry, or filter was not configured, an error will be returned.
    pub fn build(self) -> Result<SematextReporter, BuildError> {
        let client = self.client.ok_or(BuildError::MissingClient)?;
        let registry = self.registry.ok_or(BuildError::MissingRegistry)?;
        let filter = self.filter.ok_or(BuildError::MissingFilter)?;

        let translator = Translator::new(self.rate_unit, self.duration_unit, registry.scales_rates());

        Ok(SematextReporter::new(client, registry, filter, translator))
    }
}

impl Default for ReporterBuilder {
    fn default() -> Self {
        ReporterBuilder {
            client: None,
            registry: None,
            filter: None,
            rate_unit: DEFAULT_RATE_UNIT,
            duration_unit: DEFAULT_DURATION_UNIT,
        }
    }
}
