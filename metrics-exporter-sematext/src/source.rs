use std::sync::Arc;

use thiserror::Error;

use crate::{filter::MetricFilter, kind::Metric};

/// Errors that could occur while reading a single metric.
///
/// A failed read only affects the metric it belongs to: the reporter logs it and moves on to the next metric.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    /// A fallible gauge callback returned an error.
    #[error("gauge callback failed: {reason}")]
    Callback {
        /// Details about the failure.
        reason: String,
    },

    /// A gauge callback panicked.
    #[error("gauge callback panicked: {reason}")]
    Panicked {
        /// The panic message, if one could be extracted.
        reason: String,
    },
}

/// A source of metrics that can be reported to Sematext.
///
/// Implemented by both registry generations supported by this crate: the structured-name
/// [`MetricsRegistry`][crate::registry::MetricsRegistry] and the `metrics`-facade
/// [`SematextRecorder`][crate::SematextRecorder].
pub trait MetricSource: Send + Sync {
    /// Visits every registered metric accepted by `filter`.
    ///
    /// The visitor is called with the formatted name of each metric along with its current reading. Implementations
    /// should visit metrics grouped by kind in [`MetricKind::ALL`][crate::MetricKind::ALL] order, and sorted by name
    /// within each kind.
    fn visit_metrics(
        &self,
        filter: &dyn MetricFilter,
        visitor: &mut dyn FnMut(&str, Result<Metric, MetricError>),
    );

    /// Whether or not meter rates from this source should be scaled by the configured rate unit.
    ///
    /// When `false`, meter rates are reported as raw events per second.
    ///
    /// Defaults to `true`.
    fn scales_rates(&self) -> bool {
        true
    }
}

impl<S> MetricSource for Arc<S>
where
    S: MetricSource + ?Sized,
{
    fn visit_metrics(
        &self,
        filter: &dyn MetricFilter,
        visitor: &mut dyn FnMut(&str, Result<Metric, MetricError>),
    ) {
        (**self).visit_metrics(filter, visitor);
    }

    fn scales_rates(&self) -> bool {
        (**self).scales_rates()
    }
}
