use crate::{
    datapoint::{AggregationType, Datapoint},
    kind::{GaugeValue, Metric, Snapshot},
    unit::TimeUnit,
};

/// Converts metric readings into datapoints.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Translator {
    rate_unit: TimeUnit,
    duration_unit: TimeUnit,
    scale_rates: bool,
}

impl Translator {
    pub fn new(rate_unit: TimeUnit, duration_unit: TimeUnit, scale_rates: bool) -> Self {
        Translator { rate_unit, duration_unit, scale_rates }
    }

    /// Translates a single reading into datapoints, appending them to `out`.
    ///
    /// Returns the number of datapoints appended.
    pub fn translate(&self, name: &str, metric: &Metric, out: &mut Vec<Datapoint>) -> usize {
        let before = out.len();
        match metric {
            Metric::Counter(count) => {
                out.push(Datapoint::new(name, *count as f64, AggregationType::Avg));
            }
            Metric::Gauge(value) => self.translate_gauge(name, value, out),
            Metric::Meter { mean_rate, .. } => {
                let rate =
                    if self.scale_rates { self.rate_unit.convert_rate(*mean_rate) } else { *mean_rate };
                out.push(Datapoint::new(name, rate, AggregationType::Avg));
            }
            Metric::Histogram(snapshot) => push_triad(name, snapshot, |v| v, out),
            Metric::Timer(snapshot) => {
                push_triad(name, snapshot, |nanos| self.duration_unit.convert_duration(nanos), out);
            }
        }

        out.len() - before
    }

    #[allow(clippy::unused_self)]
    fn translate_gauge(&self, name: &str, value: &GaugeValue, out: &mut Vec<Datapoint>) {
        // Non-numeric gauges have nothing meaningful to aggregate, so they're dropped.
        if let Some(value) = value.as_f64() {
            out.push(Datapoint::new(name, value, AggregationType::Avg));
        }
    }
}

fn push_triad<F>(name: &str, snapshot: &Snapshot, convert: F, out: &mut Vec<Datapoint>)
where
    F: Fn(f64) -> f64,
{
    out.push(Datapoint::tagged(name, convert(snapshot.min), AggregationType::Min));
    out.push(Datapoint::tagged(name, convert(snapshot.max), AggregationType::Max));
    out.push(Datapoint::tagged(name, convert(snapshot.mean), AggregationType::Avg));
}
