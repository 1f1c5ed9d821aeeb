use std::fmt;

/// Metric kind.
///
/// Defines the kind, or type, of a metric as seen by the reporter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub enum MetricKind {
    /// Timer type.
    Timer,
    /// Meter type.
    Meter,
    /// Gauge type.
    Gauge,
    /// Histogram type.
    Histogram,
    /// Counter type.
    Counter,
}

impl MetricKind {
    /// All metric kinds, in reporting order.
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Timer,
        MetricKind::Meter,
        MetricKind::Gauge,
        MetricKind::Histogram,
        MetricKind::Counter,
    ];

    /// Gets a lowercase name for the kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            MetricKind::Timer => "timer",
            MetricKind::Meter => "meter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Counter => "counter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value of a gauge.
///
/// Gauges may hold any value, but only numeric values can be reported.
#[derive(Clone, Debug, PartialEq)]
pub enum GaugeValue {
    /// An unsigned integer.
    Unsigned(u64),
    /// A signed integer.
    Signed(i64),
    /// A floating-point number.
    Float(f64),
    /// A boolean.
    Boolean(bool),
    /// Free-form text.
    Text(String),
}

impl GaugeValue {
    /// Gets the value as a floating-point number, or `None` if the value is not numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GaugeValue::Unsigned(v) => Some(*v as f64),
            GaugeValue::Signed(v) => Some(*v as f64),
            GaugeValue::Float(v) => Some(*v),
            GaugeValue::Boolean(_) | GaugeValue::Text(_) => None,
        }
    }
}

macro_rules! into_gauge_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for GaugeValue {
                fn from(value: $ty) -> Self {
                    GaugeValue::$variant(value.into())
                }
            }
        )*
    };
}

into_gauge_value!(
    u8 => Unsigned, u16 => Unsigned, u32 => Unsigned, u64 => Unsigned,
    i8 => Signed, i16 => Signed, i32 => Signed, i64 => Signed,
    f32 => Float, f64 => Float,
    bool => Boolean,
    String => Text, &str => Text,
);

impl From<usize> for GaugeValue {
    fn from(value: usize) -> Self {
        GaugeValue::Unsigned(value as u64)
    }
}

/// A point-in-time statistical summary of a distribution.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Snapshot {
    /// Smallest recorded value.
    pub min: f64,
    /// Largest recorded value.
    pub max: f64,
    /// Arithmetic mean of the recorded values.
    pub mean: f64,
}

/// A point-in-time reading of a single metric.
#[derive(Clone, Debug, PartialEq)]
pub enum Metric {
    /// The current count of a counter, which may be negative.
    Counter(i64),

    /// The current value of a gauge.
    Gauge(GaugeValue),

    /// The mean rate of a meter, in events per second.
    Meter {
        /// Total number of events marked.
        count: u64,
        /// Mean rate since the meter was created, in events per second.
        mean_rate: f64,
    },

    /// A histogram snapshot.
    Histogram(Snapshot),

    /// A timer snapshot, with all values in nanoseconds.
    Timer(Snapshot),
}

impl Metric {
    /// Gets the kind of the metric.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Meter { .. } => MetricKind::Meter,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Timer(_) => MetricKind::Timer,
        }
    }
}
