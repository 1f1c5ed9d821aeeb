use std::fmt;

/// How the backend combines datapoints that share a name.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum AggregationType {
    /// Keep the smallest value.
    Min,
    /// Keep the largest value.
    Max,
    /// Average all values.
    Avg,
}

impl AggregationType {
    /// Returns the canonical lowercase label for this aggregation type.
    pub const fn label(self) -> &'static str {
        match self {
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Avg => "avg",
        }
    }

    /// Returns the filter tag used to distinguish the datapoints derived from a single distribution.
    ///
    /// The tag is of the form `agg.type=<label>`.
    pub fn filter_tag(self) -> String {
        format!("agg.type={}", self.label())
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single normalized record sent to Sematext.
#[derive(Clone, Debug, PartialEq)]
pub struct Datapoint {
    name: String,
    value: f64,
    aggregation: AggregationType,
    filter1: Option<String>,
}

impl Datapoint {
    /// Creates a datapoint without a filter tag.
    pub fn new<N>(name: N, value: f64, aggregation: AggregationType) -> Self
    where
        N: Into<String>,
    {
        Datapoint { name: name.into(), value, aggregation, filter1: None }
    }

    /// Creates a datapoint tagged with its aggregation type.
    ///
    /// Used for the min/max/avg triads derived from a distribution, so that the backend can tell the three series
    /// apart even though they share a name.
    pub fn tagged<N>(name: N, value: f64, aggregation: AggregationType) -> Self
    where
        N: Into<String>,
    {
        Datapoint {
            name: name.into(),
            value,
            aggregation,
            filter1: Some(aggregation.filter_tag()),
        }
    }

    /// Gets the metric name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Gets the aggregation type.
    pub fn aggregation(&self) -> AggregationType {
        self.aggregation
    }

    /// Gets the first filter tag, if any.
    pub fn filter1(&self) -> Option<&str> {
        self.filter1.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::{AggregationType, Datapoint};

    #[test]
    fn labels() {
        assert_eq!(AggregationType::Min.label(), "min");
        assert_eq!(AggregationType::Max.label(), "max");
        assert_eq!(AggregationType::Avg.label(), "avg");
        assert_eq!(AggregationType::Max.to_string(), "max");
    }

    #[test]
    fn tagged_datapoint_carries_filter() {
        let dp = Datapoint::tagged("db.query", 4.5, AggregationType::Min);
        assert_eq!(dp.filter1(), Some("agg.type=min"));
        assert_eq!(dp.aggregation(), AggregationType::Min);

        let dp = Datapoint::new("db.rows", 12.0, AggregationType::Avg);
        assert_eq!(dp.filter1(), None);
        assert_eq!(dp.name(), "db.rows");
        assert_eq!(dp.value(), 12.0);
    }
}
