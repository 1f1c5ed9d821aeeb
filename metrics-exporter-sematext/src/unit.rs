use std::time::Duration;

use metrics::Unit;

/// A unit of time, used to scale meter rates and timer durations before they are reported.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TimeUnit {
    /// Nanoseconds.
    Nanoseconds,
    /// Microseconds.
    Microseconds,
    /// Milliseconds.
    Milliseconds,
    /// Seconds.
    Seconds,
    /// Minutes.
    Minutes,
    /// Hours.
    Hours,
    /// Days.
    Days,
}

impl TimeUnit {
    /// Gets the number of nanoseconds in one of this unit.
    pub const fn as_nanos(self) -> u64 {
        match self {
            TimeUnit::Nanoseconds => 1,
            TimeUnit::Microseconds => 1_000,
            TimeUnit::Milliseconds => 1_000_000,
            TimeUnit::Seconds => 1_000_000_000,
            TimeUnit::Minutes => 60 * 1_000_000_000,
            TimeUnit::Hours => 60 * 60 * 1_000_000_000,
            TimeUnit::Days => 24 * 60 * 60 * 1_000_000_000,
        }
    }

    /// Gets the length of one of this unit, in seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.as_nanos() as f64 / 1.0e9
    }

    /// Gets the length of one of this unit as a [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_nanos(self.as_nanos())
    }

    /// Converts a per-second rate into a rate per this unit.
    pub fn convert_rate(self, per_second: f64) -> f64 {
        per_second * self.as_secs_f64()
    }

    /// Converts a duration expressed in nanoseconds into this unit.
    pub fn convert_duration(self, nanos: f64) -> f64 {
        nanos / self.as_nanos() as f64
    }

    /// Gets the time unit matching a `metrics` unit, if the unit measures time.
    pub fn from_metrics_unit(unit: &Unit) -> Option<TimeUnit> {
        match unit {
            Unit::Nanoseconds => Some(TimeUnit::Nanoseconds),
            Unit::Microseconds => Some(TimeUnit::Microseconds),
            Unit::Milliseconds => Some(TimeUnit::Milliseconds),
            Unit::Seconds => Some(TimeUnit::Seconds),
            _ => None,
        }
    }
}
