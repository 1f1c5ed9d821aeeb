use aho_corasick::{AhoCorasick, AhoCorasickBuilder, AhoCorasickKind};

use crate::{builder::BuildError, kind::MetricKind};

/// Selects which registered metrics participate in a reporting cycle.
///
/// Filters see the formatted metric name, exactly as it will appear in the resulting datapoints, along with the kind of
/// the metric.
pub trait MetricFilter: Send + Sync {
    /// Returns `true` if the metric should be reported.
    fn matches(&self, name: &str, kind: MetricKind) -> bool;
}

impl<F> MetricFilter for F
where
    F: Fn(&str, MetricKind) -> bool + Send + Sync,
{
    fn matches(&self, name: &str, kind: MetricKind) -> bool {
        self(name, kind)
    }
}

/// A filter that accepts every metric.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllMetrics;

impl MetricFilter for AllMetrics {
    fn matches(&self, _: &str, _: MetricKind) -> bool {
        true
    }
}

/// Discards metrics whose names contain any of a set of patterns.
///
/// Uses an [Aho-Corasick][ahocorasick] automaton to match a metric name against multiple patterns at once. Patterns are
/// matched as substrings of the formatted name.
///
/// [ahocorasick]: https://en.wikipedia.org/wiki/Aho–Corasick_algorithm
pub struct PatternFilter {
    automaton: AhoCorasick,
}

impl PatternFilter {
    /// Creates a case-sensitive [`PatternFilter`] from a set of patterns.
    ///
    /// # Errors
    ///
    /// If the automaton cannot be built, typically because the patterns exceed its internal size limits, an error is
    /// returned.
    pub fn from_patterns<P, I>(patterns: P) -> Result<Self, BuildError>
    where
        P: IntoIterator<Item = I>,
        I: AsRef<str>,
    {
        Self::build(patterns, false)
    }

    /// Creates a case-insensitive [`PatternFilter`] from a set of patterns.
    ///
    /// Only ASCII characters are folded.
    ///
    /// # Errors
    ///
    /// If the automaton cannot be built, typically because the patterns exceed its internal size limits, an error is
    /// returned.
    pub fn from_patterns_case_insensitive<P, I>(patterns: P) -> Result<Self, BuildError>
    where
        P: IntoIterator<Item = I>,
        I: AsRef<str>,
    {
        Self::build(patterns, true)
    }

    fn build<P, I>(patterns: P, case_insensitive: bool) -> Result<Self, BuildError>
    where
        P: IntoIterator<Item = I>,
        I: AsRef<str>,
    {
        let patterns = patterns.into_iter().map(|p| p.as_ref().to_string()).collect::<Vec<_>>();
        let automaton = AhoCorasickBuilder::new()
            .ascii_case_insensitive(case_insensitive)
            .kind(Some(AhoCorasickKind::DFA))
            .build(&patterns)
            .map_err(|e| BuildError::InvalidFilter { reason: e.to_string() })?;

        Ok(PatternFilter { automaton })
    }
}

impl MetricFilter for PatternFilter {
    fn matches(&self, name: &str, _: MetricKind) -> bool {
        !self.automaton.is_match(name)
    }
}
