use std::fmt;

use metrics::{Key, SharedString};

const GROUP_LABEL: &str = "group";
const TYPE_LABEL: &str = "type";
const SCOPE_LABEL: &str = "scope";

/// A structured metric name.
///
/// Metric names are made up of four optional segments (group, type, name, and scope), which are joined together
/// when a datapoint is built. Commonly, the group identifies the owning module or package, the type identifies the
/// owning component, and the scope distinguishes multiple instances of the same component.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct MetricName {
    group: Option<SharedString>,
    type_: Option<SharedString>,
    name: Option<SharedString>,
    scope: Option<SharedString>,
}

impl MetricName {
    /// Creates a `MetricName` with only the name segment set.
    pub fn new<N>(name: N) -> Self
    where
        N: Into<SharedString>,
    {
        MetricName { name: Some(name.into()), ..Default::default() }
    }

    /// Creates a `MetricName` owned by the given group and type.
    pub fn for_type<G, T, N>(group: G, type_: T, name: N) -> Self
    where
        G: Into<SharedString>,
        T: Into<SharedString>,
        N: Into<SharedString>,
    {
        MetricName::new(name).with_group(group).with_type(type_)
    }

    /// Sets the group segment.
    #[must_use]
    pub fn with_group<G>(mut self, group: G) -> Self
    where
        G: Into<SharedString>,
    {
        self.group = Some(group.into());
        self
    }

    /// Sets the type segment.
    #[must_use]
    pub fn with_type<T>(mut self, type_: T) -> Self
    where
        T: Into<SharedString>,
    {
        self.type_ = Some(type_.into());
        self
    }

    /// Sets the scope segment.
    #[must_use]
    pub fn with_scope<S>(mut self, scope: S) -> Self
    where
        S: Into<SharedString>,
    {
        self.scope = Some(scope.into());
        self
    }

    /// Gets the group segment, if any.
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// Gets the type segment, if any.
    pub fn type_(&self) -> Option<&str> {
        self.type_.as_deref()
    }

    /// Gets the name segment, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Gets the scope segment, if any.
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Formats the name as a dotted string.
    ///
    /// Segments are visited in the order group, type, name, scope. Missing or empty segments are skipped entirely, so
    /// the result never contains a leading, trailing, or doubled separator. If every segment is empty, the result is
    /// an empty string.
    ///
    /// Separators already present inside a segment are kept as-is, which means `group = "a.b"` and
    /// `group = "a", type = "b"` format identically.
    pub fn format(&self) -> String {
        let mut formatted = String::new();
        let segments = [self.group(), self.type_(), self.name(), self.scope()];
        for segment in segments.into_iter().flatten().filter(|s| !s.is_empty()) {
            if !formatted.is_empty() {
                formatted.push('.');
            }
            formatted.push_str(segment);
        }

        formatted
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format())
    }
}

impl From<&Key> for MetricName {
    fn from(key: &Key) -> Self {
        let mut name = MetricName::new(key.name().to_string());
        for label in key.labels() {
            match label.key() {
                GROUP_LABEL => name.group = Some(label.value().to_string().into()),
                TYPE_LABEL => name.type_ = Some(label.value().to_string().into()),
                SCOPE_LABEL => name.scope = Some(label.value().to_string().into()),
                _ => {}
            }
        }

        name
    }
}
