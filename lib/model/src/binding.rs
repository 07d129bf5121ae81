use serde::Serialize;
use std::fmt::{Display, Formatter};

/// The `OMP_PROC_BIND` policy under which a benchmark run was executed.
///
/// Logs that do not announce a binding policy are mapped to [BindingMode::DEFAULT_LABEL] when
/// the record is created. All grouping logic therefore works on a single canonical
/// representation and never has to distinguish between "missing", "empty" and "default".
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
#[serde(transparent)]
pub struct BindingMode(String);

impl BindingMode {
    /// The label used for runs without an explicit binding policy.
    pub const DEFAULT_LABEL: &'static str = "default";

    /// Creates a [BindingMode] from an optional header capture.
    ///
    /// Absent and blank captures are normalized to [Self::DEFAULT_LABEL].
    pub fn from_capture(capture: Option<&str>) -> Self {
        match capture.map(str::trim) {
            Some(label) if !label.is_empty() => Self(label.to_owned()),
            _ => Self::default(),
        }
    }

    /// Returns the label of this binding mode.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for BindingMode {
    fn default() -> Self {
        Self(Self::DEFAULT_LABEL.to_owned())
    }
}

impl Display for BindingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
