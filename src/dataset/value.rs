//! Column kinds and single-cell values.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text form of temporal cells, used for display and casts to categorical.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Kind of values a column holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
    Temporal,
}

impl ColumnKind {
    pub const ALL: [Self; 3] = [Self::Numeric, Self::Categorical, Self::Temporal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Temporal => "temporal",
        }
    }

    /// Renders an accepted-kinds list such as `numeric or categorical`.
    pub fn describe_set(kinds: &[Self]) -> String {
        kinds
            .iter()
            .map(Self::as_str)
            .collect::<Vec<_>>()
            .join(" or ")
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell, detached from its column.
///
/// Used for row keys (deduplication), integrity reports and the
/// constant-style parameters of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Missing,
    Numeric(f64),
    Temporal(NaiveDateTime),
    Categorical(String),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("<missing>"),
            Self::Numeric(v) => f.write_str(&format_number(*v)),
            Self::Categorical(s) => f.write_str(s),
            Self::Temporal(t) => write!(f, "{}", t.format(TIMESTAMP_FORMAT)),
        }
    }
}

/// Formats a number the way it is written back into categorical columns:
/// integral values lose the trailing `.0`.
pub fn format_number(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

/// Hashable identity of a cell, for row-key comparisons.
///
/// Numbers compare by bit pattern after folding `-0.0` into `0.0`, so equal
/// cells always produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellKey {
    Missing,
    Numeric(u64),
    Categorical(String),
    Temporal(NaiveDateTime),
}

impl CellKey {
    pub fn numeric(v: f64) -> Self {
        let v = if v == 0.0 { 0.0 } else { v };
        Self::Numeric(v.to_bits())
    }
}
