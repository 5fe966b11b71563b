//! Cleaning stages.
//!
//! Every stage is a pure function from a [`Dataset`] plus its own parameters
//! to a new dataset and a report fragment ([`StageOutcome`]). Stages hold no
//! state between invocations.
//!
//! A stage declares an input contract through [`Stage::requirements`]: the
//! columns it reads and the kinds it accepts. The executor checks the contract
//! before calling [`Stage::apply`], so an absent column surfaces as
//! `MissingColumn` and a wrong-kind column as `TypeMismatch` before any data is
//! touched. Stages re-check at the point of use as well, because they can also
//! be called directly.
//!
//! | Family | Stages |
//! |---|---|
//! | Missing values | [`missing::Impute`], [`missing::DropMissing`], [`missing::DropSparseColumns`] |
//! | Duplicates | [`dedup::Deduplicate`] |
//! | Outliers | [`outliers::FilterOutliers`], [`outliers::ClipOutliers`] |
//! | Scaling | [`scaling::Normalise`] |
//! | Encoding | [`encoding::OneHotEncode`], [`encoding::LabelEncode`] |
//! | Type / format | [`format::DropColumns`], [`format::RenameColumns`], [`format::TrimWhitespace`], [`format::ChangeCase`], [`format::RegexReplace`], [`format::StandardiseNulls`], [`format::CastTypes`], [`format::ParseDates`], [`format::ExtractNumbers`] |
//! | Integrity | [`integrity::CheckIntegrity`] |

pub mod dedup;
pub mod encoding;
pub mod format;
pub mod integrity;
pub mod missing;
pub mod outliers;
pub mod scaling;

#[cfg(test)]
mod tests;

use crate::config::Settings;
use crate::dataset::{ColumnData, ColumnKind, Dataset, Schema};
use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};

pub const NUMERIC: &[ColumnKind] = &[ColumnKind::Numeric];
pub const CATEGORICAL: &[ColumnKind] = &[ColumnKind::Categorical];
pub const ANY_KIND: &[ColumnKind] = &ColumnKind::ALL;

/// Read-only environment handed to every stage.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub settings: &'a Settings,
}

impl<'a> StageContext<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }
}

/// A column a stage reads, with the kinds it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRequirement {
    pub column: String,
    pub kinds: &'static [ColumnKind],
}

impl ColumnRequirement {
    pub fn new(column: impl Into<String>, kinds: &'static [ColumnKind]) -> Self {
        Self {
            column: column.into(),
            kinds,
        }
    }

    pub fn for_each(columns: &[String], kinds: &'static [ColumnKind]) -> Vec<Self> {
        columns.iter().map(|c| Self::new(c.clone(), kinds)).collect()
    }

    /// Checks the requirement against a live dataset.
    pub fn check(&self, dataset: &Dataset) -> Result<()> {
        dataset.require_kind(&self.column, self.kinds).map(|_| ())
    }

    /// Checks the requirement against a simulated schema.
    pub fn check_schema(&self, schema: &Schema) -> std::result::Result<(), String> {
        match schema.kind_of(&self.column) {
            None => Err(format!("Column '{}' not found", self.column)),
            Some(kind) if self.kinds.contains(&kind) => Ok(()),
            Some(kind) => Err(format!(
                "Column '{}' has kind {kind}, expected {}",
                self.column,
                ColumnKind::describe_set(self.kinds)
            )),
        }
    }
}

/// A summary statistic attached to a report entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    pub label: String,
    pub value: f64,
}

impl Statistic {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Result of applying one stage.
#[derive(Debug, Clone)]
pub struct StageOutcome {
    pub dataset: Dataset,
    pub rows_affected: usize,
    pub values_affected: usize,
    pub statistic: Option<Statistic>,
    pub detail: String,
}

impl StageOutcome {
    pub fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            rows_affected: 0,
            values_affected: 0,
            statistic: None,
            detail: String::new(),
        }
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows_affected = rows;
        self
    }

    pub fn values(mut self, values: usize) -> Self {
        self.values_affected = values;
        self
    }

    pub fn statistic(mut self, label: impl Into<String>, value: f64) -> Self {
        self.statistic = Some(Statistic::new(label, value));
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }
}

/// A single cleaning operation.
pub trait Stage {
    /// Stable snake_case name, matching the step's `op` tag.
    fn name(&self) -> &'static str;

    /// Columns this stage reads and the kinds it accepts.
    fn requirements(&self) -> Vec<ColumnRequirement>;

    /// Parameter problems that do not depend on data.
    fn check_parameters(&self) -> Vec<String> {
        Vec::new()
    }

    /// Applies the stage's schema effect, for pre-flight validation.
    fn project(&self, _schema: &mut Schema) {}

    /// Whether the stage adds columns whose names are only known from the
    /// data. Pre-flight validation stops reporting unknown columns after such
    /// a stage.
    fn adds_dynamic_columns(&self) -> bool {
        false
    }

    /// Runs the stage.
    fn apply(&self, dataset: Dataset, ctx: &StageContext<'_>) -> Result<StageOutcome>;

    /// One-line human-readable summary of the configured stage.
    fn description(&self) -> String;
}

/// Fails with the first parameter problem, if any.
pub(crate) fn ensure_parameters(stage: &dyn Stage) -> Result<()> {
    match stage.check_parameters().into_iter().next() {
        Some(problem) => Err(CleanError::InvalidParameter(problem)),
        None => Ok(()),
    }
}

pub(crate) fn numeric_column<'d>(dataset: &'d Dataset, name: &str) -> Result<&'d [Option<f64>]> {
    let column = dataset.require_kind(name, NUMERIC)?;
    column
        .data
        .as_numeric()
        .ok_or_else(|| CleanError::type_mismatch(name, NUMERIC, column.kind()))
}

pub(crate) fn categorical_column<'d>(
    dataset: &'d Dataset,
    name: &str,
) -> Result<&'d [Option<String>]> {
    let column = dataset.require_kind(name, CATEGORICAL)?;
    column
        .data
        .as_categorical()
        .ok_or_else(|| CleanError::type_mismatch(name, CATEGORICAL, column.kind()))
}

/// Rewrites every present cell of the listed categorical columns.
///
/// `f` returns `None` to leave a cell as is. Returns the number of cells changed.
pub(crate) fn map_categorical<F>(dataset: &mut Dataset, columns: &[String], f: F) -> Result<usize>
where
    F: Fn(&str) -> Option<Option<String>>,
{
    let mut changed = 0;
    for name in columns {
        let values = categorical_column(dataset, name)?;
        let mut updated = Vec::with_capacity(values.len());
        for cell in values {
            match cell.as_deref().and_then(&f) {
                Some(new) if new.as_ref() != cell.as_ref() => {
                    changed += 1;
                    updated.push(new);
                }
                _ => updated.push(cell.clone()),
            }
        }
        dataset.replace_data(name, ColumnData::Categorical(updated))?;
    }
    Ok(changed)
}

/// Rewrites every present cell of a numeric column. Returns the number of cells changed.
pub(crate) fn map_numeric<F>(dataset: &mut Dataset, name: &str, f: F) -> Result<usize>
where
    F: Fn(f64) -> f64,
{
    let values = numeric_column(dataset, name)?;
    let mut changed = 0;
    let updated: Vec<Option<f64>> = values
        .iter()
        .map(|cell| {
            cell.map(|v| {
                let new = f(v);
                if new.to_bits() != v.to_bits() {
                    changed += 1;
                }
                new
            })
        })
        .collect();
    dataset.replace_data(name, ColumnData::Numeric(updated))?;
    Ok(changed)
}

pub(crate) fn non_empty(columns: &[String], what: &str) -> Vec<String> {
    if columns.is_empty() {
        vec![format!("{what} requires at least one column")]
    } else {
        Vec::new()
    }
}
