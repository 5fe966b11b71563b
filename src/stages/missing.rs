//! Missing-value handling: imputation, row removal, sparse column removal.

use super::{
    ANY_KIND, ColumnRequirement, NUMERIC, Stage, StageContext, StageOutcome, ensure_parameters,
    non_empty,
};
use crate::dataset::{ColumnData, Dataset, Value};
use crate::error::Result;
use crate::stats;
use serde::{Deserialize, Serialize};

/// How a missing cell is replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    Mean,
    Median,
    Mode,
    Zero,
    ForwardFill,
    BackwardFill,
}

impl ImputeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Mode => "mode",
            Self::Zero => "zero",
            Self::ForwardFill => "forward_fill",
            Self::BackwardFill => "backward_fill",
        }
    }

    pub fn numeric_only(&self) -> bool {
        matches!(self, Self::Mean | Self::Median | Self::Zero)
    }
}

/// Replaces missing cells in `columns` using `strategy`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Impute {
    pub strategy: ImputeStrategy,
    pub columns: Vec<String>,
}

impl Impute {
    pub fn new(strategy: ImputeStrategy, columns: &[&str]) -> Self {
        Self {
            strategy,
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl Stage for Impute {
    fn name(&self) -> &'static str {
        "impute"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        let kinds = if self.strategy.numeric_only() {
            NUMERIC
        } else {
            ANY_KIND
        };
        ColumnRequirement::for_each(&self.columns, kinds)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "impute")
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut filled = 0;
        let mut fills = Vec::new();
        let mut statistic = None;

        for requirement in self.requirements() {
            requirement.check(&dataset)?;
        }
        for name in &self.columns {
            let mut data = dataset.column(name)?.data.clone();
            let (count, fill) = impute_column(&mut data, self.strategy);
            if let Some(fill) = &fill {
                fills.push(format!("{name}={fill}"));
            }
            if let Some(Value::Numeric(value)) = fill {
                statistic.get_or_insert((name.clone(), value));
            }
            filled += count;
            dataset.replace_data(name, data)?;
            tracing::debug!(column = %name, strategy = self.strategy.as_str(), count, "imputed");
        }

        let mut outcome = StageOutcome::new(dataset)
            .values(filled)
            .detail(if fills.is_empty() {
                format!("{filled} values filled")
            } else {
                format!("{filled} values filled ({})", fills.join(", "))
            });
        if let Some((column, value)) = statistic {
            outcome = outcome.statistic(format!("{} of {column}", self.strategy.as_str()), value);
        }
        Ok(outcome)
    }

    fn description(&self) -> String {
        format!(
            "Impute missing values in {} column(s) with {}",
            self.columns.len(),
            self.strategy.as_str()
        )
    }
}

/// Fills one column in place; returns the number of cells filled and the
/// fill value for the constant strategies.
fn impute_column(data: &mut ColumnData, strategy: ImputeStrategy) -> (usize, Option<Value>) {
    match strategy {
        ImputeStrategy::ForwardFill => (fill_forward(data), None),
        ImputeStrategy::BackwardFill => (fill_backward(data), None),
        _ => match data {
            ColumnData::Numeric(values) => {
                let observed = stats::observed(values);
                let fill = match strategy {
                    ImputeStrategy::Mean => stats::mean(&observed),
                    ImputeStrategy::Median => stats::median(&observed),
                    ImputeStrategy::Mode => stats::mode_f64(&observed),
                    _ => Some(0.0),
                };
                match fill {
                    Some(v) => (fill_with(values, &v), Some(Value::Numeric(v))),
                    None => (0, None),
                }
            }
            ColumnData::Categorical(values) => {
                match stats::mode(values.iter().flatten().cloned()) {
                    Some(v) => {
                        let count = fill_with(values, &v);
                        (count, Some(Value::Categorical(v)))
                    }
                    None => (0, None),
                }
            }
            ColumnData::Temporal(values) => match stats::mode(values.iter().flatten().copied()) {
                Some(v) => (fill_with(values, &v), Some(Value::Temporal(v))),
                None => (0, None),
            },
        },
    }
}

fn fill_with<T: Clone>(values: &mut [Option<T>], fill: &T) -> usize {
    let mut count = 0;
    for cell in values.iter_mut().filter(|c| c.is_none()) {
        *cell = Some(fill.clone());
        count += 1;
    }
    count
}

fn carry<'a, T: Clone + 'a>(cells: impl Iterator<Item = &'a mut Option<T>>) -> usize {
    let mut last: Option<T> = None;
    let mut count = 0;
    for cell in cells {
        match cell {
            Some(v) => last = Some(v.clone()),
            None => {
                if let Some(v) = &last {
                    *cell = Some(v.clone());
                    count += 1;
                }
            }
        }
    }
    count
}

fn fill_forward(data: &mut ColumnData) -> usize {
    match data {
        ColumnData::Numeric(v) => carry(v.iter_mut()),
        ColumnData::Categorical(v) => carry(v.iter_mut()),
        ColumnData::Temporal(v) => carry(v.iter_mut()),
    }
}

fn fill_backward(data: &mut ColumnData) -> usize {
    match data {
        ColumnData::Numeric(v) => carry(v.iter_mut().rev()),
        ColumnData::Categorical(v) => carry(v.iter_mut().rev()),
        ColumnData::Temporal(v) => carry(v.iter_mut().rev()),
    }
}

/// Removes rows with a missing cell in any of `columns` (all columns when empty).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropMissing {
    #[serde(default)]
    pub columns: Vec<String>,
}

impl Stage for DropMissing {
    fn name(&self) -> &'static str {
        "drop_missing"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, ANY_KIND)
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut dataset = dataset;
        let checked: Vec<&ColumnData> = if self.columns.is_empty() {
            dataset.columns().iter().map(|c| &c.data).collect()
        } else {
            self.columns
                .iter()
                .map(|name| dataset.column(name).map(|c| &c.data))
                .collect::<Result<_>>()?
        };
        let mask: Vec<bool> = (0..dataset.height())
            .map(|row| !checked.iter().any(|data| data.is_missing(row)))
            .collect();
        let removed = dataset.retain_rows(&mask);
        Ok(StageOutcome::new(dataset)
            .rows(removed)
            .detail(format!("{removed} rows with missing values removed")))
    }

    fn description(&self) -> String {
        if self.columns.is_empty() {
            "Drop rows with any missing value".to_owned()
        } else {
            format!("Drop rows missing any of: {}", self.columns.join(", "))
        }
    }
}

/// Removes columns whose share of missing cells exceeds `max_missing_ratio`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSparseColumns {
    pub max_missing_ratio: f64,
}

impl Stage for DropSparseColumns {
    fn name(&self) -> &'static str {
        "drop_sparse_columns"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        Vec::new()
    }

    fn check_parameters(&self) -> Vec<String> {
        if (0.0..=1.0).contains(&self.max_missing_ratio) {
            Vec::new()
        } else {
            vec![format!(
                "max_missing_ratio must be within 0..=1, got {}",
                self.max_missing_ratio
            )]
        }
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let height = dataset.height();
        if height == 0 {
            return Ok(StageOutcome::new(dataset).detail("empty dataset, nothing dropped"));
        }
        let sparse: Vec<String> = dataset
            .columns()
            .iter()
            .filter(|c| c.data.null_count() as f64 / height as f64 > self.max_missing_ratio)
            .map(|c| c.name.clone())
            .collect();
        for name in &sparse {
            dataset.drop_column(name)?;
            tracing::info!(column = %name, "dropped sparse column");
        }
        let detail = if sparse.is_empty() {
            "no sparse columns".to_owned()
        } else {
            format!("dropped {}", sparse.join(", "))
        };
        Ok(StageOutcome::new(dataset)
            .values(sparse.len() * height)
            .statistic("columns dropped", sparse.len() as f64)
            .detail(detail))
    }

    fn description(&self) -> String {
        format!(
            "Drop columns with more than {:.0}% missing values",
            self.max_missing_ratio * 100.0
        )
    }
}
