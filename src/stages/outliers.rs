//! Outlier treatment: IQR fences and quantile clipping.

use super::{
    ColumnRequirement, NUMERIC, Stage, StageContext, StageOutcome, ensure_parameters, map_numeric,
    non_empty, numeric_column,
};
use crate::dataset::Dataset;
use crate::error::{CleanError, Result};
use crate::stats::{self, Fences};
use serde::{Deserialize, Serialize};

/// Problem with a fence multiplier, if any. Zero is allowed: the fences sit on Q1 and Q3.
pub(crate) fn check_multiplier(k: f64) -> Option<String> {
    (!(k.is_finite() && k >= 0.0))
        .then(|| format!("multiplier must be a non-negative number, got {k}"))
}

/// What to do with a value outside the fences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierAction {
    /// Drop the whole row.
    #[default]
    Remove,
    /// Clamp the value to the nearest fence.
    Cap,
}

/// Treats values outside `[Q1 - k*IQR, Q3 + k*IQR]` as outliers.
///
/// Fences are computed per column on the data as it enters the stage, before
/// any row is removed. Missing cells are never outliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOutliers {
    pub columns: Vec<String>,
    /// `k`; falls back to the configured default (1.5) when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
    #[serde(default)]
    pub action: OutlierAction,
}

impl FilterOutliers {
    pub fn new(columns: &[&str], action: OutlierAction) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            multiplier: None,
            action,
        }
    }

    fn fences(&self, dataset: &Dataset, multiplier: f64) -> Result<Vec<(String, Fences)>> {
        let mut fences = Vec::with_capacity(self.columns.len());
        for name in &self.columns {
            if let Some(f) = stats::iqr_fences(numeric_column(dataset, name)?, multiplier) {
                fences.push((name.clone(), f));
            }
        }
        Ok(fences)
    }
}

impl Stage for FilterOutliers {
    fn name(&self) -> &'static str {
        "filter_outliers"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, NUMERIC)
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems = non_empty(&self.columns, "filter_outliers");
        problems.extend(self.multiplier.and_then(check_multiplier));
        problems
    }

    fn apply(&self, dataset: Dataset, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let multiplier = self.multiplier.unwrap_or(ctx.settings.iqr_multiplier);
        if let Some(problem) = check_multiplier(multiplier) {
            return Err(CleanError::invalid(problem));
        }
        let fences = self.fences(&dataset, multiplier)?;
        let detail = fences
            .iter()
            .map(|(name, f)| format!("{name} in [{:.4}, {:.4}]", f.lower, f.upper))
            .collect::<Vec<_>>()
            .join(", ");
        let first_iqr = fences.first().map(|(name, f)| (format!("IQR of {name}"), f.iqr()));

        let outcome = match self.action {
            OutlierAction::Remove => {
                let mut mask = vec![true; dataset.height()];
                for (name, f) in &fences {
                    let values = numeric_column(&dataset, name)?;
                    for (keep, cell) in mask.iter_mut().zip(values) {
                        if cell.is_some_and(|v| !f.contains(v)) {
                            *keep = false;
                        }
                    }
                }
                let removed = dataset.retain_rows(&mask);
                tracing::info!(removed, multiplier, "removed outlier rows");
                StageOutcome::new(dataset)
                    .rows(removed)
                    .detail(format!("{removed} rows removed; {detail}"))
            }
            OutlierAction::Cap => {
                let mut capped = 0;
                for (name, f) in &fences {
                    capped += map_numeric(&mut dataset, name, |v| f.clamp(v))?;
                }
                tracing::info!(capped, multiplier, "capped outlier values");
                StageOutcome::new(dataset)
                    .values(capped)
                    .detail(format!("{capped} values capped; {detail}"))
            }
        };
        Ok(match first_iqr {
            Some((label, iqr)) => outcome.statistic(label, iqr),
            None => outcome,
        })
    }

    fn description(&self) -> String {
        let k = self
            .multiplier
            .map_or_else(|| "default".to_owned(), |k| k.to_string());
        let verb = match self.action {
            OutlierAction::Remove => "Remove rows with",
            OutlierAction::Cap => "Cap",
        };
        format!(
            "{verb} IQR outliers (k = {k}) in {}",
            self.columns.join(", ")
        )
    }
}

/// Clamps values to the `[lower_quantile, upper_quantile]` range of each column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipOutliers {
    pub columns: Vec<String>,
    pub lower_quantile: f64,
    pub upper_quantile: f64,
}

impl Stage for ClipOutliers {
    fn name(&self) -> &'static str {
        "clip_outliers"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, NUMERIC)
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems = non_empty(&self.columns, "clip_outliers");
        if !(0.0..=1.0).contains(&self.lower_quantile) {
            problems.push(format!(
                "Invalid lower_quantile: {} (must be 0-1)",
                self.lower_quantile
            ));
        }
        if !(0.0..=1.0).contains(&self.upper_quantile) {
            problems.push(format!(
                "Invalid upper_quantile: {} (must be 0-1)",
                self.upper_quantile
            ));
        }
        if self.lower_quantile >= self.upper_quantile {
            problems.push("lower_quantile must be less than upper_quantile".to_owned());
        }
        problems
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut clipped = 0;
        for name in &self.columns {
            let sorted = stats::sorted_observed(numeric_column(&dataset, name)?);
            let (Some(lo), Some(hi)) = (
                stats::quantile_sorted(&sorted, self.lower_quantile),
                stats::quantile_sorted(&sorted, self.upper_quantile),
            ) else {
                continue;
            };
            if lo > hi {
                continue;
            }
            clipped += map_numeric(&mut dataset, name, |v| v.clamp(lo, hi))?;
        }
        Ok(StageOutcome::new(dataset)
            .values(clipped)
            .detail(format!(
                "{clipped} values clipped to the {}-{} quantile range",
                self.lower_quantile, self.upper_quantile
            )))
    }

    fn description(&self) -> String {
        format!(
            "Clip {} to quantiles [{}, {}]",
            self.columns.join(", "),
            self.lower_quantile,
            self.upper_quantile
        )
    }
}
