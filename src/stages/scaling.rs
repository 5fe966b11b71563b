//! Numeric scaling.

use super::{
    ColumnRequirement, NUMERIC, Stage, StageContext, StageOutcome, ensure_parameters, map_numeric,
    non_empty, numeric_column,
};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalisationMethod {
    /// `(x - min) / (max - min)`
    MinMax,
    /// `(x - mean) / std`, sample std
    ZScore,
    /// `(x - median) / IQR`
    Robust,
}

impl NormalisationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MinMax => "min_max",
            Self::ZScore => "z_score",
            Self::Robust => "robust",
        }
    }

    /// Centre and scale for the observed values. A zero or undefined scale
    /// maps every value to 0.
    fn parameters(&self, values: &[f64]) -> Option<(f64, Option<f64>)> {
        let (centre, scale) = match self {
            Self::MinMax => {
                let min = stats::min(values)?;
                (min, stats::max(values)? - min)
            }
            Self::ZScore => (stats::mean(values)?, stats::sample_std(values).unwrap_or(0.0)),
            Self::Robust => {
                let q1 = stats::quantile(values, 0.25)?;
                let q3 = stats::quantile(values, 0.75)?;
                (stats::median(values)?, q3 - q1)
            }
        };
        let scale = (scale.is_finite() && scale != 0.0).then_some(scale);
        Some((centre, scale))
    }
}

/// Rescales numeric columns in place; missing cells stay missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Normalise {
    pub method: NormalisationMethod,
    pub columns: Vec<String>,
}

impl Normalise {
    pub fn new(method: NormalisationMethod, columns: &[&str]) -> Self {
        Self {
            method,
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        }
    }
}

impl Stage for Normalise {
    fn name(&self) -> &'static str {
        "normalise"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, NUMERIC)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "normalise")
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut scaled = 0;
        let mut degenerate = Vec::new();
        for name in &self.columns {
            let observed = stats::observed(numeric_column(&dataset, name)?);
            let Some((centre, scale)) = self.method.parameters(&observed) else {
                continue;
            };
            scaled += observed.len();
            match scale {
                Some(scale) => {
                    map_numeric(&mut dataset, name, |v| (v - centre) / scale)?;
                }
                None => {
                    degenerate.push(name.as_str());
                    map_numeric(&mut dataset, name, |_| 0.0)?;
                }
            }
        }
        let mut detail = format!("{scaled} values scaled with {}", self.method.as_str());
        if !degenerate.is_empty() {
            tracing::warn!(columns = ?degenerate, "constant columns scaled to 0");
            detail.push_str(&format!("; constant: {}", degenerate.join(", ")));
        }
        Ok(StageOutcome::new(dataset).values(scaled).detail(detail))
    }

    fn description(&self) -> String {
        format!(
            "Normalise {} with {}",
            self.columns.join(", "),
            self.method.as_str()
        )
    }
}
