//! Categorical encoding.
//!
//! Categories are always taken in sorted order so the same input yields the
//! same columns and codes on every run.

use super::{
    CATEGORICAL, ColumnRequirement, Stage, StageContext, StageOutcome, categorical_column,
    ensure_parameters, non_empty,
};
use crate::dataset::{Column, ColumnData, ColumnKind, Dataset, Schema};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_true() -> bool {
    true
}

fn categories(values: &[Option<String>]) -> Vec<String> {
    values
        .iter()
        .flatten()
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Adds one 0/1 indicator column per category, named `{column}_{category}`.
///
/// A missing source cell yields 0 in every indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OneHotEncode {
    pub columns: Vec<String>,
    #[serde(default = "default_true")]
    pub drop_original: bool,
}

impl OneHotEncode {
    pub fn new(columns: &[&str], drop_original: bool) -> Self {
        Self {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
            drop_original,
        }
    }
}

impl Stage for OneHotEncode {
    fn name(&self) -> &'static str {
        "one_hot_encode"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "one_hot_encode")
    }

    fn project(&self, schema: &mut Schema) {
        // Indicator names depend on the data; only the removal is known.
        if self.drop_original {
            for name in &self.columns {
                schema.remove(name);
            }
        }
    }

    fn adds_dynamic_columns(&self) -> bool {
        true
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut added = 0;
        for name in &self.columns {
            let values = categorical_column(&dataset, name)?.to_vec();
            let cats = categories(&values);
            let mut at = dataset.index_after(name)?;
            for category in &cats {
                let indicator: Vec<Option<f64>> = values
                    .iter()
                    .map(|cell| Some(if cell.as_ref() == Some(category) { 1.0 } else { 0.0 }))
                    .collect();
                dataset.insert_column(at, Column::numeric(format!("{name}_{category}"), indicator))?;
                at += 1;
            }
            if self.drop_original {
                dataset.drop_column(name)?;
            }
            tracing::debug!(column = %name, categories = cats.len(), "one-hot encoded");
            added += cats.len();
        }
        Ok(StageOutcome::new(dataset)
            .values(added)
            .statistic("indicator columns", added as f64)
            .detail(format!("{added} indicator columns added")))
    }

    fn description(&self) -> String {
        format!("One-hot encode {}", self.columns.join(", "))
    }
}

/// Replaces categories with integer codes `0..n` in sorted category order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelEncode {
    pub columns: Vec<String>,
}

impl Stage for LabelEncode {
    fn name(&self) -> &'static str {
        "label_encode"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "label_encode")
    }

    fn project(&self, schema: &mut Schema) {
        for name in &self.columns {
            schema.set_kind(name, ColumnKind::Numeric);
        }
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut encoded = 0;
        let mut mappings = Vec::new();
        for name in &self.columns {
            let values = categorical_column(&dataset, name)?;
            let cats = categories(values);
            let codes: Vec<Option<f64>> = values
                .iter()
                .map(|cell| {
                    cell.as_ref()
                        .and_then(|v| cats.binary_search(v).ok())
                        .map(|code| code as f64)
                })
                .collect();
            encoded += codes.iter().flatten().count();
            mappings.push(format!(
                "{name}: {}",
                cats.iter()
                    .enumerate()
                    .map(|(code, cat)| format!("{cat}={code}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
            dataset.replace_data(name, ColumnData::Numeric(codes))?;
        }
        Ok(StageOutcome::new(dataset)
            .values(encoded)
            .detail(mappings.join("; ")))
    }

    fn description(&self) -> String {
        format!("Label encode {}", self.columns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::CleanError;

    fn ds() -> Dataset {
        Dataset::new(vec![
            Column::categorical("colour", &[Some("red"), Some("blue"), None, Some("red")]),
            Column::numeric("n", vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
        ])
        .expect("dataset")
    }

    fn run(stage: &dyn Stage, dataset: Dataset) -> Result<StageOutcome> {
        let settings = Settings::default();
        stage.apply(dataset, &StageContext::new(&settings))
    }

    #[test]
    fn test_one_hot_sorted_and_in_place() {
        let out = run(&OneHotEncode::new(&["colour"], true), ds()).expect("encode");
        assert_eq!(out.dataset.column_names(), vec!["colour_blue", "colour_red", "n"]);
        assert_eq!(
            out.dataset.column("colour_red").expect("red").data,
            ColumnData::Numeric(vec![Some(1.0), Some(0.0), Some(0.0), Some(1.0)])
        );
        assert_eq!(
            out.dataset.column("colour_blue").expect("blue").data,
            ColumnData::Numeric(vec![Some(0.0), Some(1.0), Some(0.0), Some(0.0)])
        );
    }

    #[test]
    fn test_one_hot_keep_original() {
        let out = run(&OneHotEncode::new(&["colour"], false), ds()).expect("encode");
        assert_eq!(
            out.dataset.column_names(),
            vec!["colour", "colour_blue", "colour_red", "n"]
        );
    }

    #[test]
    fn test_one_hot_name_collision() {
        let ds = Dataset::new(vec![
            Column::categorical("c", &[Some("x")]),
            Column::numeric("c_x", vec![Some(1.0)]),
        ])
        .expect("dataset");
        let err = run(&OneHotEncode::new(&["c"], true), ds).expect_err("should fail");
        assert!(matches!(err, CleanError::DuplicateColumn(name) if name == "c_x"));
    }

    #[test]
    fn test_one_hot_numeric_rejected() {
        let err = run(&OneHotEncode::new(&["n"], true), ds()).expect_err("should fail");
        assert!(matches!(err, CleanError::TypeMismatch { .. }));
    }

    #[test]
    fn test_label_encode() {
        let stage = LabelEncode {
            columns: vec!["colour".to_owned()],
        };
        let out = run(&stage, ds()).expect("encode");
        assert_eq!(
            out.dataset.column("colour").expect("colour").data,
            ColumnData::Numeric(vec![Some(1.0), Some(0.0), None, Some(1.0)])
        );
        assert_eq!(out.detail, "colour: blue=0, red=1");
    }
}
