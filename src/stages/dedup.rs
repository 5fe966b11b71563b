//! Duplicate row removal.

use super::{ANY_KIND, ColumnRequirement, Stage, StageContext, StageOutcome};
use crate::dataset::{CellKey, ColumnData, Dataset};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Which row of a duplicate group survives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeepPolicy {
    #[default]
    First,
    Last,
}

/// Removes rows whose key repeats. The key is the whole row, or the `subset`
/// columns when given. Missing cells compare equal to each other.
///
/// Applying the stage to its own output changes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduplicate {
    #[serde(default)]
    pub subset: Vec<String>,
    #[serde(default)]
    pub keep: KeepPolicy,
}

impl Stage for Deduplicate {
    fn name(&self) -> &'static str {
        "deduplicate"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.subset, ANY_KIND)
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        let mut dataset = dataset;
        let key_columns: Vec<&ColumnData> = if self.subset.is_empty() {
            dataset.columns().iter().map(|c| &c.data).collect()
        } else {
            self.subset
                .iter()
                .map(|name| dataset.column(name).map(|c| &c.data))
                .collect::<Result<_>>()?
        };

        let height = dataset.height();
        let mut seen: HashSet<Vec<CellKey>> = HashSet::with_capacity(height);
        let mut mask = vec![false; height];
        let rows: Box<dyn Iterator<Item = usize>> = match self.keep {
            KeepPolicy::First => Box::new(0..height),
            KeepPolicy::Last => Box::new((0..height).rev()),
        };
        for row in rows {
            let key: Vec<CellKey> = key_columns.iter().map(|data| data.key(row)).collect();
            if seen.insert(key)
                && let Some(slot) = mask.get_mut(row)
            {
                *slot = true;
            }
        }

        let removed = dataset.retain_rows(&mask);
        tracing::debug!(removed, "deduplicated");
        Ok(StageOutcome::new(dataset)
            .rows(removed)
            .statistic("distinct rows", seen.len() as f64)
            .detail(format!("{removed} duplicate rows removed")))
    }

    fn description(&self) -> String {
        let scope = if self.subset.is_empty() {
            "all columns".to_owned()
        } else {
            self.subset.join(", ")
        };
        format!("Remove duplicate rows on {scope}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dataset::{Column, Value};

    fn ds() -> Dataset {
        Dataset::new(vec![
            Column::numeric("id", vec![Some(1.0), Some(2.0), Some(1.0), None, None]),
            Column::categorical("tag", &[Some("a"), Some("b"), Some("c"), Some("x"), Some("x")]),
        ])
        .expect("dataset")
    }

    fn run(stage: &Deduplicate, dataset: Dataset) -> StageOutcome {
        let settings = Settings::default();
        stage
            .apply(dataset, &StageContext::new(&settings))
            .expect("dedup")
    }

    #[test]
    fn test_full_row_duplicates_with_missing_equal() {
        let out = run(&Deduplicate::default(), ds());
        assert_eq!(out.rows_affected, 1);
        assert_eq!(out.dataset.height(), 4);
    }

    #[test]
    fn test_subset_keep_first_and_last() {
        let first = Deduplicate {
            subset: vec!["id".to_owned()],
            keep: KeepPolicy::First,
        };
        let out = run(&first, ds());
        assert_eq!(out.dataset.height(), 3);
        assert_eq!(
            out.dataset.row(0),
            Some(vec![Value::Numeric(1.0), Value::Categorical("a".to_owned())])
        );

        let last = Deduplicate {
            subset: vec!["id".to_owned()],
            keep: KeepPolicy::Last,
        };
        let out = run(&last, ds());
        assert_eq!(out.dataset.height(), 3);
        assert_eq!(
            out.dataset.row(1),
            Some(vec![Value::Numeric(1.0), Value::Categorical("c".to_owned())])
        );
    }

    #[test]
    fn test_idempotent() {
        let stage = Deduplicate::default();
        let once = run(&stage, ds()).dataset;
        let twice = run(&stage, once.clone());
        assert_eq!(twice.rows_affected, 0);
        assert_eq!(twice.dataset, once);
    }
}
