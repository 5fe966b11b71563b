//! Contract tests shared by every stage.

mod properties;

use super::dedup::{Deduplicate, KeepPolicy};
use super::encoding::{LabelEncode, OneHotEncode};
use super::format::{
    CastTypes, ChangeCase, DropColumns, ExtractNumbers, ParseDates, RegexReplace, RenameColumns,
    StandardiseNulls, TextCase, TrimWhitespace,
};
use super::integrity::{CheckIntegrity, IntegrityRule, RuleCheck, ViolationPolicy};
use super::missing::{DropMissing, DropSparseColumns, Impute, ImputeStrategy};
use super::outliers::{ClipOutliers, FilterOutliers, OutlierAction};
use super::scaling::{NormalisationMethod, Normalise};
use super::*;
use crate::dataset::Column;
use std::collections::BTreeMap;

fn sample() -> Dataset {
    Dataset::new(vec![
        Column::numeric("amount", vec![Some(3.0), None, Some(9.0), Some(3.0), Some(250.0)]),
        Column::categorical(
            "region",
            &[Some(" north"), Some("SOUTH"), None, Some(" north"), Some("n/a")],
        ),
        Column::categorical(
            "joined",
            &[
                Some("2024-01-05"),
                Some("2024-02-10"),
                Some("x"),
                Some("2024-01-05"),
                None,
            ],
        ),
    ])
    .expect("dataset")
}

/// One configured instance of every stage, each pointed at `column`.
fn every_stage(column: &str) -> Vec<Box<dyn Stage>> {
    let cols = vec![column.to_owned()];
    vec![
        Box::new(Impute::new(ImputeStrategy::Mean, &[column])),
        Box::new(DropMissing {
            columns: cols.clone(),
        }),
        Box::new(Deduplicate {
            subset: cols.clone(),
            ..Default::default()
        }),
        Box::new(FilterOutliers::new(&[column], OutlierAction::Remove)),
        Box::new(ClipOutliers {
            columns: cols.clone(),
            lower_quantile: 0.05,
            upper_quantile: 0.95,
        }),
        Box::new(Normalise::new(NormalisationMethod::ZScore, &[column])),
        Box::new(OneHotEncode::new(&[column], true)),
        Box::new(LabelEncode {
            columns: cols.clone(),
        }),
        Box::new(DropColumns {
            columns: cols.clone(),
        }),
        Box::new(RenameColumns {
            mapping: BTreeMap::from([(column.to_owned(), "renamed".to_owned())]),
        }),
        Box::new(TrimWhitespace::new(&[column])),
        Box::new(ChangeCase {
            columns: cols.clone(),
            case: TextCase::Upper,
        }),
        Box::new(RegexReplace {
            columns: cols.clone(),
            pattern: "a".to_owned(),
            replacement: "b".to_owned(),
        }),
        Box::new(StandardiseNulls::new(&[column])),
        Box::new(CastTypes {
            columns: BTreeMap::from([(column.to_owned(), ColumnKind::Temporal)]),
        }),
        Box::new(ParseDates {
            columns: BTreeMap::from([(column.to_owned(), "%Y-%m-%d".to_owned())]),
        }),
        Box::new(ExtractNumbers { columns: cols }),
        Box::new(CheckIntegrity {
            rules: vec![IntegrityRule::new(column, RuleCheck::NotNull)],
            on_violation: ViolationPolicy::Report,
        }),
    ]
}

fn apply(stage: &dyn Stage, dataset: Dataset) -> Result<StageOutcome> {
    let settings = Settings::default();
    stage.apply(dataset, &StageContext::new(&settings))
}

#[test]
fn test_absent_column_is_missing_column_for_every_stage() {
    for stage in every_stage("no_such_column") {
        let err = apply(stage.as_ref(), sample()).expect_err(stage.name());
        assert!(
            matches!(err, CleanError::MissingColumn(ref name) if name == "no_such_column"),
            "{}: {err}",
            stage.name()
        );
    }
}

#[test]
fn test_requirements_agree_with_apply_on_kind() {
    // A numeric column is the wrong kind for every text-only stage and
    // for the numeric -> temporal cast.
    for stage in every_stage("amount") {
        let accepted = stage
            .requirements()
            .iter()
            .all(|req| req.check(&sample()).is_ok());
        let result = apply(stage.as_ref(), sample());
        if accepted {
            assert!(result.is_ok(), "{}: {:?}", stage.name(), result.err());
        } else {
            assert!(
                matches!(result, Err(CleanError::TypeMismatch { .. })),
                "{} should reject a numeric column",
                stage.name()
            );
        }
    }
}

#[test]
fn test_every_stage_preserves_equal_lengths() {
    for column in ["amount", "region", "joined"] {
        for stage in every_stage(column) {
            let Ok(out) = apply(stage.as_ref(), sample()) else {
                continue;
            };
            let height = out.dataset.height();
            assert!(
                out.dataset.columns().iter().all(|c| c.len() == height),
                "{} on {column} broke column lengths",
                stage.name()
            );
        }
    }
}

#[test]
fn test_names_are_unique_and_snake_case() {
    let names: Vec<&str> = every_stage("x").iter().map(|s| s.name()).collect();
    let unique: std::collections::HashSet<&str> = names.iter().copied().collect();
    assert_eq!(unique.len(), names.len());
    assert!(
        names
            .iter()
            .all(|n| n.chars().all(|c| c.is_ascii_lowercase() || c == '_'))
    );
}

#[test]
fn test_text_cleanup_chain() {
    let ds = sample();
    let ds = apply(&TrimWhitespace::new(&["region"]), ds)
        .expect("trim")
        .dataset;
    let ds = apply(&StandardiseNulls::new(&["region"]), ds)
        .expect("nulls")
        .dataset;
    let out = apply(
        &ChangeCase {
            columns: vec!["region".to_owned()],
            case: TextCase::Lower,
        },
        ds,
    )
    .expect("case");
    assert_eq!(
        out.dataset.column("region").expect("region").data,
        ColumnData::Categorical(vec![
            Some("north".to_owned()),
            Some("south".to_owned()),
            None,
            Some("north".to_owned()),
            None,
        ])
    );
}

#[test]
fn test_drop_sparse_then_missing_rows() {
    let out = apply(
        &DropSparseColumns {
            max_missing_ratio: 0.3,
        },
        sample(),
    )
    .expect("sparse");
    // Each column has one missing cell in five.
    assert_eq!(out.dataset.width(), 3);

    let out = apply(&DropMissing::default(), out.dataset).expect("drop");
    assert_eq!(out.dataset.height(), 2);
    assert_eq!(out.rows_affected, 3);
}
