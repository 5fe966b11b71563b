use super::*;
use crate::stats;
use proptest::prelude::*;

fn cells(max_len: usize) -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::weighted(0.85, -1_000.0..1_000.0f64), 0..max_len)
}

fn numeric(values: Vec<Option<f64>>) -> Dataset {
    Dataset::new(vec![Column::numeric("x", values)]).expect("dataset")
}

fn column(out: &StageOutcome) -> Vec<Option<f64>> {
    out.dataset
        .column("x")
        .expect("x")
        .data
        .as_numeric()
        .expect("numeric")
        .to_vec()
}

fn small_table() -> impl Strategy<Value = Dataset> {
    prop::collection::vec(
        (
            prop::option::of(0i8..4),
            prop::option::of(prop::sample::select(vec!["a", "b", "c"])),
        ),
        0..40,
    )
    .prop_map(|rows| {
        let (ids, tags): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
        Dataset::new(vec![
            Column::numeric("id", ids.into_iter().map(|v| v.map(f64::from)).collect()),
            Column::categorical("tag", &tags),
        ])
        .expect("dataset")
    })
}

proptest! {
    /// Deduplicating an already deduplicated table changes nothing.
    #[test]
    fn dedup_is_idempotent(ds in small_table(), keep_last in any::<bool>()) {
        let stage = Deduplicate {
            subset: Vec::new(),
            keep: if keep_last { KeepPolicy::Last } else { KeepPolicy::First },
        };
        let once = apply(&stage, ds).expect("dedup");
        let twice = apply(&stage, once.dataset.clone()).expect("dedup");
        prop_assert_eq!(twice.rows_affected, 0);
        prop_assert_eq!(twice.dataset, once.dataset);
    }

    /// After IQR removal every remaining value lies inside the fences of the input.
    #[test]
    fn iqr_removal_stays_within_fences(values in cells(60)) {
        let fences = stats::iqr_fences(&values, 1.5);
        let out = apply(
            &FilterOutliers::new(&["x"], OutlierAction::Remove),
            numeric(values.clone()),
        )
        .expect("filter");
        let kept = column(&out);
        prop_assert_eq!(kept.len() + out.rows_affected, values.len());
        if let Some(f) = fences {
            prop_assert!(kept.iter().flatten().all(|v| f.contains(*v)));
        }
        // Missing cells are never outliers.
        prop_assert_eq!(
            kept.iter().filter(|v| v.is_none()).count(),
            values.iter().filter(|v| v.is_none()).count()
        );
    }

    /// Min-max scaling maps the minimum to 0 and the maximum to 1.
    #[test]
    fn min_max_hits_both_ends(values in cells(40)) {
        let observed = stats::observed(&values);
        let out = apply(
            &Normalise::new(NormalisationMethod::MinMax, &["x"]),
            numeric(values.clone()),
        )
        .expect("normalise");
        let scaled = stats::observed(&column(&out));
        prop_assert_eq!(scaled.len(), observed.len());
        let constant = stats::min(&observed) == stats::max(&observed);
        if let (Some(lo), Some(hi)) = (stats::min(&scaled), stats::max(&scaled)) {
            prop_assert!(lo.abs() < 1e-12);
            if constant {
                prop_assert!(hi.abs() < 1e-12);
            } else {
                prop_assert!((hi - 1.0).abs() < 1e-12);
            }
        }
    }

    /// Mean imputation fills every gap and keeps the mean.
    #[test]
    fn mean_imputation_preserves_mean(values in cells(50)) {
        let observed = stats::observed(&values);
        prop_assume!(!observed.is_empty());
        let before = stats::mean(&observed).expect("mean");
        let out = apply(&Impute::new(ImputeStrategy::Mean, &["x"]), numeric(values))
            .expect("impute");
        let filled = column(&out);
        prop_assert!(filled.iter().all(Option::is_some));
        let after = stats::mean(&stats::observed(&filled)).expect("mean");
        prop_assert!((after - before).abs() <= 1e-9 * before.abs().max(1.0));
    }

    /// Row-removing stages keep every column the same length.
    #[test]
    fn row_removal_keeps_columns_aligned(ds in small_table()) {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(DropMissing::default()),
            Box::new(FilterOutliers::new(&["id"], OutlierAction::Remove)),
            Box::new(CheckIntegrity {
                rules: vec![IntegrityRule::new("tag", RuleCheck::NotNull)],
                on_violation: ViolationPolicy::DropRows,
            }),
        ];
        for stage in stages {
            let out = apply(stage.as_ref(), ds.clone()).expect("stage");
            let height = out.dataset.height();
            prop_assert!(out.dataset.columns().iter().all(|c| c.len() == height));
            prop_assert_eq!(height + out.rows_affected, ds.height());
        }
    }
}
