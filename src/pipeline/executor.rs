//! Pipeline execution engine.
//!
//! Applies a spec's steps to a dataset in order, stopping at the first
//! failure, and collects a [`RunReport`].

use super::report::{ReportEntry, RunReport};
use super::spec::{PipelineSpec, SchemaConfig, SchemaMatchMode};
use crate::config::Settings;
use crate::dataset::Dataset;
use crate::error::{CleanError, Result};
use crate::stages::{Stage, StageContext, StageOutcome};
use chrono::Utc;
use std::time::Instant;

/// Execute a pipeline spec on a dataset.
///
/// The input is checked against the spec's schema rules first. Every step's
/// column contract is checked before the step runs; a failing step ends the
/// run with [`CleanError::StageFailed`] naming the 1-based step number.
pub fn run_pipeline(
    spec: &PipelineSpec,
    dataset: Dataset,
    settings: &Settings,
) -> Result<(Dataset, RunReport)> {
    let start = Instant::now();
    let started_at = Utc::now();
    let span = tracing::info_span!("pipeline", name = %spec.name, steps = spec.steps.len());
    let _guard = span.enter();

    spec.check_version()?;
    check_schema(&spec.schema, &dataset)?;

    let rows_before = dataset.height();
    let columns_before = dataset.width();
    tracing::info!(rows = rows_before, columns = columns_before, "starting pipeline");

    let ctx = StageContext::new(settings);
    let mut dataset = dataset;
    let mut entries = Vec::with_capacity(spec.steps.len());

    for (idx, step) in spec.steps.iter().enumerate() {
        let number = idx + 1;
        let stage = step.stage();
        let step_span = tracing::info_span!("step", number, op = stage.name());
        let _step_guard = step_span.enter();

        let outcome = apply_stage(stage, dataset, &ctx).map_err(|e| {
            tracing::error!("{e}");
            CleanError::stage_failed(number, stage.name(), e)
        })?;
        tracing::info!(
            rows_affected = outcome.rows_affected,
            values_affected = outcome.values_affected,
            "{}",
            outcome.detail
        );
        entries.push(ReportEntry::from_outcome(number, stage, &outcome));
        dataset = outcome.dataset;
    }

    let report = RunReport {
        pipeline: spec.name.clone(),
        started_at,
        rows_before,
        columns_before,
        rows_after: dataset.height(),
        columns_after: dataset.width(),
        steps_applied: entries.len(),
        duration: start.elapsed(),
        entries,
    };
    tracing::info!("{}", report.summary());
    Ok((dataset, report))
}

/// Checks `stage`'s column contract, then applies it.
pub fn apply_stage(
    stage: &dyn Stage,
    dataset: Dataset,
    ctx: &StageContext<'_>,
) -> Result<StageOutcome> {
    for requirement in stage.requirements() {
        requirement.check(&dataset)?;
    }
    tracing::debug!(stage = stage.name(), "{}", stage.description());
    stage.apply(dataset, ctx)
}

/// Validate schema matching requirements
fn check_schema(config: &SchemaConfig, dataset: &Dataset) -> Result<()> {
    for required in &config.required_columns {
        if !dataset.has_column(required) {
            return Err(CleanError::MissingColumn(required.clone()));
        }
    }
    if config.match_mode == SchemaMatchMode::Strict {
        let extra: Vec<&str> = dataset
            .column_names()
            .into_iter()
            .filter(|name| !config.required_columns.iter().any(|r| r == name))
            .collect();
        if !extra.is_empty() {
            return Err(CleanError::SchemaMismatch(format!(
                "Strict mode: unexpected columns found: {}",
                extra.join(", ")
            )));
        }
    }
    Ok(())
}
