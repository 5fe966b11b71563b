//! Pipeline specification and execution.
//!
//! A pipeline is a versioned JSON "pipeline spec": a name, the schema rules
//! the input must meet and an ordered list of steps. It can be checked against
//! an input schema before any data is touched ([`validate_pipeline`]) and
//! executed against a dataset ([`run_pipeline`]).
//!
//! # Overview
//!
//! The steps are organized into families:
//! - **Missing values**: `impute`, `drop_missing`, `drop_sparse_columns`
//! - **Duplicates**: `deduplicate`
//! - **Outliers**: `filter_outliers`, `clip_outliers`
//! - **Scaling**: `normalise`
//! - **Encoding**: `one_hot_encode`, `label_encode`
//! - **Column management**: `drop_columns`, `rename_columns`
//! - **Text processing**: `trim_whitespace`, `change_case`, `regex_replace`, `standardise_nulls`
//! - **Type conversion**: `cast_types`, `parse_dates`, `extract_numbers`
//! - **Integrity**: `check_integrity`
//!
//! # Example: Programmatic Pipeline Creation
//!
//! ```
//! use scrubline::config::Settings;
//! use scrubline::dataset::{Column, Dataset};
//! use scrubline::pipeline::{PipelineSpec, Step, run_pipeline};
//! use scrubline::stages::dedup::Deduplicate;
//! use scrubline::stages::missing::{Impute, ImputeStrategy};
//!
//! let spec = PipelineSpec::new("Data Cleaning")
//!     .with_step(Step::Deduplicate(Deduplicate::default()))
//!     .with_step(Step::Impute(Impute::new(ImputeStrategy::Median, &["age"])));
//!
//! let input = Dataset::new(vec![
//!     Column::numeric("age", vec![Some(31.0), None, Some(31.0), Some(45.0)]),
//! ])?;
//! let (cleaned, report) = run_pipeline(&spec, input, &Settings::default())?;
//! assert_eq!(report.rows_after, 3);
//! assert_eq!(cleaned.null_count(), 0);
//! # Ok::<(), scrubline::error::CleanError>(())
//! ```

pub mod executor;
pub mod report;
pub mod spec;
pub mod validation;

pub use executor::{apply_stage, run_pipeline};
pub use report::{ReportEntry, RunReport};
pub use spec::{PipelineSpec, SPEC_VERSION, STEP_CATALOGUE, SchemaConfig, SchemaMatchMode, Step};
pub use validation::{ValidationError, ensure_valid, validate_pipeline};
