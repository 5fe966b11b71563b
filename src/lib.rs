//! # scrubline - deterministic cleaning pipelines for tabular data
//!
//! scrubline applies an ordered list of cleaning stages to an in-memory
//! dataset and reports what each stage did. Stages cover missing values,
//! duplicates, outliers, scaling, encoding, text and type normalisation and
//! integrity rules. Every stage is a pure transform: the same input and
//! parameters always give the same output.
//!
//! ## Quick Start
//!
//! ```
//! use scrubline::config::Settings;
//! use scrubline::dataset::{Column, Dataset};
//! use scrubline::pipeline::PipelineSpec;
//!
//! let spec = PipelineSpec::from_json(r#"{
//!     "version": "0.1",
//!     "name": "scores",
//!     "steps": [
//!         { "op": "impute", "strategy": "mean", "columns": ["score"] },
//!         { "op": "normalise", "method": "min_max", "columns": ["score"] }
//!     ]
//! }"#)?;
//!
//! let data = Dataset::new(vec![
//!     Column::numeric("score", vec![Some(10.0), None, Some(30.0)]),
//! ])?;
//!
//! let (cleaned, report) = scrubline::pipeline::run_pipeline(&spec, data, &Settings::default())?;
//! assert_eq!(cleaned.null_count(), 0);
//! println!("{}", report.summary());
//! # Ok::<(), scrubline::error::CleanError>(())
//! ```
//!
//! ## Core Modules
//!
//! - [`dataset`]: typed, column-oriented dataset model
//! - [`stages`]: the [`stages::Stage`] trait and every stage family
//! - [`pipeline`]: pipeline specs, pre-flight validation, execution and reports
//! - [`stats`]: mean, quantiles and other column statistics
//! - [`config`]: runtime settings
//! - [`error`]: the [`error::CleanError`] type
//! - [`logging`]: tracing setup for the binary

pub mod config;
pub mod dataset;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod stages;
pub mod stats;
