//! Pipeline specification data structures.
//!
//! Defines the JSON shape of pipeline specs: the schema rules the input must
//! meet and the ordered list of steps. Each step is tagged by `"op"` and
//! carries the parameters of one stage.

use crate::error::{CleanError, Result};
use crate::stages::Stage;
use crate::stages::dedup::Deduplicate;
use crate::stages::encoding::{LabelEncode, OneHotEncode};
use crate::stages::format::{
    CastTypes, ChangeCase, DropColumns, ExtractNumbers, ParseDates, RegexReplace, RenameColumns,
    StandardiseNulls, TrimWhitespace,
};
use crate::stages::integrity::CheckIntegrity;
use crate::stages::missing::{DropMissing, DropSparseColumns, Impute};
use crate::stages::outliers::{ClipOutliers, FilterOutliers};
use crate::stages::scaling::Normalise;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current pipeline spec version
pub const SPEC_VERSION: &str = "0.1";

/// Root pipeline specification structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Specification version for future migrations
    pub version: String,

    /// Human-readable pipeline name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Schema validation rules
    #[serde(default)]
    pub schema: SchemaConfig,

    /// Ordered sequence of transformation steps
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl PipelineSpec {
    /// Create a new pipeline spec with default settings
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            version: SPEC_VERSION.to_owned(),
            name: name.into(),
            description: None,
            schema: SchemaConfig::default(),
            steps: Vec::new(),
        }
    }

    /// Appends a step, builder style.
    #[must_use]
    pub fn with_step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Load a pipeline spec from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parse a pipeline spec from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Save pipeline spec to a JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }

    /// Serialize pipeline spec to JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn check_version(&self) -> Result<()> {
        if self.version == SPEC_VERSION {
            Ok(())
        } else {
            Err(CleanError::UnsupportedVersion {
                found: self.version.clone(),
                expected: SPEC_VERSION.to_owned(),
            })
        }
    }
}

/// Schema validation configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    /// Schema matching mode
    #[serde(default)]
    pub match_mode: SchemaMatchMode,

    /// Required column names
    #[serde(default)]
    pub required_columns: Vec<String>,
}

/// Schema matching mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchemaMatchMode {
    /// Required columns must exist, allow extra columns
    #[default]
    Tolerant,

    /// Exact match: required columns only, no extras
    Strict,
}

/// Transformation step (tagged enum)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Impute(Impute),
    DropMissing(DropMissing),
    DropSparseColumns(DropSparseColumns),
    Deduplicate(Deduplicate),
    FilterOutliers(FilterOutliers),
    ClipOutliers(ClipOutliers),
    Normalise(Normalise),
    OneHotEncode(OneHotEncode),
    LabelEncode(LabelEncode),
    DropColumns(DropColumns),
    RenameColumns(RenameColumns),
    TrimWhitespace(TrimWhitespace),
    ChangeCase(ChangeCase),
    RegexReplace(RegexReplace),
    StandardiseNulls(StandardiseNulls),
    CastTypes(CastTypes),
    ParseDates(ParseDates),
    ExtractNumbers(ExtractNumbers),
    CheckIntegrity(CheckIntegrity),
}

/// Every `op` tag with a one-line summary, in catalogue order.
pub const STEP_CATALOGUE: &[(&str, &str)] = &[
    ("impute", "Fill missing values (mean, median, mode, zero, forward_fill, backward_fill)"),
    ("drop_missing", "Drop rows with a missing value in the listed (or all) columns"),
    ("drop_sparse_columns", "Drop columns whose missing ratio exceeds a threshold"),
    ("deduplicate", "Drop repeated rows, keeping the first or last"),
    ("filter_outliers", "Remove or cap values outside the IQR fences"),
    ("clip_outliers", "Clamp values to a quantile range"),
    ("normalise", "Scale numeric columns (min_max, z_score, robust)"),
    ("one_hot_encode", "Add 0/1 indicator columns per category"),
    ("label_encode", "Replace categories with integer codes"),
    ("drop_columns", "Remove columns"),
    ("rename_columns", "Rename columns"),
    ("trim_whitespace", "Strip leading and trailing whitespace"),
    ("change_case", "Convert text to lower, upper or title case"),
    ("regex_replace", "Replace regex matches in text"),
    ("standardise_nulls", "Turn null placeholders such as \"N/A\" into missing"),
    ("cast_types", "Convert columns between numeric, categorical and temporal"),
    ("parse_dates", "Parse text into timestamps with an explicit format"),
    ("extract_numbers", "Replace text with the first number it contains"),
    ("check_integrity", "Check not_null, unique, range, pattern and reference rules"),
];

impl Step {
    /// The stage that carries out this step.
    pub fn stage(&self) -> &dyn Stage {
        match self {
            Self::Impute(s) => s,
            Self::DropMissing(s) => s,
            Self::DropSparseColumns(s) => s,
            Self::Deduplicate(s) => s,
            Self::FilterOutliers(s) => s,
            Self::ClipOutliers(s) => s,
            Self::Normalise(s) => s,
            Self::OneHotEncode(s) => s,
            Self::LabelEncode(s) => s,
            Self::DropColumns(s) => s,
            Self::RenameColumns(s) => s,
            Self::TrimWhitespace(s) => s,
            Self::ChangeCase(s) => s,
            Self::RegexReplace(s) => s,
            Self::StandardiseNulls(s) => s,
            Self::CastTypes(s) => s,
            Self::ParseDates(s) => s,
            Self::ExtractNumbers(s) => s,
            Self::CheckIntegrity(s) => s,
        }
    }

    pub fn op(&self) -> &'static str {
        self.stage().name()
    }
}
