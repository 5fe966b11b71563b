//! User-declared integrity rules.
//!
//! Rules check one column each. Missing cells only ever violate `not_null`:
//! the other rules look at observed values.

use super::{
    ANY_KIND, CATEGORICAL, ColumnRequirement, NUMERIC, Stage, StageContext, StageOutcome,
    ensure_parameters,
};
use crate::dataset::{CellKey, ColumnData, ColumnKind, Dataset};
use crate::error::{CleanError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

const REFERENCE_KINDS: &[ColumnKind] = &[ColumnKind::Numeric, ColumnKind::Categorical];

/// The check a rule performs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RuleCheck {
    NotNull,
    /// Later repeats of a value violate; the first occurrence does not.
    Unique,
    Range {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// The whole cell must match.
    MatchesPattern { pattern: String },
    /// Every value must be one of the reference keys. Numbers are compared
    /// by their text form.
    References { values: Vec<String> },
}

impl RuleCheck {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotNull => "not_null",
            Self::Unique => "unique",
            Self::Range { .. } => "range",
            Self::MatchesPattern { .. } => "matches_pattern",
            Self::References { .. } => "references",
        }
    }

    fn kinds(&self) -> &'static [ColumnKind] {
        match self {
            Self::NotNull | Self::Unique => ANY_KIND,
            Self::Range { .. } => NUMERIC,
            Self::MatchesPattern { .. } => CATEGORICAL,
            Self::References { .. } => REFERENCE_KINDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityRule {
    pub column: String,
    #[serde(flatten)]
    pub check: RuleCheck,
}

impl IntegrityRule {
    pub fn new(column: impl Into<String>, check: RuleCheck) -> Self {
        Self {
            column: column.into(),
            check,
        }
    }

    /// One flag per row, `true` where the row violates the rule.
    fn violations(&self, data: &ColumnData) -> Result<Vec<bool>> {
        let height = data.len();
        let flags = match &self.check {
            RuleCheck::NotNull => (0..height).map(|row| data.is_missing(row)).collect(),
            RuleCheck::Unique => {
                let mut seen = HashSet::with_capacity(height);
                (0..height)
                    .map(|row| match data.key(row) {
                        CellKey::Missing => false,
                        key => !seen.insert(key),
                    })
                    .collect()
            }
            RuleCheck::Range { min, max } => {
                let values = data.as_numeric().ok_or_else(|| {
                    CleanError::type_mismatch(&self.column, NUMERIC, data.kind())
                })?;
                values
                    .iter()
                    .map(|cell| {
                        cell.is_some_and(|v| {
                            min.is_some_and(|lo| v < lo) || max.is_some_and(|hi| v > hi)
                        })
                    })
                    .collect()
            }
            RuleCheck::MatchesPattern { pattern } => {
                let re = anchored(pattern)?;
                let values = data.as_categorical().ok_or_else(|| {
                    CleanError::type_mismatch(&self.column, CATEGORICAL, data.kind())
                })?;
                values
                    .iter()
                    .map(|cell| cell.as_deref().is_some_and(|s| !re.is_match(s)))
                    .collect()
            }
            RuleCheck::References { values } => {
                let keys: BTreeSet<&str> = values.iter().map(String::as_str).collect();
                (0..height)
                    .map(|row| match data.get(row) {
                        Some(value) if !value.is_missing() => {
                            !keys.contains(value.to_string().as_str())
                        }
                        _ => false,
                    })
                    .collect()
            }
        };
        Ok(flags)
    }

    fn describe(&self) -> String {
        match &self.check {
            RuleCheck::Range { min, max } => {
                let lo = min.map_or_else(|| "-inf".to_owned(), |v| v.to_string());
                let hi = max.map_or_else(|| "inf".to_owned(), |v| v.to_string());
                format!("{} in [{lo}, {hi}]", self.column)
            }
            RuleCheck::MatchesPattern { pattern } => format!("{} matches /{pattern}/", self.column),
            RuleCheck::References { values } => {
                format!("{} references {} keys", self.column, values.len())
            }
            check => format!("{} {}", self.column, check.as_str()),
        }
    }
}

fn anchored(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| CleanError::invalid(format!("Invalid regex pattern: {e}")))
}

/// What happens when a rule finds violating rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationPolicy {
    /// Record the counts and leave the data alone.
    #[default]
    Report,
    DropRows,
    /// Abort the run with `IntegrityViolation`.
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIntegrity {
    pub rules: Vec<IntegrityRule>,
    #[serde(default)]
    pub on_violation: ViolationPolicy,
}

impl Stage for CheckIntegrity {
    fn name(&self) -> &'static str {
        "check_integrity"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        self.rules
            .iter()
            .map(|rule| ColumnRequirement::new(rule.column.clone(), rule.check.kinds()))
            .collect()
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.rules.is_empty() {
            problems.push("check_integrity requires at least one rule".to_owned());
        }
        for rule in &self.rules {
            match &rule.check {
                RuleCheck::Range {
                    min: Some(lo),
                    max: Some(hi),
                } if lo > hi => {
                    problems.push(format!("Range on '{}' has min {lo} above max {hi}", rule.column));
                }
                RuleCheck::MatchesPattern { pattern } => {
                    if let Err(e) = Regex::new(pattern) {
                        problems.push(format!("Invalid regex pattern: {e}"));
                    }
                }
                _ => {}
            }
        }
        problems
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut violating = vec![false; dataset.height()];
        let mut total = 0;
        let mut lines = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            let column = dataset.require_kind(&rule.column, rule.check.kinds())?;
            let flags = rule.violations(&column.data)?;
            let count = flags.iter().filter(|f| **f).count();
            if count > 0 {
                tracing::warn!(rule = rule.check.as_str(), column = %rule.column, count, "integrity violations");
                if self.on_violation == ViolationPolicy::Fail {
                    return Err(CleanError::IntegrityViolation {
                        rule: rule.check.as_str().to_owned(),
                        column: rule.column.clone(),
                        count,
                    });
                }
            }
            for (v, f) in violating.iter_mut().zip(&flags) {
                *v |= *f;
            }
            total += count;
            lines.push(format!("{}: {count}", rule.describe()));
        }

        let outcome = if self.on_violation == ViolationPolicy::DropRows {
            let keep: Vec<bool> = violating.iter().map(|v| !v).collect();
            let removed = dataset.retain_rows(&keep);
            StageOutcome::new(dataset).rows(removed)
        } else {
            StageOutcome::new(dataset)
        };
        Ok(outcome
            .statistic("violations", total as f64)
            .detail(lines.join("; ")))
    }

    fn description(&self) -> String {
        format!(
            "Check {} integrity rules ({})",
            self.rules.len(),
            match self.on_violation {
                ViolationPolicy::Report => "report",
                ViolationPolicy::DropRows => "drop rows",
                ViolationPolicy::Fail => "fail",
            }
        )
    }
}
