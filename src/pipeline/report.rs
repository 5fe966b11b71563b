//! Run reports.

use crate::error::Result;
use crate::stages::{Stage, StageOutcome, Statistic};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// What one step did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// 1-based step number
    pub step: usize,
    pub stage: String,
    pub description: String,
    pub rows_affected: usize,
    pub values_affected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistic: Option<Statistic>,
    #[serde(default)]
    pub detail: String,
}

impl ReportEntry {
    pub fn from_outcome(step: usize, stage: &dyn Stage, outcome: &StageOutcome) -> Self {
        Self {
            step,
            stage: stage.name().to_owned(),
            description: stage.description(),
            rows_affected: outcome.rows_affected,
            values_affected: outcome.values_affected,
            statistic: outcome.statistic.clone(),
            detail: outcome.detail.clone(),
        }
    }
}

impl fmt::Display for ReportEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>3}. {:<20} rows {:>6}  values {:>6}",
            self.step, self.stage, self.rows_affected, self.values_affected
        )?;
        if let Some(stat) = &self.statistic {
            write!(f, "  {} = {:.4}", stat.label, stat.value)?;
        }
        if !self.detail.is_empty() {
            write!(f, "  ({})", self.detail)?;
        }
        Ok(())
    }
}

/// Report generated after pipeline execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub pipeline: String,

    pub started_at: DateTime<Utc>,

    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of columns before processing
    pub columns_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Number of columns after processing
    pub columns_after: usize,

    /// Number of steps successfully applied
    pub steps_applied: usize,

    /// Time taken for execution
    pub duration: Duration,

    pub entries: Vec<ReportEntry>,
}

fn direction(before: usize, after: usize) -> &'static str {
    match after.cmp(&before) {
        std::cmp::Ordering::Greater => "added",
        std::cmp::Ordering::Less => "removed",
        std::cmp::Ordering::Equal => "unchanged",
    }
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Pipeline '{}' completed: {} rows ({} → {}), {} columns ({} → {}), {} steps, {:.2}s",
            self.pipeline,
            direction(self.rows_before, self.rows_after),
            self.rows_before,
            self.rows_after,
            direction(self.columns_before, self.columns_after),
            self.columns_before,
            self.columns_after,
            self.steps_applied,
            self.duration.as_secs_f64()
        )
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }

    pub fn to_file(&self, path: impl AsRef<Path>, pretty: bool) -> Result<()> {
        let json = self.to_json(pretty)?;
        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> RunReport {
        RunReport {
            pipeline: "demo".to_owned(),
            started_at: Utc::now(),
            rows_before: 10,
            columns_before: 3,
            rows_after: 8,
            columns_after: 3,
            steps_applied: 1,
            duration: Duration::from_millis(1500),
            entries: vec![ReportEntry {
                step: 1,
                stage: "deduplicate".to_owned(),
                description: "Remove duplicate rows on all columns".to_owned(),
                rows_affected: 2,
                values_affected: 0,
                statistic: Some(Statistic::new("distinct rows", 8.0)),
                detail: "2 duplicate rows removed".to_owned(),
            }],
        }
    }

    #[test]
    fn test_summary() {
        let report = report();
        assert_eq!(
            report.summary(),
            "Pipeline 'demo' completed: removed rows (10 → 8), unchanged columns (3 → 3), 1 steps, 1.50s"
        );
    }

    #[test]
    fn test_entry_display() {
        let line = report().entries.first().expect("entry").to_string();
        assert!(line.contains("deduplicate"));
        assert!(line.contains("distinct rows = 8.0000"));
        assert!(line.ends_with("(2 duplicate rows removed)"));
    }

    #[test]
    fn test_json_round_trip() {
        let report = report();
        let json = report.to_json(false).expect("serialize");
        let parsed: RunReport = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, report);
    }
}
