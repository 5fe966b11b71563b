//! Pipeline specification validation.
//!
//! Validates pipeline specs against an input schema before execution. The
//! schema is carried through every step's projection, so renames, drops and
//! casts are followed, and every problem is reported at once.

use super::spec::{PipelineSpec, SPEC_VERSION, SchemaMatchMode};
use crate::dataset::Schema;
use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Validation error with helpful context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// 0-based index into `steps`; `None` for spec-level problems
    pub step_index: Option<usize>,
    pub message: String,
}

impl ValidationError {
    fn new(step_index: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            step_index,
            message: message.into(),
        }
    }

    fn step(step_index: usize, message: impl Into<String>) -> Self {
        Self::new(Some(step_index), message)
    }

    fn schema(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(idx) = self.step_index {
            write!(f, "Step {}: {}", idx + 1, self.message)
        } else {
            write!(f, "Schema: {}", self.message)
        }
    }
}

/// Validate a pipeline spec against an input schema
pub fn validate_pipeline(spec: &PipelineSpec, input_schema: &Schema) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if spec.version != SPEC_VERSION {
        errors.push(ValidationError::schema(format!(
            "Unsupported spec version '{}', expected '{SPEC_VERSION}'",
            spec.version
        )));
    }

    validate_schema_requirements(spec, input_schema, &mut errors);

    // Simulate step-by-step execution to track schema changes
    let mut schema = input_schema.clone();
    let mut open = false;
    for (idx, step) in spec.steps.iter().enumerate() {
        let stage = step.stage();
        for problem in stage.check_parameters() {
            errors.push(ValidationError::step(idx, problem));
        }
        for requirement in stage.requirements() {
            // After a data-dependent stage an unknown name may still exist at run time.
            if open && !schema.contains(&requirement.column) {
                continue;
            }
            if let Err(message) = requirement.check_schema(&schema) {
                errors.push(ValidationError::step(idx, message));
            }
        }
        stage.project(&mut schema);
        for name in duplicate_names(&schema) {
            errors.push(ValidationError::step(
                idx,
                format!("Column '{name}' would appear more than once"),
            ));
        }
        schema = without_duplicates(&schema);
        open |= stage.adds_dynamic_columns();
    }

    errors
}

/// Like [`validate_pipeline`], but folds any problems into one error.
pub fn ensure_valid(spec: &PipelineSpec, input_schema: &Schema) -> Result<()> {
    let errors = validate_pipeline(spec, input_schema);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(CleanError::Validation(errors))
    }
}

/// Validate schema matching requirements
fn validate_schema_requirements(
    spec: &PipelineSpec,
    input_schema: &Schema,
    errors: &mut Vec<ValidationError>,
) {
    for required in &spec.schema.required_columns {
        if !input_schema.contains(required) {
            errors.push(ValidationError::schema(format!(
                "Required column '{required}' not found in input"
            )));
        }
    }

    // Strict mode: no extra columns allowed
    if spec.schema.match_mode == SchemaMatchMode::Strict {
        let extra_cols: Vec<&str> = input_schema
            .names()
            .filter(|name| !spec.schema.required_columns.iter().any(|r| r == name))
            .collect();

        if !extra_cols.is_empty() {
            errors.push(ValidationError::schema(format!(
                "Strict mode: unexpected columns found: {}",
                extra_cols.join(", ")
            )));
        }
    }
}

fn duplicate_names(schema: &Schema) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dupes = Vec::new();
    for name in schema.names() {
        if !seen.insert(name) && !dupes.iter().any(|d| d == name) {
            dupes.push(name.to_owned());
        }
    }
    dupes
}

fn without_duplicates(schema: &Schema) -> Schema {
    let mut seen = HashSet::new();
    Schema::new(
        schema
            .iter()
            .filter(|(name, _)| seen.insert(*name))
            .map(|(name, kind)| (name.to_owned(), kind))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ColumnKind;
    use crate::pipeline::spec::{SchemaConfig, Step};
    use crate::stages::encoding::OneHotEncode;
    use crate::stages::format::{CastTypes, DropColumns, RegexReplace, RenameColumns, TrimWhitespace};
    use crate::stages::missing::{Impute, ImputeStrategy};
    use crate::stages::outliers::ClipOutliers;
    use std::collections::BTreeMap;

    fn create_test_schema() -> Schema {
        Schema::new(vec![
            ("id".to_owned(), ColumnKind::Numeric),
            ("name".to_owned(), ColumnKind::Categorical),
            ("age".to_owned(), ColumnKind::Numeric),
        ])
    }

    fn spec(steps: Vec<Step>) -> PipelineSpec {
        PipelineSpec {
            steps,
            ..PipelineSpec::new("test")
        }
    }

    fn drop_step(columns: &[&str]) -> Step {
        Step::DropColumns(DropColumns {
            columns: columns.iter().map(|c| (*c).to_owned()).collect(),
        })
    }

    #[test]
    fn test_validate_drop_columns() {
        let errors = validate_pipeline(&spec(vec![drop_step(&["id", "nonexistent"])]), &create_test_schema());
        assert_eq!(errors.len(), 1);
        assert!(errors.first().is_some_and(|e| e.message.contains("nonexistent")));
    }

    #[test]
    fn test_validate_rename_conflict() {
        let step = Step::RenameColumns(RenameColumns {
            mapping: BTreeMap::from([("id".to_owned(), "name".to_owned())]),
        });
        let errors = validate_pipeline(&spec(vec![step]), &create_test_schema());
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.first().map(ToString::to_string).as_deref(),
            Some("Step 1: Column 'name' would appear more than once")
        );
    }

    #[test]
    fn test_validate_schema_requirements() {
        let spec = PipelineSpec {
            schema: SchemaConfig {
                match_mode: SchemaMatchMode::Strict,
                required_columns: vec!["id".to_owned(), "missing".to_owned()],
            },
            ..PipelineSpec::new("test")
        };
        let errors = validate_pipeline(&spec, &create_test_schema());
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| e.message.contains("missing")));
        assert!(errors.iter().all(|e| e.step_index.is_none()));
    }

    #[test]
    fn test_validate_valid_pipeline() {
        let errors = validate_pipeline(
            &spec(vec![
                Step::TrimWhitespace(TrimWhitespace::new(&["name"])),
                Step::Impute(Impute::new(ImputeStrategy::Mean, &["age"])),
            ]),
            &create_test_schema(),
        );
        assert_eq!(errors, Vec::new());
    }

    #[test]
    fn test_follows_renames_drops_and_casts() {
        let steps = vec![
            Step::RenameColumns(RenameColumns {
                mapping: BTreeMap::from([("age".to_owned(), "years".to_owned())]),
            }),
            // Old name is gone.
            Step::Impute(Impute::new(ImputeStrategy::Mean, &["age"])),
            drop_step(&["id"]),
            // Dropped column.
            Step::Impute(Impute::new(ImputeStrategy::Zero, &["id"])),
            Step::CastTypes(CastTypes {
                columns: BTreeMap::from([("years".to_owned(), ColumnKind::Categorical)]),
            }),
            // Now the wrong kind.
            Step::Impute(Impute::new(ImputeStrategy::Median, &["years"])),
        ];
        let errors = validate_pipeline(&spec(steps), &create_test_schema());
        let steps: Vec<Option<usize>> = errors.iter().map(|e| e.step_index).collect();
        assert_eq!(steps, vec![Some(1), Some(3), Some(5)]);
        assert!(errors.last().is_some_and(|e| e.message.contains("has kind categorical")));
    }

    #[test]
    fn test_reports_parameter_problems() {
        let steps = vec![
            Step::ClipOutliers(ClipOutliers {
                columns: vec!["age".to_owned()],
                lower_quantile: 0.9,
                upper_quantile: 1.5,
            }),
            Step::RegexReplace(RegexReplace {
                columns: vec!["name".to_owned()],
                pattern: "[".to_owned(),
                replacement: String::new(),
            }),
        ];
        let errors = validate_pipeline(&spec(steps), &create_test_schema());
        assert!(errors.iter().any(|e| e.step_index == Some(0) && e.message.contains("upper_quantile")));
        assert!(errors.iter().any(|e| e.step_index == Some(1) && e.message.contains("regex")));
    }

    #[test]
    fn test_one_hot_columns_are_not_flagged() {
        let steps = vec![
            Step::OneHotEncode(OneHotEncode::new(&["name"], true)),
            drop_step(&["name_alice"]),
            // Still a known column, still checked.
            Step::TrimWhitespace(TrimWhitespace::new(&["age"])),
        ];
        let errors = validate_pipeline(&spec(steps), &create_test_schema());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().and_then(|e| e.step_index), Some(2));
    }

    #[test]
    fn test_ensure_valid_wraps_errors() {
        let result = ensure_valid(&spec(vec![drop_step(&["zzz"])]), &create_test_schema());
        let err = result.expect_err("invalid");
        assert_eq!(
            err.to_string(),
            "Pipeline validation failed:\nStep 1: Column 'zzz' not found"
        );
    }
}
