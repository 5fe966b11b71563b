//! Centralized error handling for the scrubline library.
//!
//! Every fallible library operation returns [`Result<T>`], whose error side is
//! [`CleanError`]. The binary wraps these in `anyhow` at the edge.
//!
//! ## Stage failures
//!
//! The pipeline executor never continues past a failing step. The cause is
//! wrapped in [`CleanError::StageFailed`] so the message names the step:
//!
//! ```
//! use scrubline::error::CleanError;
//!
//! let cause = CleanError::MissingColumn("age".to_owned());
//! let err = CleanError::stage_failed(3, "impute", cause);
//! assert_eq!(
//!     err.to_string(),
//!     "Step 3 (impute) failed: Column 'age' not found"
//! );
//! assert!(matches!(err.root_cause(), CleanError::MissingColumn(_)));
//! ```

use crate::dataset::ColumnKind;
use crate::pipeline::ValidationError;

/// Main error type for scrubline operations.
#[derive(Debug, thiserror::Error)]
pub enum CleanError {
    /// A stage referenced a column the dataset does not have.
    #[error("Column '{0}' not found")]
    MissingColumn(String),

    /// A stage was invoked on a column of a kind it does not accept.
    #[error("Column '{column}' has kind {found}, expected {expected}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: ColumnKind,
    },

    /// Columns of a dataset disagree on their length.
    #[error("Column '{column}' has {found} values, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },

    /// Two columns would share a name.
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),

    /// A step parameter is outside its accepted range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The input does not satisfy the pipeline's schema rules.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// An integrity rule configured to fail found violating rows.
    #[error("Integrity rule {rule} failed on column '{column}': {count} violating rows")]
    IntegrityViolation {
        rule: String,
        column: String,
        count: usize,
    },

    /// A pipeline step failed; wraps the underlying cause.
    #[error("Step {step} ({stage}) failed: {source}")]
    StageFailed {
        step: usize,
        stage: String,
        #[source]
        source: Box<CleanError>,
    },

    /// Pipeline spec version is not supported.
    #[error("Unsupported spec version '{found}', expected '{expected}'")]
    UnsupportedVersion { found: String, expected: String },

    /// Pre-flight validation found problems.
    #[error("Pipeline validation failed:\n{}", format_validation(.0))]
    Validation(Vec<ValidationError>),

    /// I/O errors while reading or writing documents.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CleanError {
    pub fn type_mismatch(column: impl Into<String>, expected: &[ColumnKind], found: ColumnKind) -> Self {
        Self::TypeMismatch {
            column: column.into(),
            expected: ColumnKind::describe_set(expected),
            found,
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    pub fn stage_failed(step: usize, stage: impl Into<String>, source: Self) -> Self {
        Self::StageFailed {
            step,
            stage: stage.into(),
            source: Box::new(source),
        }
    }

    /// Unwraps any [`CleanError::StageFailed`] layers.
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::StageFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Result type alias for scrubline operations.
pub type Result<T> = std::result::Result<T, CleanError>;
