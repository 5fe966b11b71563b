//! In-memory tabular dataset.
//!
//! A [`Dataset`] is an ordered list of named, typed [`Column`]s. Two invariants
//! hold for every value of the type, from construction through every stage:
//!
//! - all columns have the same length
//! - column names are unique
//!
//! Stages take the dataset by value and hand back a new one, so a failing stage
//! never leaves a half-modified dataset behind in the caller.
//!
//! ```
//! use scrubline::dataset::{Column, Dataset};
//!
//! let ds = Dataset::new(vec![
//!     Column::numeric("age", vec![Some(31.0), None]),
//!     Column::categorical("city", &[Some("Leeds"), Some("York")]),
//! ])?;
//! assert_eq!(ds.height(), 2);
//! assert_eq!(ds.width(), 2);
//! # Ok::<(), scrubline::error::CleanError>(())
//! ```

pub mod column;
pub mod value;

pub use column::{Column, ColumnData};
pub use value::{CellKey, ColumnKind, TIMESTAMP_FORMAT, Value, format_number};

use crate::error::{CleanError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Ordered list of `(name, kind)` pairs describing a dataset's shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<(String, ColumnKind)>,
}

impl Schema {
    pub fn new(fields: Vec<(String, ColumnKind)>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|(n, _)| n == name)
    }

    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.fields.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn remove(&mut self, name: &str) {
        self.fields.retain(|(n, _)| n != name);
    }

    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == from) {
            to.clone_into(&mut field.0);
        }
    }

    pub fn set_kind(&mut self, name: &str, kind: ColumnKind) {
        if let Some(field) = self.fields.iter_mut().find(|(n, _)| n == name) {
            field.1 = kind;
        }
    }

    pub fn push(&mut self, name: impl Into<String>, kind: ColumnKind) {
        self.fields.push((name.into(), kind));
    }
}

/// An ordered sequence of equal-length named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Builds a dataset, checking the equal-length and unique-name invariants.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        let expected = columns.first().map_or(0, Column::len);
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(CleanError::DuplicateColumn(column.name.clone()));
            }
            if column.len() != expected {
                return Err(CleanError::LengthMismatch {
                    column: column.name.clone(),
                    expected,
                    found: column.len(),
                });
            }
        }
        let mut columns = columns;
        for column in &mut columns {
            column.data.normalise_missing();
        }
        Ok(Self { columns })
    }

    /// Parses a dataset document. Shape errors surface as JSON errors.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
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

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn schema(&self) -> Schema {
        Schema::new(
            self.columns
                .iter()
                .map(|c| (c.name.clone(), c.kind()))
                .collect(),
        )
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_owned()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_owned()))
    }

    /// Fails with `TypeMismatch` unless `name` is one of `kinds`.
    pub fn require_kind(&self, name: &str, kinds: &[ColumnKind]) -> Result<&Column> {
        let column = self.column(name)?;
        if kinds.contains(&column.kind()) {
            Ok(column)
        } else {
            Err(CleanError::type_mismatch(name, kinds, column.kind()))
        }
    }

    /// Swaps in new data for an existing column. The length must match.
    pub fn replace_data(&mut self, name: &str, data: ColumnData) -> Result<ColumnData> {
        let height = self.height();
        let column = self.column_mut(name)?;
        if data.len() != height {
            return Err(CleanError::LengthMismatch {
                column: name.to_owned(),
                expected: height,
                found: data.len(),
            });
        }
        let mut data = data;
        data.normalise_missing();
        Ok(std::mem::replace(&mut column.data, data))
    }

    /// Inserts `column` at `index` (clamped to the end).
    pub fn insert_column(&mut self, index: usize, column: Column) -> Result<()> {
        if self.has_column(&column.name) {
            return Err(CleanError::DuplicateColumn(column.name));
        }
        let found = column.len();
        if !self.columns.is_empty() && found != self.height() {
            return Err(CleanError::LengthMismatch {
                column: column.name,
                expected: self.height(),
                found,
            });
        }
        let index = index.min(self.columns.len());
        let mut column = column;
        column.data.normalise_missing();
        self.columns.insert(index, column);
        Ok(())
    }

    /// Index just after `name`, used to place derived columns next to their source.
    pub fn index_after(&self, name: &str) -> Result<usize> {
        self.position(name)
            .map(|i| i + 1)
            .ok_or_else(|| CleanError::MissingColumn(name.to_owned()))
    }

    pub fn drop_column(&mut self, name: &str) -> Result<Column> {
        let idx = self
            .position(name)
            .ok_or_else(|| CleanError::MissingColumn(name.to_owned()))?;
        Ok(self.columns.remove(idx))
    }

    pub fn rename_column(&mut self, from: &str, to: &str) -> Result<()> {
        if from == to {
            self.column(from)?;
            return Ok(());
        }
        if self.has_column(to) {
            return Err(CleanError::DuplicateColumn(to.to_owned()));
        }
        to.clone_into(&mut self.column_mut(from)?.name);
        Ok(())
    }

    /// Keeps only rows whose mask entry is `true`; returns how many were removed.
    pub fn retain_rows(&mut self, mask: &[bool]) -> usize {
        let before = self.height();
        for column in &mut self.columns {
            column.data.retain_rows(mask);
        }
        before - self.height()
    }

    /// Row as cells, in column order.
    pub fn row(&self, row: usize) -> Option<Vec<Value>> {
        self.columns.iter().map(|c| c.data.get(row)).collect()
    }

    /// Total missing cells across all columns.
    pub fn null_count(&self) -> usize {
        self.columns.iter().map(|c| c.data.null_count()).sum()
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            columns: Vec<Column>,
        }
        let raw = Raw::deserialize(deserializer)?;
        Self::new(raw.columns).map_err(serde::de::Error::custom)
    }
}
