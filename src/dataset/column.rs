//! Typed column storage.

use super::value::{CellKey, ColumnKind, Value};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Values of a column, one vector per kind. `None` marks a missing cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "values", rename_all = "lowercase")]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
    Temporal(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Numeric(_) => ColumnKind::Numeric,
            Self::Categorical(_) => ColumnKind::Categorical,
            Self::Temporal(_) => ColumnKind::Temporal,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(v) => v.len(),
            Self::Categorical(v) => v.len(),
            Self::Temporal(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn null_count(&self) -> usize {
        match self {
            Self::Numeric(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Categorical(v) => v.iter().filter(|x| x.is_none()).count(),
            Self::Temporal(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            Self::Numeric(v) => v.get(row).is_some_and(Option::is_none),
            Self::Categorical(v) => v.get(row).is_some_and(Option::is_none),
            Self::Temporal(v) => v.get(row).is_some_and(Option::is_none),
        }
    }

    /// Cell at `row`, or `None` when out of bounds.
    pub fn get(&self, row: usize) -> Option<Value> {
        let value = match self {
            Self::Numeric(v) => v.get(row)?.map_or(Value::Missing, Value::Numeric),
            Self::Categorical(v) => v
                .get(row)?
                .as_ref()
                .map_or(Value::Missing, |s| Value::Categorical(s.clone())),
            Self::Temporal(v) => v.get(row)?.map_or(Value::Missing, Value::Temporal),
        };
        Some(value)
    }

    pub fn key(&self, row: usize) -> CellKey {
        match self {
            Self::Numeric(v) => match v.get(row).copied().flatten() {
                Some(x) => CellKey::numeric(x),
                None => CellKey::Missing,
            },
            Self::Categorical(v) => match v.get(row).and_then(Option::as_ref) {
                Some(s) => CellKey::Categorical(s.clone()),
                None => CellKey::Missing,
            },
            Self::Temporal(v) => match v.get(row).copied().flatten() {
                Some(t) => CellKey::Temporal(t),
                None => CellKey::Missing,
            },
        }
    }

    /// Keeps the rows whose mask entry is `true`.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, mask: &[bool]) {
            let mut idx = 0;
            values.retain(|_| {
                let keep = mask.get(idx).copied().unwrap_or(true);
                idx += 1;
                keep
            });
        }
        match self {
            Self::Numeric(v) => retain(v, mask),
            Self::Categorical(v) => retain(v, mask),
            Self::Temporal(v) => retain(v, mask),
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            Self::Numeric(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_categorical(&self) -> Option<&[Option<String>]> {
        match self {
            Self::Categorical(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_temporal(&self) -> Option<&[Option<NaiveDateTime>]> {
        match self {
            Self::Temporal(v) => Some(v),
            _ => None,
        }
    }

    /// Folds `NaN` and infinities into missing so that statistics never see them.
    pub(crate) fn normalise_missing(&mut self) {
        if let Self::Numeric(v) = self {
            for cell in v.iter_mut() {
                if cell.is_some_and(|x| !x.is_finite()) {
                    *cell = None;
                }
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        let mut data = data;
        data.normalise_missing();
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn numeric(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self::new(name, ColumnData::Numeric(values))
    }

    /// Convenience constructor for string literals in tests and examples.
    pub fn categorical<S: AsRef<str>>(name: impl Into<String>, values: &[Option<S>]) -> Self {
        let values = values
            .iter()
            .map(|v| v.as_ref().map(|s| s.as_ref().to_owned()))
            .collect();
        Self::new(name, ColumnData::Categorical(values))
    }

    pub fn temporal(name: impl Into<String>, values: Vec<Option<NaiveDateTime>>) -> Self {
        Self::new(name, ColumnData::Temporal(values))
    }

    pub fn kind(&self) -> ColumnKind {
        self.data.kind()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_finite_is_missing() {
        let col = Column::numeric(
            "x",
            vec![Some(1.0), Some(f64::NAN), None, Some(f64::INFINITY), Some(f64::NEG_INFINITY)],
        );
        assert_eq!(col.data.null_count(), 4);
        assert_eq!(col.data.as_numeric().and_then(|v| v.first().copied()), Some(Some(1.0)));
    }

    #[test]
    fn test_retain_rows() {
        let mut data = ColumnData::Categorical(vec![
            Some("a".to_owned()),
            None,
            Some("c".to_owned()),
        ]);
        data.retain_rows(&[true, false, true]);
        assert_eq!(
            data,
            ColumnData::Categorical(vec![Some("a".to_owned()), Some("c".to_owned())])
        );
    }

    #[test]
    fn test_serde_shape() {
        let col = Column::numeric("age", vec![Some(30.0), None]);
        let json = serde_json::to_string(&col).expect("serialize");
        assert_eq!(
            json,
            r#"{"name":"age","data":{"kind":"numeric","values":[30.0,null]}}"#
        );
    }
}
