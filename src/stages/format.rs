//! Type and format normalisation: column housekeeping, text cleanup, casts.

use super::{
    ANY_KIND, CATEGORICAL, ColumnRequirement, Stage, StageContext, StageOutcome,
    categorical_column, ensure_parameters, map_categorical, non_empty,
};
use crate::config::is_null_token;
use crate::dataset::{
    Column, ColumnData, ColumnKind, Dataset, Schema, TIMESTAMP_FORMAT, format_number,
};
use crate::error::{CleanError, Result};
use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

const NUMBER_PATTERN: &str = r"-?[0-9]+(\.[0-9]+)?";

/// Parses a number, rejecting `NaN` and infinities (`"inf"`, `"1e400"`).
fn parse_finite(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Kinds a column may have for a cast to the key kind to be defined.
const CASTABLE_TO_NUMERIC: &[ColumnKind] = &[ColumnKind::Numeric, ColumnKind::Categorical];
const CASTABLE_TO_TEMPORAL: &[ColumnKind] = &[ColumnKind::Categorical, ColumnKind::Temporal];

fn owned(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_owned()).collect()
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| CleanError::invalid(format!("Invalid regex pattern: {e}")))
}

/// Parses `text` with `format`; a format without a time part yields midnight.
fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

fn check_date_format(format: &str) -> Option<String> {
    if format.is_empty() {
        return Some("date format must not be empty".to_owned());
    }
    StrftimeItems::new(format)
        .any(|item| matches!(item, Item::Error))
        .then(|| format!("Invalid date format: '{format}'"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropColumns {
    pub columns: Vec<String>,
}

impl Stage for DropColumns {
    fn name(&self) -> &'static str {
        "drop_columns"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, ANY_KIND)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "drop_columns")
    }

    fn project(&self, schema: &mut Schema) {
        for name in &self.columns {
            schema.remove(name);
        }
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut cells = 0;
        for name in &self.columns {
            cells += dataset.drop_column(name)?.len();
        }
        Ok(StageOutcome::new(dataset)
            .values(cells)
            .detail(format!("dropped {}", self.columns.join(", "))))
    }

    fn description(&self) -> String {
        format!("Drop columns {}", self.columns.join(", "))
    }
}

/// Renames columns. All renames happen at once, so `a -> b, b -> a` swaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenameColumns {
    pub mapping: BTreeMap<String, String>,
}

impl RenameColumns {
    fn target<'n>(&'n self, name: &'n str) -> &'n str {
        self.mapping.get(name).map_or(name, String::as_str)
    }
}

impl Stage for RenameColumns {
    fn name(&self) -> &'static str {
        "rename_columns"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        self.mapping
            .keys()
            .map(|from| ColumnRequirement::new(from.clone(), ANY_KIND))
            .collect()
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.mapping.is_empty() {
            problems.push("rename_columns requires at least one mapping".to_owned());
        }
        let mut targets = HashSet::new();
        for (from, to) in &self.mapping {
            if to.is_empty() {
                problems.push(format!("New name for '{from}' must not be empty"));
            } else if !targets.insert(to.as_str()) {
                problems.push(format!("Several columns renamed to '{to}'"));
            }
        }
        problems
    }

    fn project(&self, schema: &mut Schema) {
        *schema = Schema::new(
            schema
                .iter()
                .map(|(name, kind)| (self.target(name).to_owned(), kind))
                .collect(),
        );
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        for from in self.mapping.keys() {
            dataset.column(from)?;
        }
        let columns = dataset
            .into_columns()
            .into_iter()
            .map(|column| Column {
                name: self.target(&column.name).to_owned(),
                data: column.data,
            })
            .collect();
        // Re-validating catches a target that collides with a kept name.
        let dataset = Dataset::new(columns)?;
        Ok(StageOutcome::new(dataset).detail(
            self.mapping
                .iter()
                .map(|(from, to)| format!("{from} -> {to}"))
                .collect::<Vec<_>>()
                .join(", "),
        ))
    }

    fn description(&self) -> String {
        format!("Rename {} columns", self.mapping.len())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimWhitespace {
    pub columns: Vec<String>,
}

impl TrimWhitespace {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: owned(columns),
        }
    }
}

impl Stage for TrimWhitespace {
    fn name(&self) -> &'static str {
        "trim_whitespace"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "trim_whitespace")
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let trimmed = map_categorical(&mut dataset, &self.columns, |s| {
            Some(Some(s.trim().to_owned()))
        })?;
        Ok(StageOutcome::new(dataset)
            .values(trimmed)
            .detail(format!("{trimmed} values trimmed")))
    }

    fn description(&self) -> String {
        format!("Trim whitespace in {}", self.columns.join(", "))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextCase {
    Lower,
    Upper,
    /// First letter of each whitespace-separated word upper, the rest lower
    Title,
}

impl TextCase {
    pub fn apply(&self, text: &str) -> String {
        match self {
            Self::Lower => text.to_lowercase(),
            Self::Upper => text.to_uppercase(),
            Self::Title => {
                let mut out = String::with_capacity(text.len());
                let mut word_start = true;
                for c in text.chars() {
                    if word_start {
                        out.extend(c.to_uppercase());
                    } else {
                        out.extend(c.to_lowercase());
                    }
                    word_start = c.is_whitespace();
                }
                out
            }
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Title => "title",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeCase {
    pub columns: Vec<String>,
    pub case: TextCase,
}

impl Stage for ChangeCase {
    fn name(&self) -> &'static str {
        "change_case"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "change_case")
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let changed = map_categorical(&mut dataset, &self.columns, |s| {
            Some(Some(self.case.apply(s)))
        })?;
        Ok(StageOutcome::new(dataset)
            .values(changed)
            .detail(format!("{changed} values changed to {} case", self.case.as_str())))
    }

    fn description(&self) -> String {
        format!(
            "Change {} to {} case",
            self.columns.join(", "),
            self.case.as_str()
        )
    }
}

/// Replaces every match of `pattern`; `replacement` may use `$1`-style groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegexReplace {
    pub columns: Vec<String>,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
}

impl Stage for RegexReplace {
    fn name(&self) -> &'static str {
        "regex_replace"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems = non_empty(&self.columns, "regex_replace");
        if let Err(e) = Regex::new(&self.pattern) {
            problems.push(format!("Invalid regex pattern: {e}"));
        }
        problems
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let re = compile(&self.pattern)?;
        let mut dataset = dataset;
        let replaced = map_categorical(&mut dataset, &self.columns, |s| {
            Some(Some(re.replace_all(s, self.replacement.as_str()).into_owned()))
        })?;
        Ok(StageOutcome::new(dataset)
            .values(replaced)
            .detail(format!("{replaced} values rewritten by /{}/", self.pattern)))
    }

    fn description(&self) -> String {
        format!(
            "Replace /{}/ with '{}' in {}",
            self.pattern,
            self.replacement,
            self.columns.join(", ")
        )
    }
}

/// Turns placeholder text such as `"N/A"` into missing cells.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardiseNulls {
    pub columns: Vec<String>,
    /// Overrides the configured null tokens
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<String>>,
}

impl StandardiseNulls {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: owned(columns),
            tokens: None,
        }
    }
}

impl Stage for StandardiseNulls {
    fn name(&self) -> &'static str {
        "standardise_nulls"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "standardise_nulls")
    }

    fn apply(&self, dataset: Dataset, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let tokens = self.tokens.as_deref().unwrap_or(&ctx.settings.null_tokens);
        let mut dataset = dataset;
        let nulled = map_categorical(&mut dataset, &self.columns, |s| {
            is_null_token(tokens, s).then_some(None)
        })?;
        Ok(StageOutcome::new(dataset)
            .values(nulled)
            .detail(format!("{nulled} null tokens replaced with missing")))
    }

    fn description(&self) -> String {
        format!("Standardise null tokens in {}", self.columns.join(", "))
    }
}

/// Converts columns between kinds.
///
/// Numeric and temporal do not convert into each other; such a cast fails
/// with `TypeMismatch`. Text that does not parse becomes missing and is counted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastTypes {
    pub columns: BTreeMap<String, ColumnKind>,
}

impl CastTypes {
    fn accepted(target: ColumnKind) -> &'static [ColumnKind] {
        match target {
            ColumnKind::Numeric => CASTABLE_TO_NUMERIC,
            ColumnKind::Temporal => CASTABLE_TO_TEMPORAL,
            ColumnKind::Categorical => ANY_KIND,
        }
    }

    fn cast(
        name: &str,
        data: &ColumnData,
        target: ColumnKind,
        date_formats: &[String],
    ) -> Result<Option<(ColumnData, usize)>> {
        let cast = match (data, target) {
            (data, target) if data.kind() == target => return Ok(None),
            (ColumnData::Categorical(values), ColumnKind::Numeric) => {
                let mut failed = 0;
                let parsed = values
                    .iter()
                    .map(|cell| {
                        let text = cell.as_deref()?;
                        let parsed = parse_finite(text.trim());
                        if parsed.is_none() {
                            failed += 1;
                        }
                        parsed
                    })
                    .collect();
                (ColumnData::Numeric(parsed), failed)
            }
            (ColumnData::Categorical(values), ColumnKind::Temporal) => {
                let mut failed = 0;
                let parsed = values
                    .iter()
                    .map(|cell| {
                        let text = cell.as_deref()?;
                        let parsed = date_formats.iter().find_map(|f| parse_datetime(text, f));
                        if parsed.is_none() {
                            failed += 1;
                        }
                        parsed
                    })
                    .collect();
                (ColumnData::Temporal(parsed), failed)
            }
            (ColumnData::Numeric(values), ColumnKind::Categorical) => (
                ColumnData::Categorical(values.iter().map(|v| v.map(format_number)).collect()),
                0,
            ),
            (ColumnData::Temporal(values), ColumnKind::Categorical) => (
                ColumnData::Categorical(
                    values
                        .iter()
                        .map(|v| v.map(|t| t.format(TIMESTAMP_FORMAT).to_string()))
                        .collect(),
                ),
                0,
            ),
            (data, target) => {
                return Err(CleanError::type_mismatch(
                    name,
                    Self::accepted(target),
                    data.kind(),
                ));
            }
        };
        Ok(Some(cast))
    }
}

impl Stage for CastTypes {
    fn name(&self) -> &'static str {
        "cast_types"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        self.columns
            .iter()
            .map(|(name, target)| ColumnRequirement::new(name.clone(), Self::accepted(*target)))
            .collect()
    }

    fn check_parameters(&self) -> Vec<String> {
        if self.columns.is_empty() {
            vec!["cast_types requires at least one column".to_owned()]
        } else {
            Vec::new()
        }
    }

    fn project(&self, schema: &mut Schema) {
        for (name, kind) in &self.columns {
            schema.set_kind(name, *kind);
        }
    }

    fn apply(&self, dataset: Dataset, ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut converted = 0;
        let mut failed = 0;
        let mut casts = Vec::new();
        for (name, target) in &self.columns {
            let column = dataset.column(name)?;
            let from = column.kind();
            let Some((data, failures)) =
                Self::cast(name, &column.data, *target, &ctx.settings.date_formats)?
            else {
                continue;
            };
            if failures > 0 {
                tracing::warn!(column = %name, failures, "values could not be cast to {target}");
            }
            converted += data.len() - data.null_count();
            failed += failures;
            casts.push(format!("{name}: {from} -> {target}"));
            dataset.replace_data(name, data)?;
        }
        let mut detail = casts.join(", ");
        if failed > 0 {
            detail = format!("{detail}; {failed} values could not be parsed");
        }
        Ok(StageOutcome::new(dataset)
            .values(converted)
            .statistic("unparseable values", failed as f64)
            .detail(detail))
    }

    fn description(&self) -> String {
        format!(
            "Cast {}",
            self.columns
                .iter()
                .map(|(name, kind)| format!("{name} to {kind}"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Parses categorical text into timestamps with an explicit `chrono` format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseDates {
    pub columns: BTreeMap<String, String>,
}

impl Stage for ParseDates {
    fn name(&self) -> &'static str {
        "parse_dates"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        self.columns
            .keys()
            .map(|name| ColumnRequirement::new(name.clone(), CATEGORICAL))
            .collect()
    }

    fn check_parameters(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .columns
            .values()
            .filter_map(|f| check_date_format(f))
            .collect();
        if self.columns.is_empty() {
            problems.push("parse_dates requires at least one column".to_owned());
        }
        problems
    }

    fn project(&self, schema: &mut Schema) {
        for name in self.columns.keys() {
            schema.set_kind(name, ColumnKind::Temporal);
        }
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let mut dataset = dataset;
        let mut parsed_total = 0;
        let mut failed = 0;
        for (name, format) in &self.columns {
            let values = categorical_column(&dataset, name)?;
            let parsed: Vec<Option<NaiveDateTime>> = values
                .iter()
                .map(|cell| {
                    let text = cell.as_deref()?;
                    let parsed = parse_datetime(text, format);
                    if parsed.is_none() {
                        failed += 1;
                    }
                    parsed
                })
                .collect();
            parsed_total += parsed.iter().flatten().count();
            dataset.replace_data(name, ColumnData::Temporal(parsed))?;
        }
        if failed > 0 {
            tracing::warn!(failed, "date values did not match their format");
        }
        Ok(StageOutcome::new(dataset)
            .values(parsed_total)
            .statistic("unparseable values", failed as f64)
            .detail(format!("{parsed_total} dates parsed, {failed} failed")))
    }

    fn description(&self) -> String {
        format!(
            "Parse dates in {}",
            self.columns
                .iter()
                .map(|(name, format)| format!("{name} ({format})"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Replaces text with the first number found in it, e.g. `"£1,200"` gives `1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractNumbers {
    pub columns: Vec<String>,
}

impl Stage for ExtractNumbers {
    fn name(&self) -> &'static str {
        "extract_numbers"
    }

    fn requirements(&self) -> Vec<ColumnRequirement> {
        ColumnRequirement::for_each(&self.columns, CATEGORICAL)
    }

    fn check_parameters(&self) -> Vec<String> {
        non_empty(&self.columns, "extract_numbers")
    }

    fn project(&self, schema: &mut Schema) {
        for name in &self.columns {
            schema.set_kind(name, ColumnKind::Numeric);
        }
    }

    fn apply(&self, dataset: Dataset, _ctx: &StageContext<'_>) -> Result<StageOutcome> {
        ensure_parameters(self)?;
        let re = compile(NUMBER_PATTERN)?;
        let mut dataset = dataset;
        let mut extracted = 0;
        let mut failed = 0;
        for name in &self.columns {
            let numbers: Vec<Option<f64>> = categorical_column(&dataset, name)?
                .iter()
                .map(|cell| {
                    let text = cell.as_deref()?;
                    let number = re.find(text).and_then(|m| parse_finite(m.as_str()));
                    if number.is_none() {
                        failed += 1;
                    }
                    number
                })
                .collect();
            extracted += numbers.iter().flatten().count();
            dataset.replace_data(name, ColumnData::Numeric(numbers))?;
        }
        Ok(StageOutcome::new(dataset)
            .values(extracted)
            .statistic("cells without a number", failed as f64)
            .detail(format!("{extracted} numbers extracted, {failed} cells without a number")))
    }

    fn description(&self) -> String {
        format!("Extract numbers from {}", self.columns.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::dataset::Value;

    fn run(stage: &dyn Stage, dataset: Dataset) -> Result<StageOutcome> {
        let settings = Settings::default();
        stage.apply(dataset, &StageContext::new(&settings))
    }

    fn text(name: &str, values: &[Option<&str>]) -> Dataset {
        Dataset::new(vec![Column::categorical(name, values)]).expect("dataset")
    }

    fn cells(out: &StageOutcome, name: &str) -> ColumnData {
        out.dataset.column(name).expect("column").data.clone()
    }

    fn strings(values: &[Option<&str>]) -> ColumnData {
        ColumnData::Categorical(values.iter().map(|v| v.map(str::to_owned)).collect())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .expect("date")
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_trim_and_case() {
        let ds = text("name", &[Some("  alice SMITH "), None, Some("bob")]);
        let out = run(&TrimWhitespace::new(&["name"]), ds).expect("trim");
        assert_eq!(out.values_affected, 1);
        let stage = ChangeCase {
            columns: vec!["name".to_owned()],
            case: TextCase::Title,
        };
        let out = run(&stage, out.dataset).expect("case");
        assert_eq!(
            cells(&out, "name"),
            strings(&[Some("Alice Smith"), None, Some("Bob")])
        );
    }

    #[test]
    fn test_regex_replace_and_bad_pattern() {
        let ds = text("phone", &[Some("(01) 234-567"), Some("999")]);
        let stage = RegexReplace {
            columns: vec!["phone".to_owned()],
            pattern: r"\D".to_owned(),
            replacement: String::new(),
        };
        let out = run(&stage, ds.clone()).expect("replace");
        assert_eq!(cells(&out, "phone"), strings(&[Some("01234567"), Some("999")]));
        assert_eq!(out.values_affected, 1);

        let bad = RegexReplace {
            pattern: "(".to_owned(),
            ..stage
        };
        assert!(!bad.check_parameters().is_empty());
        assert!(matches!(run(&bad, ds), Err(CleanError::InvalidParameter(_))));
    }

    #[test]
    fn test_standardise_nulls_default_and_custom_tokens() {
        let ds = text("v", &[Some(" N/A"), Some("none"), Some("?"), Some("x")]);
        let out = run(&StandardiseNulls::new(&["v"]), ds.clone()).expect("nulls");
        assert_eq!(cells(&out, "v"), strings(&[None, None, Some("?"), Some("x")]));
        assert_eq!(out.values_affected, 2);

        let custom = StandardiseNulls {
            columns: vec!["v".to_owned()],
            tokens: Some(vec!["?".to_owned()]),
        };
        let out = run(&custom, ds).expect("nulls");
        assert_eq!(out.dataset.null_count(), 1);
    }

    #[test]
    fn test_rename_swap_and_collision() {
        let ds = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(2.0)]),
            Column::numeric("c", vec![Some(3.0)]),
        ])
        .expect("dataset");
        let swap = RenameColumns {
            mapping: BTreeMap::from([
                ("a".to_owned(), "b".to_owned()),
                ("b".to_owned(), "a".to_owned()),
            ]),
        };
        let out = run(&swap, ds.clone()).expect("swap");
        assert_eq!(out.dataset.column_names(), vec!["b", "a", "c"]);

        let clash = RenameColumns {
            mapping: BTreeMap::from([("a".to_owned(), "c".to_owned())]),
        };
        assert!(matches!(run(&clash, ds), Err(CleanError::DuplicateColumn(name)) if name == "c"));
    }

    #[test]
    fn test_drop_columns() {
        let ds = Dataset::new(vec![
            Column::numeric("a", vec![Some(1.0)]),
            Column::numeric("b", vec![Some(2.0)]),
        ])
        .expect("dataset");
        let stage = DropColumns {
            columns: vec!["a".to_owned()],
        };
        let out = run(&stage, ds.clone()).expect("drop");
        assert_eq!(out.dataset.column_names(), vec!["b"]);

        let missing = DropColumns {
            columns: vec!["zzz".to_owned()],
        };
        assert!(matches!(run(&missing, ds), Err(CleanError::MissingColumn(_))));
    }

    #[test]
    fn test_cast_text_to_numeric_counts_failures() {
        let ds = text("n", &[Some("1.5"), Some(" 2 "), Some("abc"), None]);
        let stage = CastTypes {
            columns: BTreeMap::from([("n".to_owned(), ColumnKind::Numeric)]),
        };
        let out = run(&stage, ds).expect("cast");
        assert_eq!(
            cells(&out, "n"),
            ColumnData::Numeric(vec![Some(1.5), Some(2.0), None, None])
        );
        assert_eq!(out.values_affected, 2);
        assert_eq!(out.statistic.map(|s| s.value), Some(1.0));
    }

    #[test]
    fn test_cast_numeric_and_temporal_to_text() {
        let ds = Dataset::new(vec![
            Column::numeric("n", vec![Some(3.0), Some(2.5)]),
            Column::temporal("t", vec![Some(date(2024, 3, 1)), None]),
        ])
        .expect("dataset");
        let stage = CastTypes {
            columns: BTreeMap::from([
                ("n".to_owned(), ColumnKind::Categorical),
                ("t".to_owned(), ColumnKind::Categorical),
            ]),
        };
        let out = run(&stage, ds).expect("cast");
        assert_eq!(cells(&out, "n"), strings(&[Some("3"), Some("2.5")]));
        assert_eq!(cells(&out, "t"), strings(&[Some("2024-03-01T00:00:00"), None]));
    }

    #[test]
    fn test_cast_text_to_temporal_tries_formats() {
        let ds = text("d", &[Some("2024-03-01"), Some("02/01/2023"), Some("soon")]);
        let stage = CastTypes {
            columns: BTreeMap::from([("d".to_owned(), ColumnKind::Temporal)]),
        };
        let out = run(&stage, ds).expect("cast");
        assert_eq!(
            cells(&out, "d"),
            ColumnData::Temporal(vec![Some(date(2024, 3, 1)), Some(date(2023, 1, 2)), None])
        );
    }

    #[test]
    fn test_cast_numeric_to_temporal_is_type_mismatch() {
        let ds = Dataset::new(vec![Column::numeric("n", vec![Some(1.0)])]).expect("dataset");
        let stage = CastTypes {
            columns: BTreeMap::from([("n".to_owned(), ColumnKind::Temporal)]),
        };
        assert!(matches!(run(&stage, ds), Err(CleanError::TypeMismatch { .. })));
    }

    #[test]
    fn test_cast_same_kind_is_noop() {
        let ds = Dataset::new(vec![Column::numeric("n", vec![Some(1.0)])]).expect("dataset");
        let stage = CastTypes {
            columns: BTreeMap::from([("n".to_owned(), ColumnKind::Numeric)]),
        };
        let out = run(&stage, ds.clone()).expect("cast");
        assert_eq!(out.dataset, ds);
        assert_eq!(out.values_affected, 0);
    }

    #[test]
    fn test_parse_dates_explicit_format() {
        let ds = text("when", &[Some("01.03.2024 08:30"), Some("bad"), None]);
        let stage = ParseDates {
            columns: BTreeMap::from([("when".to_owned(), "%d.%m.%Y %H:%M".to_owned())]),
        };
        let out = run(&stage, ds).expect("parse");
        let expected = NaiveDate::from_ymd_opt(2024, 3, 1)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .expect("datetime");
        assert_eq!(
            out.dataset.column("when").expect("when").data.get(0),
            Some(Value::Temporal(expected))
        );
        assert_eq!(out.dataset.null_count(), 2);
        assert_eq!(out.statistic.map(|s| s.value), Some(1.0));
    }

    #[test]
    fn test_parse_dates_rejects_bad_format() {
        let stage = ParseDates {
            columns: BTreeMap::from([("when".to_owned(), "%Q".to_owned())]),
        };
        assert_eq!(stage.check_parameters().len(), 1);
    }

    #[test]
    fn test_extract_numbers() {
        let ds = text("price", &[Some("£1200.50 each"), Some("-3 units"), Some("n/a")]);
        let stage = ExtractNumbers {
            columns: vec!["price".to_owned()],
        };
        let out = run(&stage, ds).expect("extract");
        assert_eq!(
            cells(&out, "price"),
            ColumnData::Numeric(vec![Some(1200.5), Some(-3.0), None])
        );
        assert_eq!(out.values_affected, 2);
        assert_eq!(out.statistic.map(|s| s.value), Some(1.0));
    }

    #[test]
    fn test_extract_numbers_ascii_digits_only() {
        let digits = "9".repeat(400);
        let ds = text("qty", &[Some("\u{661}\u{662} boxes"), Some(digits.as_str()), Some("7")]);
        let stage = ExtractNumbers {
            columns: vec!["qty".to_owned()],
        };
        let out = run(&stage, ds).expect("extract");
        assert_eq!(cells(&out, "qty"), ColumnData::Numeric(vec![None, None, Some(7.0)]));
        assert_eq!(out.statistic.map(|s| s.value), Some(2.0));
    }

    #[test]
    fn test_cast_counts_non_finite_text_as_failures() {
        let ds = text("n", &[Some("1"), Some("nan"), Some("inf"), Some("1e400"), Some("-infinity")]);
        let stage = CastTypes {
            columns: BTreeMap::from([("n".to_owned(), ColumnKind::Numeric)]),
        };
        let out = run(&stage, ds).expect("cast");
        assert_eq!(
            cells(&out, "n"),
            ColumnData::Numeric(vec![Some(1.0), None, None, None, None])
        );
        assert_eq!(out.values_affected, 1);
        assert_eq!(out.statistic.map(|s| s.value), Some(4.0));
    }
}
