//! Grouping and aggregation engine.
//!
//! Works generically over rows of unknown shape (`serde_json` objects):
//! numeric coercion is attempted per value at aggregation time and
//! non-coercible values are dropped rather than failing the report, so the
//! engine needs no compile-time knowledge of any entity schema.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::report::{Aggregate, ReportConfig, ReportColumn};

/// A raw result row. Key order follows the selected column order.
pub type Row = Map<String, Value>;

/// The processed result of a report execution.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ReportOutput {
    /// Flat rows with a per-aggregate-column summary.
    Flat {
        data: Vec<Row>,
        summary: Map<String, Value>,
        total: usize,
        truncated: bool,
    },
    /// One entry per group, each carrying its aggregates, row count, and
    /// member rows.
    Grouped {
        data: Vec<Row>,
        total: usize,
        groups: usize,
        truncated: bool,
    },
}

impl ReportOutput {
    /// Flat or grouped data rows, for export serialization.
    pub fn rows(&self) -> &[Row] {
        match self {
            ReportOutput::Flat { data, .. } => data,
            ReportOutput::Grouped { data, .. } => data,
        }
    }

    /// Total number of raw rows retrieved (pre-grouping).
    pub fn total(&self) -> usize {
        match self {
            ReportOutput::Flat { total, .. } => *total,
            ReportOutput::Grouped { total, .. } => *total,
        }
    }
}

/// Transform raw rows into the report's output shape.
///
/// `truncated` is raised when the row count hit the configured limit: the
/// repository silently drops rows beyond it, and callers must be told.
pub fn process(rows: Vec<Row>, config: &ReportConfig) -> ReportOutput {
    let truncated = rows.len() as i64 >= config.row_limit();

    match &config.grouping {
        Some(grouping) if !grouping.is_empty() => {
            group_rows(rows, grouping, &config.columns, truncated)
        }
        _ => {
            let summary = summarize(&rows, &config.columns);
            let total = rows.len();
            ReportOutput::Flat {
                data: rows,
                summary,
                total,
                truncated,
            }
        }
    }
}

/// One summary value per column that declares an aggregate.
fn summarize(rows: &[Row], columns: &[ReportColumn]) -> Map<String, Value> {
    let mut summary = Map::new();
    for col in columns {
        if let Some(aggregate) = col.aggregate {
            summary.insert(
                col.field.clone(),
                number(calculate(rows, &col.field, aggregate)),
            );
        }
    }
    summary
}

/// Partition rows by the tuple of grouping-field values.
///
/// A missing or null grouping value keys the literal "null" group; it is
/// neither an error nor an exclusion. Partitions keep first-seen order.
fn group_rows(
    rows: Vec<Row>,
    grouping: &[String],
    columns: &[ReportColumn],
    truncated: bool,
) -> ReportOutput {
    let total = rows.len();
    let mut partitions: IndexMap<Vec<String>, Vec<Row>> = IndexMap::new();

    for row in rows {
        let key: Vec<String> = grouping.iter().map(|g| group_key_part(&row, g)).collect();
        partitions.entry(key).or_default().push(row);
    }

    let groups = partitions.len();
    let data = partitions
        .into_iter()
        .map(|(key, items)| {
            let mut entry = Map::new();
            for (field, part) in grouping.iter().zip(&key) {
                let value = if part == "null" {
                    Value::Null
                } else {
                    Value::String(part.clone())
                };
                entry.insert(field.clone(), value);
            }
            for col in columns {
                if let Some(aggregate) = col.aggregate {
                    entry.insert(
                        col.field.clone(),
                        number(calculate(&items, &col.field, aggregate)),
                    );
                }
            }
            entry.insert("count".to_string(), Value::from(items.len()));
            entry.insert(
                "items".to_string(),
                Value::Array(items.into_iter().map(Value::Object).collect()),
            );
            entry
        })
        .collect();

    ReportOutput::Grouped {
        data,
        total,
        groups,
        truncated,
    }
}

fn group_key_part(row: &Row, field: &str) -> String {
    match row.get(field) {
        None | Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Compute one aggregate over the numeric-coercible values of a column.
///
/// `count` counts coercible values, not rows; `avg`, `min`, and `max`
/// return 0 over an empty coercible set rather than NaN.
pub fn calculate(rows: &[Row], field: &str, aggregate: Aggregate) -> f64 {
    let values: Vec<f64> = rows
        .iter()
        .filter_map(|row| row.get(field))
        .filter_map(try_numeric)
        .collect();

    match aggregate {
        Aggregate::Sum => values.iter().sum(),
        Aggregate::Avg => {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        }
        Aggregate::Count => values.len() as f64,
        Aggregate::Min => values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        })
        .unwrap_or(0.0),
        Aggregate::Max => values.iter().copied().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        })
        .unwrap_or(0.0),
    }
}

/// Attempt numeric coercion of a single value.
///
/// JSON numbers and numeric strings (after trimming) coerce; null,
/// booleans, arrays, and objects do not.
pub fn try_numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn number(v: f64) -> Value {
    Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
