//! Filter compilation.
//!
//! Translates the declarative `{field, operator, value}` filter list of a
//! [`ReportConfig`] into repository-neutral [`Condition`]s, combined with
//! implicit AND semantics (no OR or filter grouping). Unknown operators,
//! unknown fields, kind-incompatible operators, and malformed values all
//! fail the whole configuration: silently dropping a filter would change
//! which rows are visible.

use chrono::NaiveDate;
use serde_json::Value;

use crate::error::CoreError;
use crate::fields::{self, FieldKind};
use crate::report::{FilterOperator, ReportConfig, ReportFilter};

/// A compiled comparison, ready for the storage layer to bind.
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledOp {
    /// Direct field match.
    Eq(Value),
    /// Negated match. NULL-valued rows satisfy this, so `equals` and
    /// `not_equals` partition the pre-filter set exhaustively.
    NotEq(Value),
    /// Case-insensitive substring match.
    Contains(String),
    /// Strict (non-inclusive) lower bound.
    Gt(Value),
    /// Strict (non-inclusive) upper bound.
    Lt(Value),
    /// Inclusive two-sided range.
    Between(Value, Value),
    /// Set membership.
    In(Vec<Value>),
    /// Set non-membership. NULL-valued rows satisfy this.
    NotIn(Vec<Value>),
}

/// One compiled filter condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub kind: FieldKind,
    pub op: CompiledOp,
}

/// Compile a configuration's filters into conditions.
pub fn compile_filters(config: &ReportConfig) -> Result<Vec<Condition>, CoreError> {
    config
        .filters
        .iter()
        .map(|f| compile_filter(config, f))
        .collect()
}

fn compile_filter(config: &ReportConfig, filter: &ReportFilter) -> Result<Condition, CoreError> {
    let descriptor = fields::lookup(config.data_source, &filter.field)?;

    if !descriptor.kind.supports(filter.operator) {
        return Err(CoreError::Validation(format!(
            "Operator {:?} is not applicable to field '{}' ({:?})",
            filter.operator, filter.field, descriptor.kind
        )));
    }

    let op = match filter.operator {
        FilterOperator::Equals => {
            check_scalar(descriptor.kind, &filter.field, &filter.value)?;
            CompiledOp::Eq(filter.value.clone())
        }
        FilterOperator::NotEquals => {
            check_scalar(descriptor.kind, &filter.field, &filter.value)?;
            CompiledOp::NotEq(filter.value.clone())
        }
        FilterOperator::Contains => match filter.value.as_str() {
            Some(s) => CompiledOp::Contains(s.to_string()),
            None => {
                return Err(value_error(&filter.field, "contains requires a string value"))
            }
        },
        FilterOperator::GreaterThan => {
            check_scalar(descriptor.kind, &filter.field, &filter.value)?;
            CompiledOp::Gt(filter.value.clone())
        }
        FilterOperator::LessThan => {
            check_scalar(descriptor.kind, &filter.field, &filter.value)?;
            CompiledOp::Lt(filter.value.clone())
        }
        FilterOperator::Between => {
            let items = filter.value.as_array().ok_or_else(|| {
                value_error(&filter.field, "between requires a two-element array")
            })?;
            if items.len() != 2 {
                return Err(value_error(
                    &filter.field,
                    "between requires exactly two bounds",
                ));
            }
            check_scalar(descriptor.kind, &filter.field, &items[0])?;
            check_scalar(descriptor.kind, &filter.field, &items[1])?;
            CompiledOp::Between(items[0].clone(), items[1].clone())
        }
        FilterOperator::In | FilterOperator::NotIn => {
            let items = filter.value.as_array().ok_or_else(|| {
                value_error(&filter.field, "in/not_in require an array value")
            })?;
            if items.is_empty() {
                return Err(value_error(
                    &filter.field,
                    "in/not_in require a non-empty array",
                ));
            }
            for item in items {
                check_scalar(descriptor.kind, &filter.field, item)?;
            }
            if filter.operator == FilterOperator::In {
                CompiledOp::In(items.clone())
            } else {
                CompiledOp::NotIn(items.clone())
            }
        }
    };

    Ok(Condition {
        field: descriptor.name.to_string(),
        kind: descriptor.kind,
        op,
    })
}

/// Check that a scalar filter value is representable in the field's kind.
fn check_scalar(kind: FieldKind, field: &str, value: &Value) -> Result<(), CoreError> {
    let ok = match kind {
        FieldKind::Text => value.is_string(),
        FieldKind::Numeric => value.is_number(),
        FieldKind::Boolean => value.is_boolean(),
        FieldKind::Date => value.as_str().is_some_and(|s| parse_date(s).is_some()),
        FieldKind::Timestamp => value
            .as_str()
            .is_some_and(|s| parse_timestamp(s).is_some()),
    };
    if ok {
        Ok(())
    } else {
        Err(value_error(
            field,
            &format!("value {value} is not valid for a {kind:?} field"),
        ))
    }
}

fn value_error(field: &str, reason: &str) -> CoreError {
    CoreError::Validation(format!("Invalid filter on '{field}': {reason}"))
}

/// Parse a date filter value: `YYYY-MM-DD`, or the date part of an RFC 3339
/// timestamp (UI date pickers send either).
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = s.parse::<NaiveDate>() {
        return Some(d);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

/// Parse a timestamp filter value: RFC 3339, or a bare date taken as
/// midnight UTC.
pub fn parse_timestamp(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&chrono::Utc));
    }
    s.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|ndt| chrono::DateTime::from_naive_utc_and_offset(ndt, chrono::Utc))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
