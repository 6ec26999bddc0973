//! Postgres-backed entity store.
//!
//! Translates compiled filter conditions into a single dynamically-built
//! query with numbered binds. Rows come back as `row_to_json` objects so
//! the aggregation engine stays schema-generic, and key order follows the
//! SELECT list.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use meridian_core::aggregate::Row;
use meridian_core::fields::FieldKind;
use meridian_core::filter::{self, CompiledOp, Condition};
use meridian_core::report::{DataSource, SortDirection};
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{EntityQuery, EntityStore, StoreError};

/// Entity store reading from the tenant-scoped entity tables.
#[derive(Clone)]
pub struct PgEntityStore {
    pool: PgPool,
}

impl PgEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntityStore for PgEntityStore {
    async fn find(&self, source: DataSource, query: EntityQuery) -> Result<Vec<Row>, StoreError> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT row_to_json(sub) FROM (SELECT ");
        qb.push(query.select_fields.join(", "));
        qb.push(" FROM ");
        qb.push(source.table());
        qb.push(" WHERE tenant_id = ");
        qb.push_bind(query.tenant_id);

        for condition in &query.conditions {
            qb.push(" AND ");
            push_condition(&mut qb, condition)?;
        }

        qb.push(" ORDER BY ");
        if query.sort.is_empty() {
            qb.push("created_at DESC");
        } else {
            for (i, sort) in query.sort.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(&sort.field);
                qb.push(match sort.direction {
                    SortDirection::Asc => " ASC",
                    SortDirection::Desc => " DESC",
                });
            }
        }

        qb.push(" LIMIT ");
        qb.push_bind(query.limit);
        qb.push(") AS sub");

        let values: Vec<Value> = qb
            .build_query_scalar()
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!(
            source = source.table(),
            rows = values.len(),
            "Entity retrieval complete"
        );

        Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect())
    }
}

/// Append one condition's SQL and binds.
///
/// Field names come from the static registry, so they are safe to splice
/// as identifiers; every value goes through a bind.
fn push_condition(
    qb: &mut QueryBuilder<Postgres>,
    condition: &Condition,
) -> Result<(), StoreError> {
    let field = condition.field.as_str();
    let kind = condition.kind;

    match &condition.op {
        CompiledOp::Eq(value) => {
            qb.push(field);
            qb.push(" = ");
            push_scalar(qb, kind, value)?;
        }
        // IS DISTINCT FROM keeps NULL-valued rows in the complement, so
        // equals/not_equals partition the pre-filter set.
        CompiledOp::NotEq(value) => {
            qb.push(field);
            qb.push(" IS DISTINCT FROM ");
            push_scalar(qb, kind, value)?;
        }
        CompiledOp::Contains(needle) => {
            qb.push(field);
            qb.push(" ILIKE ");
            qb.push_bind(format!("%{}%", escape_like(needle)));
        }
        CompiledOp::Gt(value) => {
            qb.push(field);
            qb.push(" > ");
            push_scalar(qb, kind, value)?;
        }
        CompiledOp::Lt(value) => {
            qb.push(field);
            qb.push(" < ");
            push_scalar(qb, kind, value)?;
        }
        CompiledOp::Between(low, high) => {
            qb.push(field);
            qb.push(" BETWEEN ");
            push_scalar(qb, kind, low)?;
            qb.push(" AND ");
            push_scalar(qb, kind, high)?;
        }
        CompiledOp::In(items) => {
            qb.push(field);
            qb.push(" = ANY(");
            push_array(qb, kind, items)?;
            qb.push(")");
        }
        CompiledOp::NotIn(items) => {
            qb.push("(");
            qb.push(field);
            qb.push(" <> ALL(");
            push_array(qb, kind, items)?;
            qb.push(") OR ");
            qb.push(field);
            qb.push(" IS NULL)");
        }
    }
    Ok(())
}

fn push_scalar(
    qb: &mut QueryBuilder<Postgres>,
    kind: FieldKind,
    value: &Value,
) -> Result<(), StoreError> {
    match kind {
        FieldKind::Text => {
            qb.push_bind(text_value(value)?);
        }
        FieldKind::Numeric => {
            qb.push_bind(numeric_value(value)?);
        }
        FieldKind::Boolean => {
            qb.push_bind(bool_value(value)?);
        }
        FieldKind::Date => {
            qb.push_bind(date_value(value)?);
        }
        FieldKind::Timestamp => {
            qb.push_bind(timestamp_value(value)?);
        }
    }
    Ok(())
}

fn push_array(
    qb: &mut QueryBuilder<Postgres>,
    kind: FieldKind,
    items: &[Value],
) -> Result<(), StoreError> {
    match kind {
        FieldKind::Text => {
            let values: Vec<String> =
                items.iter().map(text_value).collect::<Result<_, _>>()?;
            qb.push_bind(values);
        }
        FieldKind::Numeric => {
            let values: Vec<f64> =
                items.iter().map(numeric_value).collect::<Result<_, _>>()?;
            qb.push_bind(values);
        }
        FieldKind::Boolean => {
            let values: Vec<bool> =
                items.iter().map(bool_value).collect::<Result<_, _>>()?;
            qb.push_bind(values);
        }
        FieldKind::Date => {
            let values: Vec<NaiveDate> =
                items.iter().map(date_value).collect::<Result<_, _>>()?;
            qb.push_bind(values);
        }
        FieldKind::Timestamp => {
            let values: Vec<DateTime<Utc>> =
                items.iter().map(timestamp_value).collect::<Result<_, _>>()?;
            qb.push_bind(values);
        }
    }
    Ok(())
}

fn text_value(value: &Value) -> Result<String, StoreError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| rejected("text", value))
}

fn numeric_value(value: &Value) -> Result<f64, StoreError> {
    value.as_f64().ok_or_else(|| rejected("numeric", value))
}

fn bool_value(value: &Value) -> Result<bool, StoreError> {
    value.as_bool().ok_or_else(|| rejected("boolean", value))
}

fn date_value(value: &Value) -> Result<NaiveDate, StoreError> {
    value
        .as_str()
        .and_then(filter::parse_date)
        .ok_or_else(|| rejected("date", value))
}

fn timestamp_value(value: &Value) -> Result<DateTime<Utc>, StoreError> {
    value
        .as_str()
        .and_then(filter::parse_timestamp)
        .ok_or_else(|| rejected("timestamp", value))
}

fn rejected(kind: &str, value: &Value) -> StoreError {
    StoreError::Rejected(format!("{value} is not bindable as {kind}"))
}

/// Escape LIKE metacharacters so the needle matches literally.
fn escape_like(needle: &str) -> String {
    needle
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }

    #[test]
    fn scalar_conversions_reject_mismatched_values() {
        assert!(numeric_value(&Value::String("ten".into())).is_err());
        assert!(text_value(&Value::Bool(true)).is_err());
        assert!(date_value(&Value::String("yesterday".into())).is_err());
    }

    #[test]
    fn date_conversion_accepts_both_forms() {
        assert!(date_value(&Value::String("2026-08-07".into())).is_ok());
        assert!(date_value(&Value::String("2026-08-07T10:00:00Z".into())).is_ok());
    }
}
