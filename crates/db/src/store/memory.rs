//! In-memory entity store.
//!
//! Mirrors the Postgres store's operator semantics over fixture rows so
//! the executor and scheduler can be exercised without a database. NULL
//! handling matches: `not_equals` and `not_in` keep null-valued rows.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use meridian_core::aggregate::{try_numeric, Row};
use meridian_core::fields::{self, FieldKind};
use meridian_core::filter::{self, CompiledOp, Condition};
use meridian_core::report::{DataSource, SortDirection, SortSpec};
use meridian_core::types::TenantId;
use serde_json::Value;

use super::{EntityQuery, EntityStore, StoreError};

/// Fixture-backed store for tests.
#[derive(Default)]
pub struct InMemoryEntityStore {
    rows: Mutex<HashMap<(DataSource, TenantId), Vec<Row>>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one fixture row. Panics when `row` is not a JSON object, which
    /// keeps test fixtures honest.
    pub fn insert(&self, source: DataSource, tenant_id: TenantId, row: Value) {
        let row = row
            .as_object()
            .expect("fixture rows must be JSON objects")
            .clone();
        self.rows
            .lock()
            .expect("fixture store lock poisoned")
            .entry((source, tenant_id))
            .or_default()
            .push(row);
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn find(&self, source: DataSource, query: EntityQuery) -> Result<Vec<Row>, StoreError> {
        let rows = {
            let guard = self.rows.lock().expect("fixture store lock poisoned");
            guard
                .get(&(source, query.tenant_id))
                .cloned()
                .unwrap_or_default()
        };

        let mut matched: Vec<Row> = rows
            .into_iter()
            .filter(|row| query.conditions.iter().all(|c| matches(row, c)))
            .collect();

        sort_rows(&mut matched, source, &query.sort);
        matched.truncate(query.limit.max(0) as usize);

        Ok(matched
            .into_iter()
            .map(|row| {
                let mut selected = Row::new();
                for field in &query.select_fields {
                    selected.insert(
                        field.clone(),
                        row.get(field).cloned().unwrap_or(Value::Null),
                    );
                }
                selected
            })
            .collect())
    }
}

fn matches(row: &Row, condition: &Condition) -> bool {
    let actual = row.get(&condition.field).unwrap_or(&Value::Null);
    let kind = condition.kind;

    match &condition.op {
        CompiledOp::Eq(expected) => compare(kind, actual, expected) == Some(Ordering::Equal),
        CompiledOp::NotEq(expected) => compare(kind, actual, expected) != Some(Ordering::Equal),
        CompiledOp::Contains(needle) => actual
            .as_str()
            .is_some_and(|s| s.to_lowercase().contains(&needle.to_lowercase())),
        CompiledOp::Gt(bound) => compare(kind, actual, bound) == Some(Ordering::Greater),
        CompiledOp::Lt(bound) => compare(kind, actual, bound) == Some(Ordering::Less),
        CompiledOp::Between(low, high) => {
            matches!(compare(kind, actual, low), Some(Ordering::Greater | Ordering::Equal))
                && matches!(compare(kind, actual, high), Some(Ordering::Less | Ordering::Equal))
        }
        CompiledOp::In(items) => items
            .iter()
            .any(|item| compare(kind, actual, item) == Some(Ordering::Equal)),
        CompiledOp::NotIn(items) => !items
            .iter()
            .any(|item| compare(kind, actual, item) == Some(Ordering::Equal)),
    }
}

/// Kind-aware comparison. `None` means not comparable (e.g. null), which
/// fails every positive match.
fn compare(kind: FieldKind, actual: &Value, expected: &Value) -> Option<Ordering> {
    match kind {
        FieldKind::Text => Some(actual.as_str()?.cmp(expected.as_str()?)),
        FieldKind::Numeric => try_numeric(actual)?.partial_cmp(&try_numeric(expected)?),
        FieldKind::Boolean => Some(actual.as_bool()?.cmp(&expected.as_bool()?)),
        FieldKind::Date => {
            let a = actual.as_str().and_then(filter::parse_date)?;
            let b = expected.as_str().and_then(filter::parse_date)?;
            Some(a.cmp(&b))
        }
        FieldKind::Timestamp => {
            let a = actual.as_str().and_then(filter::parse_timestamp)?;
            let b = expected.as_str().and_then(filter::parse_timestamp)?;
            Some(a.cmp(&b))
        }
    }
}

fn sort_rows(rows: &mut [Row], source: DataSource, sort: &[SortSpec]) {
    let keys: Vec<SortSpec> = if sort.is_empty() {
        vec![SortSpec {
            field: "created_at".to_string(),
            direction: SortDirection::Desc,
        }]
    } else {
        sort.to_vec()
    };

    rows.sort_by(|a, b| {
        for key in &keys {
            let kind = match fields::lookup(source, &key.field) {
                Ok(d) => d.kind,
                Err(_) => continue,
            };
            let av = a.get(&key.field).unwrap_or(&Value::Null);
            let bv = b.get(&key.field).unwrap_or(&Value::Null);
            // Nulls compare greatest: last ascending, first descending,
            // matching Postgres defaults.
            let ordering = match (av.is_null(), bv.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => compare(kind, av, bv).unwrap_or(Ordering::Equal),
            };
            let ordering = match key.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn query(tenant_id: TenantId, conditions: Vec<Condition>) -> EntityQuery {
        EntityQuery {
            tenant_id,
            conditions,
            sort: vec![],
            select_fields: vec!["status".to_string(), "total".to_string()],
            limit: 1000,
        }
    }

    fn eq_status(value: &str) -> Condition {
        Condition {
            field: "status".to_string(),
            kind: FieldKind::Text,
            op: CompiledOp::Eq(json!(value)),
        }
    }

    fn seeded_store(tenant_id: TenantId) -> InMemoryEntityStore {
        let store = InMemoryEntityStore::new();
        for (status, total) in [("sent", 100), ("draft", 50), ("sent", 200)] {
            store.insert(
                DataSource::Invoices,
                tenant_id,
                json!({"status": status, "total": total, "created_at": "2026-01-01T00:00:00Z"}),
            );
        }
        store
    }

    #[tokio::test]
    async fn filters_by_condition() {
        let tenant = Uuid::new_v4();
        let store = seeded_store(tenant);
        let rows = store
            .find(DataSource::Invoices, query(tenant, vec![eq_status("sent")]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn tenants_are_isolated() {
        let tenant = Uuid::new_v4();
        let other = Uuid::new_v4();
        let store = seeded_store(tenant);
        let rows = store
            .find(DataSource::Invoices, query(other, vec![]))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn selects_only_requested_fields() {
        let tenant = Uuid::new_v4();
        let store = seeded_store(tenant);
        let rows = store
            .find(DataSource::Invoices, query(tenant, vec![]))
            .await
            .unwrap();
        assert!(rows[0].contains_key("status"));
        assert!(!rows[0].contains_key("created_at"));
    }

    #[tokio::test]
    async fn not_equals_keeps_null_rows() {
        let tenant = Uuid::new_v4();
        let store = InMemoryEntityStore::new();
        store.insert(DataSource::Invoices, tenant, json!({"status": null, "total": 1}));
        store.insert(DataSource::Invoices, tenant, json!({"status": "sent", "total": 2}));
        let condition = Condition {
            field: "status".to_string(),
            kind: FieldKind::Text,
            op: CompiledOp::NotEq(json!("sent")),
        };
        let rows = store
            .find(DataSource::Invoices, query(tenant, vec![condition]))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0]["status"].is_null());
    }

    #[tokio::test]
    async fn limit_truncates() {
        let tenant = Uuid::new_v4();
        let store = seeded_store(tenant);
        let mut q = query(tenant, vec![]);
        q.limit = 2;
        let rows = store.find(DataSource::Invoices, q).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
