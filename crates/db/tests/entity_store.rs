//! Integration tests for the Postgres entity store.
//!
//! Seeds invoice rows directly and checks that compiled conditions
//! translate to the exact retrieval semantics the engine relies on:
//! complementary equals/not_equals, inclusive between, case-insensitive
//! contains, membership, tenant scoping, field selection, and ordering.

use meridian_core::fields::FieldKind;
use meridian_core::filter::{CompiledOp, Condition};
use meridian_core::report::{DataSource, SortDirection, SortSpec};
use meridian_core::types::TenantId;
use meridian_db::store::{EntityQuery, EntityStore, PgEntityStore};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_invoice(
    pool: &PgPool,
    tenant: TenantId,
    number: &str,
    status: Option<&str>,
    total: f64,
    due_date: &str,
) {
    sqlx::query(
        "INSERT INTO invoices (tenant_id, invoice_number, status, total, due_date) \
         VALUES ($1, $2, $3, $4, $5::date)",
    )
    .bind(tenant)
    .bind(number)
    .bind(status)
    .bind(total)
    .bind(due_date)
    .execute(pool)
    .await
    .unwrap();
}

async fn seed_fixture(pool: &PgPool) -> TenantId {
    let tenant = Uuid::new_v4();
    seed_invoice(pool, tenant, "INV-001", Some("sent"), 100.0, "2026-01-10").await;
    seed_invoice(pool, tenant, "INV-002", Some("partial"), 200.0, "2026-02-10").await;
    seed_invoice(pool, tenant, "INV-003", Some("paid"), 300.0, "2026-03-10").await;
    seed_invoice(pool, tenant, "INV-004", None, 400.0, "2026-04-10").await;
    tenant
}

fn query(tenant: TenantId, conditions: Vec<Condition>) -> EntityQuery {
    EntityQuery {
        tenant_id: tenant,
        conditions,
        sort: vec![],
        select_fields: vec![
            "invoice_number".to_string(),
            "status".to_string(),
            "total".to_string(),
        ],
        limit: 1000,
    }
}

fn condition(field: &str, kind: FieldKind, op: CompiledOp) -> Condition {
    Condition {
        field: field.to_string(),
        kind,
        op,
    }
}

fn numbers(rows: &[meridian_core::aggregate::Row]) -> Vec<String> {
    rows.iter()
        .map(|r| r["invoice_number"].as_str().unwrap().to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Operator semantics
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn equals_and_not_equals_partition_the_set(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let equal = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition("status", FieldKind::Text, CompiledOp::Eq(json!("sent")))],
            ),
        )
        .await
        .unwrap();
    let not_equal = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "status",
                    FieldKind::Text,
                    CompiledOp::NotEq(json!("sent")),
                )],
            ),
        )
        .await
        .unwrap();

    // Disjoint and exhaustive, including the NULL-status row.
    assert_eq!(equal.len() + not_equal.len(), 4);
    let eq_ids = numbers(&equal);
    for id in numbers(&not_equal) {
        assert!(!eq_ids.contains(&id));
    }
    assert!(numbers(&not_equal).contains(&"INV-004".to_string()));
}

#[sqlx::test(migrations = "./migrations")]
async fn between_includes_both_bounds(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "total",
                    FieldKind::Numeric,
                    CompiledOp::Between(json!(100), json!(300)),
                )],
            ),
        )
        .await
        .unwrap();

    let mut ids = numbers(&rows);
    ids.sort();
    assert_eq!(ids, vec!["INV-001", "INV-002", "INV-003"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn contains_is_case_insensitive(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "invoice_number",
                    FieldKind::Text,
                    CompiledOp::Contains("inv-00".to_string()),
                )],
            ),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
}

#[sqlx::test(migrations = "./migrations")]
async fn in_matches_membership(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "status",
                    FieldKind::Text,
                    CompiledOp::In(vec![json!("sent"), json!("partial")]),
                )],
            ),
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
}

#[sqlx::test(migrations = "./migrations")]
async fn not_in_keeps_null_rows(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "status",
                    FieldKind::Text,
                    CompiledOp::NotIn(vec![json!("sent"), json!("partial"), json!("paid")]),
                )],
            ),
        )
        .await
        .unwrap();
    assert_eq!(numbers(&rows), vec!["INV-004"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn date_bounds_compare_as_dates(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(
            DataSource::Invoices,
            query(
                tenant,
                vec![condition(
                    "due_date",
                    FieldKind::Date,
                    CompiledOp::Lt(json!("2026-02-10")),
                )],
            ),
        )
        .await
        .unwrap();
    // Strict bound: the 2026-02-10 row is excluded.
    assert_eq!(numbers(&rows), vec!["INV-001"]);
}

// ---------------------------------------------------------------------------
// Scoping, selection, ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "./migrations")]
async fn rows_are_tenant_scoped(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let other = Uuid::new_v4();
    seed_invoice(&pool, other, "INV-X", Some("sent"), 999.0, "2026-01-01").await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(DataSource::Invoices, query(tenant, vec![]))
        .await
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert!(!numbers(&rows).contains(&"INV-X".to_string()));
}

#[sqlx::test(migrations = "./migrations")]
async fn only_selected_fields_are_returned(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let rows = store
        .find(DataSource::Invoices, query(tenant, vec![]))
        .await
        .unwrap();
    let keys: Vec<&String> = rows[0].keys().collect();
    assert_eq!(keys, ["invoice_number", "status", "total"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn explicit_sort_is_applied(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let mut q = query(tenant, vec![]);
    q.sort = vec![SortSpec {
        field: "total".to_string(),
        direction: SortDirection::Desc,
    }];
    let rows = store.find(DataSource::Invoices, q).await.unwrap();
    assert_eq!(numbers(&rows), vec!["INV-004", "INV-003", "INV-002", "INV-001"]);
}

#[sqlx::test(migrations = "./migrations")]
async fn limit_caps_the_result(pool: PgPool) {
    let tenant = seed_fixture(&pool).await;
    let store = PgEntityStore::new(pool);

    let mut q = query(tenant, vec![]);
    q.limit = 2;
    let rows = store.find(DataSource::Invoices, q).await.unwrap();
    assert_eq!(rows.len(), 2);
}
