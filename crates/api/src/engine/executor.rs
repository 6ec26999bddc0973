//! The report executor.
//!
//! Orchestrates one report execution: validate the configuration, compile
//! its filters, and issue a single retrieval against the entity store with
//! the tenant scope, sort, limit, and field selection pushed down. Raw
//! rows then flow through the aggregation engine.
//!
//! The executor never retries: store failures propagate to the caller,
//! and retry policy (if any) belongs to the scheduler layer.

use meridian_core::aggregate::{self, ReportOutput};
use meridian_core::error::CoreError;
use meridian_core::filter;
use meridian_core::report::ReportConfig;
use meridian_core::types::TenantId;
use meridian_db::store::{EntityQuery, EntityStore, StoreError};

/// Execution failure, split so callers can map configuration errors and
/// retrieval errors differently.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error(transparent)]
    Config(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct ReportExecutor;

impl ReportExecutor {
    /// Execute a report configuration for one tenant.
    ///
    /// The tenant scope is injected here, ANDed with the compiled filters;
    /// no filter value can widen it. Only the fields named in `columns`
    /// are requested from the store.
    pub async fn execute(
        store: &dyn EntityStore,
        tenant_id: TenantId,
        config: &ReportConfig,
    ) -> Result<ReportOutput, ExecuteError> {
        config.validate()?;
        let conditions = filter::compile_filters(config)?;

        let mut select_fields: Vec<String> = Vec::new();
        for col in &config.columns {
            if !select_fields.contains(&col.field) {
                select_fields.push(col.field.clone());
            }
        }

        let query = EntityQuery {
            tenant_id,
            conditions,
            sort: config.sorting.clone().unwrap_or_default(),
            select_fields,
            limit: config.row_limit(),
        };

        let rows = store.find(config.data_source, query).await?;

        tracing::debug!(
            data_source = %config.data_source,
            rows = rows.len(),
            "Report retrieval complete"
        );

        Ok(aggregate::process(rows, config))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use meridian_core::aggregate::Row;
    use meridian_core::report::{
        Aggregate, DataSource, FilterOperator, ReportColumn, ReportFilter,
    };
    use meridian_db::store::InMemoryEntityStore;
    use serde_json::json;
    use uuid::Uuid;

    /// Store that fails every retrieval, for the error-propagation path.
    struct FailingStore;

    #[async_trait]
    impl EntityStore for FailingStore {
        async fn find(
            &self,
            _source: DataSource,
            _query: EntityQuery,
        ) -> Result<Vec<Row>, StoreError> {
            Err(StoreError::Rejected("storage unavailable".to_string()))
        }
    }

    /// Store that panics when reached; configuration errors must be
    /// raised before any repository call.
    struct UnreachableStore;

    #[async_trait]
    impl EntityStore for UnreachableStore {
        async fn find(
            &self,
            _source: DataSource,
            _query: EntityQuery,
        ) -> Result<Vec<Row>, StoreError> {
            panic!("store must not be called for an invalid configuration");
        }
    }

    fn overdue_invoices_config() -> ReportConfig {
        ReportConfig {
            data_source: DataSource::Invoices,
            filters: vec![
                ReportFilter {
                    field: "status".to_string(),
                    operator: FilterOperator::In,
                    value: json!(["sent", "partial"]),
                },
                ReportFilter {
                    field: "due_date".to_string(),
                    operator: FilterOperator::LessThan,
                    value: json!("2026-08-07"),
                },
            ],
            columns: vec![ReportColumn {
                field: "total".to_string(),
                label: "Total".to_string(),
                aggregate: Some(Aggregate::Sum),
            }],
            grouping: None,
            sorting: None,
            limit: None,
        }
    }

    fn seeded_invoice_store(tenant: Uuid) -> InMemoryEntityStore {
        let store = InMemoryEntityStore::new();
        let rows = [
            // Three overdue invoices matching the filters.
            ("sent", 100, "2026-05-01"),
            ("partial", 200, "2026-06-01"),
            ("sent", 300, "2026-07-01"),
            // Paid, and not overdue: both excluded.
            ("paid", 999, "2026-05-01"),
            ("sent", 999, "2026-12-01"),
        ];
        for (status, total, due) in rows {
            store.insert(
                DataSource::Invoices,
                tenant,
                json!({
                    "status": status,
                    "total": total,
                    "due_date": due,
                    "created_at": "2026-01-01T00:00:00Z"
                }),
            );
        }
        store
    }

    #[tokio::test]
    async fn overdue_invoice_scenario_sums_to_600() {
        let tenant = Uuid::new_v4();
        let store = seeded_invoice_store(tenant);

        let output = ReportExecutor::execute(&store, tenant, &overdue_invoices_config())
            .await
            .unwrap();

        match output {
            ReportOutput::Flat { summary, total, .. } => {
                assert_eq!(summary["total"], json!(600.0));
                assert_eq!(total, 3);
            }
            _ => panic!("expected flat output"),
        }
    }

    #[tokio::test]
    async fn tenant_scope_is_always_injected() {
        let tenant = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let store = seeded_invoice_store(tenant);

        let output = ReportExecutor::execute(&store, stranger, &overdue_invoices_config())
            .await
            .unwrap();
        assert_eq!(output.total(), 0);
    }

    #[tokio::test]
    async fn only_column_fields_leave_the_store() {
        let tenant = Uuid::new_v4();
        let store = seeded_invoice_store(tenant);

        let output = ReportExecutor::execute(&store, tenant, &overdue_invoices_config())
            .await
            .unwrap();
        let row = &output.rows()[0];
        assert!(row.contains_key("total"));
        assert!(!row.contains_key("status"));
        assert!(!row.contains_key("due_date"));
    }

    #[tokio::test]
    async fn invalid_configuration_fails_before_any_store_call() {
        let tenant = Uuid::new_v4();
        let mut config = overdue_invoices_config();
        config.filters[0].value = json!("not-an-array");

        let err = ReportExecutor::execute(&UnreachableStore, tenant, &config)
            .await
            .unwrap_err();
        assert_matches!(err, ExecuteError::Config(_));
    }

    #[tokio::test]
    async fn unsupported_data_source_field_fails_fast() {
        let tenant = Uuid::new_v4();
        let mut config = overdue_invoices_config();
        config.columns[0].field = "secret_margin".to_string();

        let err = ReportExecutor::execute(&UnreachableStore, tenant, &config)
            .await
            .unwrap_err();
        assert_matches!(err, ExecuteError::Config(_));
    }

    #[tokio::test]
    async fn store_failures_propagate_untranslated() {
        let tenant = Uuid::new_v4();
        let err = ReportExecutor::execute(&FailingStore, tenant, &overdue_invoices_config())
            .await
            .unwrap_err();
        match err {
            ExecuteError::Store(e) => {
                assert!(e.to_string().contains("storage unavailable"));
            }
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn grouped_execution_returns_group_shape() {
        let tenant = Uuid::new_v4();
        let store = seeded_invoice_store(tenant);

        let mut config = overdue_invoices_config();
        config.columns.push(ReportColumn {
            field: "status".to_string(),
            label: "Status".to_string(),
            aggregate: None,
        });
        config.grouping = Some(vec!["status".to_string()]);

        let output = ReportExecutor::execute(&store, tenant, &config).await.unwrap();
        match output {
            ReportOutput::Grouped { groups, total, .. } => {
                assert_eq!(groups, 2); // sent, partial
                assert_eq!(total, 3);
            }
            _ => panic!("expected grouped output"),
        }
    }
}
