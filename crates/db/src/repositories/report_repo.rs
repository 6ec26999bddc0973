//! Repository for the `reports` table.

use meridian_core::types::{DbId, TenantId};
use sqlx::PgPool;

use crate::models::report::{CreateReport, EnableSchedule, Report, UpdateReport};

/// Column list for `reports` queries.
const COLUMNS: &str = "\
    id, tenant_id, name, description, config, \
    schedule_enabled, schedule_frequency, schedule_day, schedule_time, \
    recipients, export_formats, created_at, updated_at";

/// Provides CRUD and schedule management for report definitions.
pub struct ReportRepo;

impl ReportRepo {
    /// Create a report owned by `tenant_id`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: TenantId,
        input: &CreateReport,
    ) -> Result<Report, sqlx::Error> {
        let config = serde_json::to_value(&input.config)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let query = format!(
            "INSERT INTO reports (tenant_id, name, description, config) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(config)
            .fetch_one(pool)
            .await
    }

    /// Find a report by id within a tenant.
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: TenantId,
        id: DbId,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM reports WHERE tenant_id = $1 AND id = $2");
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a tenant's reports, newest first.
    pub async fn list_by_tenant(
        pool: &PgPool,
        tenant_id: TenantId,
    ) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports WHERE tenant_id = $1 ORDER BY created_at DESC"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .fetch_all(pool)
            .await
    }

    /// Partially update a report's metadata and/or configuration.
    pub async fn update(
        pool: &PgPool,
        tenant_id: TenantId,
        id: DbId,
        input: &UpdateReport,
    ) -> Result<Option<Report>, sqlx::Error> {
        let config = match &input.config {
            Some(c) => {
                Some(serde_json::to_value(c).map_err(|e| sqlx::Error::Encode(Box::new(e)))?)
            }
            None => None,
        };
        let query = format!(
            "UPDATE reports SET \
                 name = COALESCE($3, name), \
                 description = COALESCE($4, description), \
                 config = COALESCE($5, config), \
                 updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(config)
            .fetch_optional(pool)
            .await
    }

    /// Enable unattended scheduling for a report.
    pub async fn enable_schedule(
        pool: &PgPool,
        tenant_id: TenantId,
        id: DbId,
        input: &EnableSchedule,
    ) -> Result<Option<Report>, sqlx::Error> {
        let recipients = serde_json::to_value(&input.recipients)
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let formats = serde_json::to_value([input.export_format])
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let query = format!(
            "UPDATE reports SET \
                 schedule_enabled = TRUE, \
                 schedule_frequency = $3, \
                 schedule_day = $4, \
                 schedule_time = $5, \
                 recipients = $6, \
                 export_formats = $7, \
                 updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .bind(id)
            .bind(input.frequency.as_str())
            .bind(input.day)
            .bind(&input.time)
            .bind(recipients)
            .bind(formats)
            .fetch_optional(pool)
            .await
    }

    /// Disable scheduling. The schedule definition is kept so re-enabling
    /// restores it; only the flag changes.
    pub async fn disable_schedule(
        pool: &PgPool,
        tenant_id: TenantId,
        id: DbId,
    ) -> Result<Option<Report>, sqlx::Error> {
        let query = format!(
            "UPDATE reports SET schedule_enabled = FALSE, updated_at = NOW() \
             WHERE tenant_id = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Report>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// All schedule-enabled reports across tenants, for the scheduler's
    /// bounded per-tick scan.
    pub async fn list_schedule_enabled(pool: &PgPool) -> Result<Vec<Report>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM reports WHERE schedule_enabled ORDER BY id"
        );
        sqlx::query_as::<_, Report>(&query).fetch_all(pool).await
    }
}
