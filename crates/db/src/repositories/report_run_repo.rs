//! Repository for the `report_runs` table.
//!
//! Run records are the scheduler's durable state. A record is created in
//! `Pending` status before execution begins and must always be moved to
//! exactly one terminal state; `complete` and `fail` both set
//! `completed_at` so no run is left dangling after a tick.

use meridian_core::types::DbId;
use sqlx::PgPool;

use crate::models::report_run::{ReportRun, RunListQuery};
use crate::models::status::RunStatus;

/// Column list for `report_runs` queries.
const COLUMNS: &str = "\
    id, report_id, status_id, trigger_key, output_format, recipients, \
    file_url, error_message, started_at, completed_at";

/// Maximum page size for run-history listing.
const MAX_LIMIT: i64 = 200;

/// Default page size for run-history listing.
const DEFAULT_LIMIT: i64 = 50;

/// Provides run-record lifecycle operations.
pub struct ReportRunRepo;

impl ReportRunRepo {
    /// Create a pending run for `(report_id, trigger_key)`.
    ///
    /// Returns `None` when a run for that trigger minute already exists:
    /// the unique index makes overlapping scheduler ticks idempotent, so
    /// callers skip execution instead of double-triggering.
    pub async fn create_pending(
        pool: &PgPool,
        report_id: DbId,
        trigger_key: &str,
        output_format: &str,
        recipients: &serde_json::Value,
    ) -> Result<Option<ReportRun>, sqlx::Error> {
        let query = format!(
            "INSERT INTO report_runs \
                 (report_id, status_id, trigger_key, output_format, recipients) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (report_id, trigger_key) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ReportRun>(&query)
            .bind(report_id)
            .bind(RunStatus::Pending.id())
            .bind(trigger_key)
            .bind(output_format)
            .bind(recipients)
            .fetch_optional(pool)
            .await
    }

    /// Transition a run to `Completed` with its artifact reference.
    pub async fn complete(
        pool: &PgPool,
        run_id: DbId,
        file_url: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE report_runs \
             SET status_id = $2, file_url = $3, completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(run_id)
        .bind(RunStatus::Completed.id())
        .bind(file_url)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Transition a run to `Failed`, preserving the underlying message.
    pub async fn fail(pool: &PgPool, run_id: DbId, error: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE report_runs \
             SET status_id = $2, error_message = $3, completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(run_id)
        .bind(RunStatus::Failed.id())
        .bind(error)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Find a run by its ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<ReportRun>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM report_runs WHERE id = $1");
        sqlx::query_as::<_, ReportRun>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Run history for a report, newest first.
    pub async fn list_by_report(
        pool: &PgPool,
        report_id: DbId,
        params: &RunListQuery,
    ) -> Result<Vec<ReportRun>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let query = format!(
            "SELECT {COLUMNS} FROM report_runs \
             WHERE report_id = $1 \
             ORDER BY started_at DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, ReportRun>(&query)
            .bind(report_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Crash recovery: fail any run still pending from before `cutoff`.
    ///
    /// A pending run older than the scheduler's tick interval means a
    /// previous process died mid-run; the no-orphan invariant requires it
    /// to reach a terminal state. Returns the number of runs swept.
    pub async fn fail_stale_pending(
        pool: &PgPool,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE report_runs \
             SET status_id = $1, \
                 error_message = 'Interrupted: scheduler restarted mid-run', \
                 completed_at = NOW() \
             WHERE status_id = $2 AND started_at < $3",
        )
        .bind(RunStatus::Failed.id())
        .bind(RunStatus::Pending.id())
        .bind(cutoff)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
