//! Scheduled run record models.

use meridian_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::StatusId;

/// A row from the `report_runs` table: one execution attempt of a
/// scheduled report.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ReportRun {
    pub id: DbId,
    pub report_id: DbId,
    pub status_id: StatusId,
    /// Minute-resolution trigger instant; unique per report.
    pub trigger_key: String,
    pub output_format: String,
    /// Recipients snapshot captured at trigger time; later edits to the
    /// report do not change historical run records.
    pub recipients: serde_json::Value,
    pub file_url: Option<String>,
    pub error_message: Option<String>,
    pub started_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// Query parameters for run-history listing.
#[derive(Debug, Deserialize)]
pub struct RunListQuery {
    /// Maximum number of results. Defaults to 50, capped at 200.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
