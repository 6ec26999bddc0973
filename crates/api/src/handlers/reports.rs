//! Handlers for the `/tenants/{tenant_id}/reports` resource.
//!
//! The tenant id is an explicit path parameter threaded through every
//! repository and executor call; no handler touches unscoped data.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use meridian_core::error::CoreError;
use meridian_core::export::ExportFormat;
use meridian_core::report::ReportConfig;
use meridian_core::schedule;
use meridian_core::types::{DbId, TenantId};
use meridian_db::models::report::{CreateReport, EnableSchedule, Report, UpdateReport};
use meridian_db::models::report_run::RunListQuery;
use meridian_db::repositories::{ReportRepo, ReportRunRepo};
use serde::Deserialize;

use crate::engine::{export, ReportExecutor};
use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Fetch a report within the tenant's scope or fail with 404.
async fn find_report(
    pool: &sqlx::PgPool,
    tenant_id: TenantId,
    report_id: DbId,
) -> AppResult<Report> {
    ReportRepo::find_by_id(pool, tenant_id, report_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id: report_id,
        }))
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// POST /api/v1/tenants/{tenant_id}/reports
///
/// Create a report definition. The configuration is validated before
/// anything is persisted; an invalid one never reaches the database.
pub async fn create_report(
    State(state): State<AppState>,
    Path(tenant_id): Path<TenantId>,
    Json(input): Json<CreateReport>,
) -> AppResult<impl IntoResponse> {
    input.config.validate()?;
    let report = ReportRepo::create(&state.pool, tenant_id, &input).await?;

    tracing::info!(
        report_id = report.id,
        tenant_id = %tenant_id,
        name = %report.name,
        "Report created",
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /api/v1/tenants/{tenant_id}/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Path(tenant_id): Path<TenantId>,
) -> AppResult<impl IntoResponse> {
    let reports = ReportRepo::list_by_tenant(&state.pool, tenant_id).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// GET /api/v1/tenants/{tenant_id}/reports/{report_id}
pub async fn get_report(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let report = find_report(&state.pool, tenant_id, report_id).await?;
    Ok(Json(DataResponse { data: report }))
}

/// PUT /api/v1/tenants/{tenant_id}/reports/{report_id}
pub async fn update_report(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
    Json(input): Json<UpdateReport>,
) -> AppResult<impl IntoResponse> {
    if let Some(config) = &input.config {
        config.validate()?;
    }
    let report = ReportRepo::update(&state.pool, tenant_id, report_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id: report_id,
        }))?;
    Ok(Json(DataResponse { data: report }))
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// POST /api/v1/tenants/{tenant_id}/reports/execute
///
/// Ad-hoc execution of an unsaved configuration. Synchronous: returns the
/// complete `{data, summary|groups, total}` result or an error; there is
/// no partial result.
pub async fn execute_report(
    State(state): State<AppState>,
    Path(tenant_id): Path<TenantId>,
    Json(config): Json<ReportConfig>,
) -> AppResult<impl IntoResponse> {
    let output =
        ReportExecutor::execute(state.entity_store.as_ref(), tenant_id, &config).await?;
    Ok(Json(DataResponse { data: output }))
}

/// POST /api/v1/tenants/{tenant_id}/reports/{report_id}/run
///
/// Execute a saved report on demand.
pub async fn run_report(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let report = find_report(&state.pool, tenant_id, report_id).await?;
    let config = report.parsed_config()?;
    let output =
        ReportExecutor::execute(state.entity_store.as_ref(), tenant_id, &config).await?;
    Ok(Json(DataResponse { data: output }))
}

/// Query parameters for the export endpoint.
#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    /// Artifact format; defaults to the report's configured primary
    /// format (CSV when none is configured).
    pub format: Option<String>,
}

/// POST /api/v1/tenants/{tenant_id}/reports/{report_id}/export
///
/// Execute a saved report, render it, and store the artifact. Returns the
/// stored reference, not the bytes.
pub async fn export_report(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
    Query(params): Query<ExportQuery>,
) -> AppResult<impl IntoResponse> {
    let report = find_report(&state.pool, tenant_id, report_id).await?;
    let format: ExportFormat = match &params.format {
        Some(s) => s.parse()?,
        None => report.primary_export_format(),
    };

    let config = report.parsed_config()?;
    let output =
        ReportExecutor::execute(state.entity_store.as_ref(), tenant_id, &config).await?;

    let artifact = export::export_report(
        state.storage.as_ref(),
        report.id,
        format,
        &output,
        &config.columns,
        Utc::now(),
    )
    .await?;

    Ok(Json(DataResponse { data: artifact }))
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// POST /api/v1/tenants/{tenant_id}/reports/{report_id}/schedule
///
/// Enable unattended scheduling. Rejects schedules the due check could
/// never fire (missing day, malformed time) instead of storing them.
pub async fn enable_schedule(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
    Json(input): Json<EnableSchedule>,
) -> AppResult<impl IntoResponse> {
    schedule::validate_schedule(input.frequency, input.day, &input.time)?;

    let report = ReportRepo::enable_schedule(&state.pool, tenant_id, report_id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id: report_id,
        }))?;

    tracing::info!(
        report_id,
        tenant_id = %tenant_id,
        frequency = input.frequency.as_str(),
        "Report scheduling enabled",
    );

    Ok(Json(DataResponse { data: report }))
}

/// DELETE /api/v1/tenants/{tenant_id}/reports/{report_id}/schedule
pub async fn disable_schedule(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
) -> AppResult<impl IntoResponse> {
    let report = ReportRepo::disable_schedule(&state.pool, tenant_id, report_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Report",
            id: report_id,
        }))?;

    tracing::info!(report_id, tenant_id = %tenant_id, "Report scheduling disabled");
    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/tenants/{tenant_id}/reports/{report_id}/runs
///
/// Run history, newest first. The ownership check keeps one tenant's run
/// records invisible to another.
pub async fn list_runs(
    State(state): State<AppState>,
    Path((tenant_id, report_id)): Path<(TenantId, DbId)>,
    Query(params): Query<RunListQuery>,
) -> AppResult<impl IntoResponse> {
    find_report(&state.pool, tenant_id, report_id).await?;
    let runs = ReportRunRepo::list_by_report(&state.pool, report_id, &params).await?;
    Ok(Json(DataResponse { data: runs }))
}
