//! Route wiring.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{health, reports, scheduler};
use crate::state::AppState;

/// Root-level routes (outside /api/v1).
pub fn health_router() -> Router<AppState> {
    Router::new().route("/health", get(health::health))
}

/// All /api/v1 routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tenants/{tenant_id}/reports",
            post(reports::create_report).get(reports::list_reports),
        )
        .route(
            "/tenants/{tenant_id}/reports/execute",
            post(reports::execute_report),
        )
        .route(
            "/tenants/{tenant_id}/reports/{report_id}",
            get(reports::get_report).put(reports::update_report),
        )
        .route(
            "/tenants/{tenant_id}/reports/{report_id}/run",
            post(reports::run_report),
        )
        .route(
            "/tenants/{tenant_id}/reports/{report_id}/export",
            post(reports::export_report),
        )
        .route(
            "/tenants/{tenant_id}/reports/{report_id}/schedule",
            post(reports::enable_schedule).delete(reports::disable_schedule),
        )
        .route(
            "/tenants/{tenant_id}/reports/{report_id}/runs",
            get(reports::list_runs),
        )
        .route(
            "/scheduler/process",
            post(scheduler::process_scheduled_reports),
        )
}
