//! Scheduler trigger endpoint.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use crate::background::report_scheduler::{self, TickOutcome};
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /scheduler/process
///
/// Run one scheduler tick now. This is the entry point for an external
/// cron-style trigger; the built-in background loop calls the same
/// processing function. Overlapping invocations are safe: each report
/// triggers at most once per wall-clock minute.
pub async fn process_scheduled_reports(
    State(state): State<AppState>,
) -> Json<DataResponse<TickOutcome>> {
    let outcome = report_scheduler::process_due_reports(&state, Utc::now()).await;
    Json(DataResponse { data: outcome })
}
