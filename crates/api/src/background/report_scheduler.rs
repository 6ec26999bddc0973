//! Tick-based scheduled report processing.
//!
//! Each tick scans schedule-enabled reports, narrows to those due at the
//! current wall-clock minute, and processes the due set with bounded
//! parallelism. Every due report gets its own run record and error
//! boundary: one report's failure never aborts or corrupts a sibling's
//! run. Run records always leave a tick in a terminal state.

use chrono::Utc;
use futures::StreamExt;
use meridian_core::schedule::{self, ScheduleFrequency};
use meridian_core::types::{DbId, Timestamp};
use meridian_db::models::report::Report;
use meridian_db::repositories::{ReportRepo, ReportRunRepo};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::engine::{export, ReportExecutor};
use crate::state::AppState;

/// Pending runs older than this at startup belong to a dead process.
const STALE_PENDING_AFTER_MINS: i64 = 10;

/// Result of one scheduler tick.
#[derive(Debug, Serialize)]
pub struct TickOutcome {
    /// Reports that were triggered this tick (run record created).
    pub processed: usize,
    pub report_ids: Vec<DbId>,
}

/// Run the scheduler loop until the cancellation token is triggered.
///
/// Sweeps stale pending runs once at startup (crash recovery), then
/// evaluates due reports every tick interval.
pub async fn run(state: AppState, cancel: CancellationToken) {
    let tick = std::time::Duration::from_secs(state.config.scheduler_tick_secs);
    tracing::info!(tick_secs = tick.as_secs(), "Report scheduler started");

    let stale_cutoff = Utc::now() - chrono::Duration::minutes(STALE_PENDING_AFTER_MINS);
    match ReportRunRepo::fail_stale_pending(&state.pool, stale_cutoff).await {
        Ok(0) => {}
        Ok(swept) => tracing::warn!(swept, "Recovered orphaned pending runs"),
        Err(e) => tracing::error!(error = %e, "Stale pending sweep failed"),
    }

    let mut interval = tokio::time::interval(tick);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Report scheduler shutting down");
                break;
            }
            _ = interval.tick() => {
                let outcome = process_due_reports(&state, Utc::now()).await;
                if outcome.processed > 0 {
                    tracing::info!(
                        processed = outcome.processed,
                        report_ids = ?outcome.report_ids,
                        "Scheduler tick complete"
                    );
                }
            }
        }
    }
}

/// One scheduler tick: process every report due at `now`.
///
/// Also serves `POST /scheduler/process` so an external cron-style caller
/// can drive scheduling without the built-in loop.
pub async fn process_due_reports(state: &AppState, now: Timestamp) -> TickOutcome {
    let reports = match ReportRepo::list_schedule_enabled(&state.pool).await {
        Ok(reports) => reports,
        Err(e) => {
            tracing::error!(error = %e, "Scheduled report scan failed");
            return TickOutcome {
                processed: 0,
                report_ids: vec![],
            };
        }
    };

    let due: Vec<Report> = reports.into_iter().filter(|r| is_report_due(r, now)).collect();

    let triggered: Vec<DbId> = futures::stream::iter(due)
        .map(|report| run_scheduled_report(state, report, now))
        .buffer_unordered(state.config.scheduler_max_concurrent.max(1))
        .filter_map(|id| async move { id })
        .collect()
        .await;

    TickOutcome {
        processed: triggered.len(),
        report_ids: triggered,
    }
}

/// Evaluate a report's schedule fields against `now`.
///
/// Unparseable fields fail closed: a report with a malformed stored
/// frequency or time is never due.
fn is_report_due(report: &Report, now: Timestamp) -> bool {
    let Some(frequency) = report
        .schedule_frequency
        .as_deref()
        .and_then(|s| s.parse::<ScheduleFrequency>().ok())
    else {
        return false;
    };
    let Some(time) = report.schedule_time.as_deref() else {
        return false;
    };
    schedule::is_due(frequency, report.schedule_day, time, now)
}

/// Execute one due report behind its own error boundary.
///
/// Returns the report id when a run record was created (the report was
/// triggered), or `None` when the trigger minute was already claimed by
/// an overlapping tick. The run record reaches a terminal state on every
/// path before this returns.
async fn run_scheduled_report(state: &AppState, report: Report, now: Timestamp) -> Option<DbId> {
    let format = report.primary_export_format();
    let recipients = serde_json::Value::Array(
        report
            .recipient_list()
            .into_iter()
            .map(serde_json::Value::String)
            .collect(),
    );

    let run = match ReportRunRepo::create_pending(
        &state.pool,
        report.id,
        &schedule::trigger_key(now),
        format.extension(),
        &recipients,
    )
    .await
    {
        Ok(Some(run)) => run,
        Ok(None) => {
            tracing::debug!(report_id = report.id, "Trigger minute already processed");
            return None;
        }
        Err(e) => {
            tracing::error!(report_id = report.id, error = %e, "Run record creation failed");
            return None;
        }
    };

    match execute_and_export(state, &report, now).await {
        Ok(url) => {
            if let Err(e) = ReportRunRepo::complete(&state.pool, run.id, &url).await {
                tracing::error!(run_id = run.id, error = %e, "Run completion update failed");
                return Some(report.id);
            }

            // Delivery failures are logged but do not change the run's
            // COMPLETED status: the export itself succeeded.
            if let Some(mailer) = &state.mailer {
                let recipients = report.recipient_list();
                if !recipients.is_empty() {
                    if let Err(e) = mailer.deliver(&recipients, &report.name, &url).await {
                        tracing::warn!(
                            report_id = report.id,
                            error = %e,
                            "Report delivery failed after successful export"
                        );
                    }
                }
            }
        }
        Err(message) => {
            tracing::warn!(report_id = report.id, error = %message, "Scheduled run failed");
            if let Err(e) = ReportRunRepo::fail(&state.pool, run.id, &message).await {
                tracing::error!(run_id = run.id, error = %e, "Run failure update failed");
            }
        }
    }

    Some(report.id)
}

/// Execute, render, and store one report, collapsing every failure into
/// the message recorded on the run.
async fn execute_and_export(
    state: &AppState,
    report: &Report,
    now: Timestamp,
) -> Result<String, String> {
    let config = report.parsed_config().map_err(|e| e.to_string())?;

    let output = ReportExecutor::execute(state.entity_store.as_ref(), report.tenant_id, &config)
        .await
        .map_err(|e| e.to_string())?;

    let artifact = export::export_report(
        state.storage.as_ref(),
        report.id,
        report.primary_export_format(),
        &output,
        &config.columns,
        now,
    )
    .await
    .map_err(|e| e.to_string())?;

    Ok(artifact.url)
}
