use std::sync::Arc;

use meridian_db::store::EntityStore;

use crate::config::ServerConfig;
use crate::notifications::ReportMailer;
use crate::storage::ArtifactStorage;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool (report definitions and run records).
    pub pool: meridian_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Entity repository the report executor reads from.
    pub entity_store: Arc<dyn EntityStore>,
    /// Sink exported artifacts are written to.
    pub storage: Arc<dyn ArtifactStorage>,
    /// Outbound mailer for scheduled-report delivery. `None` when SMTP is
    /// not configured; delivery is skipped.
    pub mailer: Option<Arc<ReportMailer>>,
}
