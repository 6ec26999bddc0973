//! Export orchestration: render a processed result and hand the bytes to
//! artifact storage, returning the stored reference.

use meridian_core::aggregate::ReportOutput;
use meridian_core::error::CoreError;
use meridian_core::export::{self, ExportFormat};
use meridian_core::report::ReportColumn;
use meridian_core::types::{DbId, Timestamp};
use serde::Serialize;

use crate::storage::{ArtifactStorage, StorageError};

/// Export failure: serialization or storage.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error(transparent)]
    Render(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A stored export artifact reference.
#[derive(Debug, Clone, Serialize)]
pub struct ExportedArtifact {
    pub filename: String,
    pub url: String,
    pub content_type: &'static str,
}

/// Render `output` as `format` and store the bytes under the report's
/// deterministic filename.
pub async fn export_report(
    storage: &dyn ArtifactStorage,
    report_id: DbId,
    format: ExportFormat,
    output: &ReportOutput,
    columns: &[ReportColumn],
    now: Timestamp,
) -> Result<ExportedArtifact, ExportError> {
    let bytes = export::render(format, output, columns)?;
    let filename = export::export_filename(report_id, now, format);
    let url = storage.store(&filename, &bytes).await?;

    tracing::info!(
        report_id,
        format = format.extension(),
        url = %url,
        "Report artifact exported"
    );

    Ok(ExportedArtifact {
        filename,
        url,
        content_type: format.content_type(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    #[tokio::test]
    async fn exports_csv_through_storage() {
        let dir = tempfile::tempdir().unwrap();
        let storage = crate::storage::LocalArtifactStorage::new(dir.path().to_path_buf());

        let output = ReportOutput::Flat {
            data: vec![json!({"total": 600}).as_object().unwrap().clone()],
            summary: serde_json::Map::new(),
            total: 1,
            truncated: false,
        };
        let now = Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap();

        let artifact = export_report(&storage, 7, ExportFormat::Csv, &output, &[], now)
            .await
            .unwrap();

        assert_eq!(artifact.filename, "report-7-2026-08-07T09-00-00-000Z.csv");
        assert_eq!(artifact.url, "/exports/report-7-2026-08-07T09-00-00-000Z.csv");
        let written = std::fs::read_to_string(dir.path().join(&artifact.filename)).unwrap();
        assert_eq!(written, "total\n600\n");
    }
}
