//! Export serialization.
//!
//! Renders a processed report result into one of the supported artifact
//! formats. The PDF and Excel writers produce minimal valid documents;
//! their visual layout is not contractual, only "rows and column
//! metadata in, bytes out".

mod csv;
mod pdf;
mod xlsx;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::aggregate::ReportOutput;
use crate::error::CoreError;
use crate::report::ReportColumn;
use crate::types::{DbId, Timestamp};

/// Supported export artifact formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Pdf,
    Excel,
}

impl ExportFormat {
    /// File extension of the produced artifact.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Excel => "xlsx",
        }
    }

    /// MIME type of the produced artifact.
    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Excel => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            other => Err(CoreError::Validation(format!(
                "Unknown export format '{other}'"
            ))),
        }
    }
}

/// Serialize a report result into artifact bytes.
pub fn render(
    format: ExportFormat,
    output: &ReportOutput,
    columns: &[ReportColumn],
) -> Result<Vec<u8>, CoreError> {
    match format {
        ExportFormat::Csv => Ok(csv::render(output)),
        ExportFormat::Pdf => Ok(pdf::render(output, columns)),
        ExportFormat::Excel => xlsx::render(output, columns),
    }
}

/// Deterministic artifact filename:
/// `report-<reportId>-<ISO8601 timestamp with ':' and '.' replaced>.<ext>`.
pub fn export_filename(report_id: DbId, now: Timestamp, format: ExportFormat) -> String {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("report-{report_id}-{stamp}.{}", format.extension())
}

/// Column header label: the configured label when the key names a column,
/// otherwise the key itself (grouped results add keys such as `count`).
pub(crate) fn header_label<'a>(key: &'a str, columns: &'a [ReportColumn]) -> &'a str {
    columns
        .iter()
        .find(|c| c.field == key)
        .map(|c| c.label.as_str())
        .unwrap_or(key)
}
