//! Report entity models and DTOs.

use meridian_core::error::CoreError;
use meridian_core::export::ExportFormat;
use meridian_core::report::ReportConfig;
use meridian_core::schedule::ScheduleFrequency;
use meridian_core::types::{DbId, TenantId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    /// The declarative [`ReportConfig`], stored as JSONB.
    pub config: serde_json::Value,
    pub schedule_enabled: bool,
    pub schedule_frequency: Option<String>,
    pub schedule_day: Option<i32>,
    pub schedule_time: Option<String>,
    /// Recipient email addresses, stored as a JSONB array.
    pub recipients: serde_json::Value,
    /// Configured export formats; scheduled runs render the first entry.
    pub export_formats: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Report {
    /// Parse the stored configuration.
    ///
    /// A stored configuration that no longer deserializes (e.g. written
    /// before a registry change) is a validation error, reported with the
    /// report's identity so scheduled-run failures are attributable.
    pub fn parsed_config(&self) -> Result<ReportConfig, CoreError> {
        serde_json::from_value(self.config.clone()).map_err(|e| {
            CoreError::Validation(format!(
                "Stored configuration of report {} is invalid: {e}",
                self.id
            ))
        })
    }

    /// Recipient list snapshot source.
    pub fn recipient_list(&self) -> Vec<String> {
        self.recipients
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The format scheduled runs export: the first configured entry,
    /// falling back to CSV when none is set.
    pub fn primary_export_format(&self) -> ExportFormat {
        self.export_formats
            .as_array()
            .and_then(|items| items.first())
            .and_then(|v| v.as_str())
            .and_then(|s| s.parse().ok())
            .unwrap_or(ExportFormat::Csv)
    }
}

/// DTO for creating a report.
#[derive(Debug, Deserialize)]
pub struct CreateReport {
    pub name: String,
    pub description: Option<String>,
    pub config: ReportConfig,
}

/// DTO for updating a report's metadata and/or configuration.
#[derive(Debug, Deserialize)]
pub struct UpdateReport {
    pub name: Option<String>,
    pub description: Option<String>,
    pub config: Option<ReportConfig>,
}

/// DTO for enabling a report's schedule.
#[derive(Debug, Deserialize)]
pub struct EnableSchedule {
    pub frequency: ScheduleFrequency,
    pub day: Option<i32>,
    pub time: String,
    pub recipients: Vec<String>,
    pub export_format: ExportFormat,
}
