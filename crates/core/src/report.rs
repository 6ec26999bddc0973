//! Report configuration model.
//!
//! [`ReportConfig`] is the declarative description of a report: which
//! business entity to query, filter conditions, columns, aggregations,
//! grouping, and sort order. Validation happens here, before any
//! repository call, so a malformed configuration never reaches storage.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::fields::{self, FieldKind};

/// Default row limit when a configuration does not specify one.
///
/// A safety bound, not a pagination mechanism: rows beyond it are dropped
/// and the result carries a `truncated` flag.
pub const DEFAULT_ROW_LIMIT: i64 = 1000;

// ---------------------------------------------------------------------------
// Data sources
// ---------------------------------------------------------------------------

/// The closed set of business entity types a report can query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Contacts,
    Deals,
    Tasks,
    Invoices,
    Orders,
    Expenses,
}

impl DataSource {
    /// The backing table name for this data source.
    pub fn table(self) -> &'static str {
        match self {
            DataSource::Contacts => "contacts",
            DataSource::Deals => "deals",
            DataSource::Tasks => "tasks",
            DataSource::Invoices => "invoices",
            DataSource::Orders => "orders",
            DataSource::Expenses => "expenses",
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// Filter comparison operator.
///
/// `between`, `in`, and `not_in` require an array value of the expected
/// arity; anything else is a configuration error, not a silent no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Between,
    In,
    NotIn,
}

/// One declarative filter condition. Filters combine with implicit AND.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportFilter {
    pub field: String,
    pub operator: FilterOperator,
    pub value: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Columns and aggregates
// ---------------------------------------------------------------------------

/// Aggregate function applied to a column when grouping or summarizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    Sum,
    Avg,
    Count,
    Min,
    Max,
}

/// A selected output column, optionally aggregated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportColumn {
    pub field: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aggregate: Option<Aggregate>,
}

// ---------------------------------------------------------------------------
// Sorting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// One sort key. When a configuration has no sorting, retrieval defaults
/// to descending creation order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

// ---------------------------------------------------------------------------
// ReportConfig
// ---------------------------------------------------------------------------

/// The declarative description of a report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub data_source: DataSource,
    #[serde(default)]
    pub filters: Vec<ReportFilter>,
    pub columns: Vec<ReportColumn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sorting: Option<Vec<SortSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl ReportConfig {
    /// The effective row limit for retrieval.
    pub fn row_limit(&self) -> i64 {
        match self.limit {
            Some(n) if n > 0 => n,
            _ => DEFAULT_ROW_LIMIT,
        }
    }

    /// Validate the configuration against the data source's field registry.
    ///
    /// Checks columns, grouping, and sorting here; filter operators and
    /// values are checked by the filter compiler, which this calls last so
    /// every part of an invalid configuration is rejected the same way.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.columns.is_empty() {
            return Err(CoreError::Validation(
                "Report must select at least one column".to_string(),
            ));
        }

        for col in &self.columns {
            let descriptor = fields::lookup(self.data_source, &col.field)?;
            if let Some(agg) = col.aggregate {
                // count works on any kind; the numeric aggregates only make
                // sense on fields that can hold numeric-coercible values.
                if agg != Aggregate::Count
                    && descriptor.kind == FieldKind::Boolean
                {
                    return Err(CoreError::Validation(format!(
                        "Aggregate {agg:?} is not applicable to boolean field '{}'",
                        col.field
                    )));
                }
            }
        }

        if let Some(grouping) = &self.grouping {
            for field in grouping {
                fields::lookup(self.data_source, field)?;
            }
        }

        if let Some(sorting) = &self.sorting {
            for sort in sorting {
                fields::lookup(self.data_source, &sort.field)?;
            }
        }

        crate::filter::compile_filters(self)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
