//! Per-data-source field registries.
//!
//! Filters, columns, grouping, and sorting are keyed by field-name strings
//! in report configurations. Each data source declares its queryable fields
//! up front as a static descriptor table so unknown fields are rejected at
//! validation time instead of being trusted end-to-end.

use crate::error::CoreError;
use crate::report::{DataSource, FilterOperator};

/// The value kind of a queryable field. Drives filter-value validation and
/// how the storage layer binds filter values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Numeric,
    Date,
    Timestamp,
    Boolean,
}

/// One queryable field of a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor { name, kind }
}

const CONTACT_FIELDS: &[FieldDescriptor] = &[
    field("name", FieldKind::Text),
    field("email", FieldKind::Text),
    field("phone", FieldKind::Text),
    field("company", FieldKind::Text),
    field("city", FieldKind::Text),
    field("status", FieldKind::Text),
    field("created_at", FieldKind::Timestamp),
];

const DEAL_FIELDS: &[FieldDescriptor] = &[
    field("title", FieldKind::Text),
    field("stage", FieldKind::Text),
    field("status", FieldKind::Text),
    field("owner", FieldKind::Text),
    field("value", FieldKind::Numeric),
    field("probability", FieldKind::Numeric),
    field("expected_close_date", FieldKind::Date),
    field("created_at", FieldKind::Timestamp),
];

const TASK_FIELDS: &[FieldDescriptor] = &[
    field("title", FieldKind::Text),
    field("status", FieldKind::Text),
    field("priority", FieldKind::Text),
    field("assignee", FieldKind::Text),
    field("completed", FieldKind::Boolean),
    field("due_date", FieldKind::Date),
    field("created_at", FieldKind::Timestamp),
];

const INVOICE_FIELDS: &[FieldDescriptor] = &[
    field("invoice_number", FieldKind::Text),
    field("status", FieldKind::Text),
    field("total", FieldKind::Numeric),
    field("amount_paid", FieldKind::Numeric),
    field("issued_date", FieldKind::Date),
    field("due_date", FieldKind::Date),
    field("created_at", FieldKind::Timestamp),
];

const ORDER_FIELDS: &[FieldDescriptor] = &[
    field("order_number", FieldKind::Text),
    field("status", FieldKind::Text),
    field("total", FieldKind::Numeric),
    field("item_count", FieldKind::Numeric),
    field("placed_at", FieldKind::Timestamp),
    field("created_at", FieldKind::Timestamp),
];

const EXPENSE_FIELDS: &[FieldDescriptor] = &[
    field("category", FieldKind::Text),
    field("vendor", FieldKind::Text),
    field("status", FieldKind::Text),
    field("amount", FieldKind::Numeric),
    field("expense_date", FieldKind::Date),
    field("created_at", FieldKind::Timestamp),
];

/// All queryable fields for a data source.
pub fn descriptors(source: DataSource) -> &'static [FieldDescriptor] {
    match source {
        DataSource::Contacts => CONTACT_FIELDS,
        DataSource::Deals => DEAL_FIELDS,
        DataSource::Tasks => TASK_FIELDS,
        DataSource::Invoices => INVOICE_FIELDS,
        DataSource::Orders => ORDER_FIELDS,
        DataSource::Expenses => EXPENSE_FIELDS,
    }
}

/// Resolve a field name against a data source's registry.
pub fn lookup(source: DataSource, name: &str) -> Result<FieldDescriptor, CoreError> {
    descriptors(source)
        .iter()
        .find(|d| d.name == name)
        .copied()
        .ok_or_else(|| {
            CoreError::Validation(format!(
                "Unknown field '{name}' for data source '{source}'"
            ))
        })
}

impl FieldKind {
    /// Whether `op` is applicable to a field of this kind.
    ///
    /// Membership and equality work on every kind; substring matching only
    /// makes sense on text; ordering comparisons need an ordered kind.
    pub fn supports(self, op: FilterOperator) -> bool {
        match op {
            FilterOperator::Equals | FilterOperator::NotEquals => true,
            FilterOperator::In | FilterOperator::NotIn => true,
            FilterOperator::Contains => self == FieldKind::Text,
            FilterOperator::GreaterThan
            | FilterOperator::LessThan
            | FilterOperator::Between => matches!(
                self,
                FieldKind::Numeric | FieldKind::Date | FieldKind::Timestamp
            ),
        }
    }
}
