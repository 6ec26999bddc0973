//! The entity repository boundary.
//!
//! The report executor consumes entity data through the narrow
//! [`EntityStore`] trait: filtered, sorted, limited, field-selected
//! retrieval scoped to one tenant. The production implementation is
//! [`PgEntityStore`]; [`InMemoryEntityStore`] provides the same operator
//! semantics for engine tests.

mod memory;
mod postgres;

pub use memory::InMemoryEntityStore;
pub use postgres::PgEntityStore;

use async_trait::async_trait;
use meridian_core::aggregate::Row;
use meridian_core::filter::Condition;
use meridian_core::report::{DataSource, SortSpec};
use meridian_core::types::TenantId;

/// A fully-specified retrieval request.
///
/// `tenant_id` is mandatory and injected by the executor; it is not
/// expressible as a user filter condition.
#[derive(Debug, Clone)]
pub struct EntityQuery {
    pub tenant_id: TenantId,
    /// Compiled filter conditions, combined with AND.
    pub conditions: Vec<Condition>,
    /// Sort keys; an empty list means descending creation order.
    pub sort: Vec<SortSpec>,
    /// Fields to return. Unselected entity fields never leave the store.
    pub select_fields: Vec<String>,
    /// Row cap applied at the store, not in application memory.
    pub limit: i64,
}

/// Retrieval errors. Propagated untranslated to ad-hoc callers; recorded
/// on the run record for scheduled runs.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Entity query failed: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Entity query rejected: {0}")]
    Rejected(String),
}

/// Per-entity-type retrieval with filter/sort/limit support.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn find(&self, source: DataSource, query: EntityQuery) -> Result<Vec<Row>, StoreError>;
}
