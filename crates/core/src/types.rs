/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// Tenants are keyed by UUID; every data access is scoped by one.
pub type TenantId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
