//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Every method that touches
//! tenant-owned rows takes an explicit tenant id.

pub mod report_repo;
pub mod report_run_repo;

pub use report_repo::ReportRepo;
pub use report_run_repo::ReportRunRepo;
