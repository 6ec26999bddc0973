//! Meridian report engine: domain core.
//!
//! Pure domain logic with zero internal deps so it can be used by the
//! API/repository layer and any future worker or CLI tooling: report
//! configuration and validation, filter compilation, the grouping and
//! aggregation engine, schedule evaluation, and export serialization.

pub mod aggregate;
pub mod error;
pub mod export;
pub mod fields;
pub mod filter;
pub mod report;
pub mod schedule;
pub mod types;
