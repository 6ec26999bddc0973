//! Outbound notification delivery.
//!
//! The [`ReportMailer`] sends finished scheduled-report exports to the
//! run's recipient snapshot. Delivery is fire-and-forget: failures are
//! logged by the scheduler and never change a run's status.

pub mod mailer;

pub use mailer::{EmailConfig, ReportMailer};
