//! Schedule due-ness evaluation.
//!
//! Deliberately narrower than cron: a report runs daily, weekly, or
//! monthly at a configured `HH:MM`, with weekly/monthly additionally
//! pinned to a day. The check compares against the current wall-clock
//! time truncated to the minute.

use chrono::{Datelike, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// Recurrence frequency of a scheduled report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleFrequency {
    Daily,
    Weekly,
    Monthly,
}

impl ScheduleFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            ScheduleFrequency::Daily => "daily",
            ScheduleFrequency::Weekly => "weekly",
            ScheduleFrequency::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for ScheduleFrequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(ScheduleFrequency::Daily),
            "weekly" => Ok(ScheduleFrequency::Weekly),
            "monthly" => Ok(ScheduleFrequency::Monthly),
            other => Err(CoreError::Validation(format!(
                "Unknown schedule frequency '{other}'"
            ))),
        }
    }
}

/// Parse a `HH:MM` schedule time into (hour, minute).
pub fn parse_schedule_time(time: &str) -> Result<(u32, u32), CoreError> {
    let invalid =
        || CoreError::Validation(format!("Schedule time '{time}' is not HH:MM"));

    let (h, m) = time.split_once(':').ok_or_else(invalid)?;
    if h.len() != 2 || m.len() != 2 {
        return Err(invalid());
    }
    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    if hour > 23 || minute > 59 {
        return Err(invalid());
    }
    Ok((hour, minute))
}

/// Validate a schedule definition at configuration time.
///
/// Weekly schedules need a day 0–6 (Sunday = 0); monthly need 1–31.
/// The due check fails closed on a missing day, so rejecting it here
/// keeps never-due schedules out of the database.
pub fn validate_schedule(
    frequency: ScheduleFrequency,
    day: Option<i32>,
    time: &str,
) -> Result<(), CoreError> {
    parse_schedule_time(time)?;
    match frequency {
        ScheduleFrequency::Daily => Ok(()),
        ScheduleFrequency::Weekly => match day {
            Some(d) if (0..=6).contains(&d) => Ok(()),
            Some(d) => Err(CoreError::Validation(format!(
                "Weekly schedule day must be 0-6 (Sunday = 0), got {d}"
            ))),
            None => Err(CoreError::Validation(
                "Weekly schedule requires a day of week".to_string(),
            )),
        },
        ScheduleFrequency::Monthly => match day {
            Some(d) if (1..=31).contains(&d) => Ok(()),
            Some(d) => Err(CoreError::Validation(format!(
                "Monthly schedule day must be 1-31, got {d}"
            ))),
            None => Err(CoreError::Validation(
                "Monthly schedule requires a day of month".to_string(),
            )),
        },
    }
}

/// Whether a schedule is due at `now`.
///
/// The configured time is compared to `now` truncated to the minute.
/// A weekly/monthly schedule with no day configured is never due.
pub fn is_due(
    frequency: ScheduleFrequency,
    day: Option<i32>,
    time: &str,
    now: Timestamp,
) -> bool {
    let Ok((hour, minute)) = parse_schedule_time(time) else {
        return false;
    };
    if now.hour() != hour || now.minute() != minute {
        return false;
    }

    match frequency {
        ScheduleFrequency::Daily => true,
        ScheduleFrequency::Weekly => {
            day.is_some_and(|d| d == now.weekday().num_days_from_sunday() as i32)
        }
        ScheduleFrequency::Monthly => day.is_some_and(|d| d == now.day() as i32),
    }
}

/// Minute-resolution key for a trigger instant.
///
/// `(report_id, trigger_key)` is unique in the run-record table, which is
/// what makes overlapping scheduler ticks idempotent for the same minute.
pub fn trigger_key(now: Timestamp) -> String {
    now.format("%Y-%m-%dT%H:%MZ").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    /// 2026-08-05 is a Wednesday (weekday 3, Sunday = 0).
    fn wednesday_0900() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 0).unwrap()
    }

    fn tuesday_0900() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 8, 4, 9, 0, 0).unwrap()
    }

    #[test]
    fn daily_is_due_at_configured_minute() {
        assert!(is_due(ScheduleFrequency::Daily, None, "09:00", wednesday_0900()));
    }

    #[test]
    fn daily_is_not_due_at_other_minutes() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 9, 1, 0).unwrap();
        assert!(!is_due(ScheduleFrequency::Daily, None, "09:00", now));
    }

    #[test]
    fn seconds_are_truncated() {
        let now = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 59).unwrap();
        assert!(is_due(ScheduleFrequency::Daily, None, "09:00", now));
    }

    #[test]
    fn weekly_wednesday_report_due_on_wednesday() {
        assert!(is_due(
            ScheduleFrequency::Weekly,
            Some(3),
            "09:00",
            wednesday_0900()
        ));
    }

    #[test]
    fn weekly_wednesday_report_not_due_on_tuesday() {
        assert!(!is_due(
            ScheduleFrequency::Weekly,
            Some(3),
            "09:00",
            tuesday_0900()
        ));
    }

    #[test]
    fn weekly_without_day_is_never_due() {
        assert!(!is_due(ScheduleFrequency::Weekly, None, "09:00", wednesday_0900()));
    }

    #[test]
    fn monthly_matches_day_of_month() {
        assert!(is_due(
            ScheduleFrequency::Monthly,
            Some(5),
            "09:00",
            wednesday_0900()
        ));
        assert!(!is_due(
            ScheduleFrequency::Monthly,
            Some(6),
            "09:00",
            wednesday_0900()
        ));
    }

    #[test]
    fn monthly_without_day_is_never_due() {
        assert!(!is_due(ScheduleFrequency::Monthly, None, "09:00", wednesday_0900()));
    }

    #[test]
    fn malformed_time_is_never_due() {
        assert!(!is_due(ScheduleFrequency::Daily, None, "9 o'clock", wednesday_0900()));
    }

    #[test]
    fn validate_rejects_out_of_range_days() {
        assert!(validate_schedule(ScheduleFrequency::Weekly, Some(7), "09:00").is_err());
        assert!(validate_schedule(ScheduleFrequency::Monthly, Some(0), "09:00").is_err());
        assert!(validate_schedule(ScheduleFrequency::Monthly, Some(32), "09:00").is_err());
    }

    #[test]
    fn validate_rejects_missing_day_for_weekly_and_monthly() {
        assert!(validate_schedule(ScheduleFrequency::Weekly, None, "09:00").is_err());
        assert!(validate_schedule(ScheduleFrequency::Monthly, None, "09:00").is_err());
        assert!(validate_schedule(ScheduleFrequency::Daily, None, "09:00").is_ok());
    }

    #[test]
    fn validate_rejects_malformed_time() {
        assert!(validate_schedule(ScheduleFrequency::Daily, None, "24:00").is_err());
        assert!(validate_schedule(ScheduleFrequency::Daily, None, "09:60").is_err());
        assert!(validate_schedule(ScheduleFrequency::Daily, None, "900").is_err());
    }

    #[test]
    fn trigger_key_is_minute_resolution() {
        let a = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 1).unwrap();
        let b = Utc.with_ymd_and_hms(2026, 8, 5, 9, 0, 58).unwrap();
        assert_eq!(trigger_key(a), trigger_key(b));
        assert_eq!(trigger_key(a), "2026-08-05T09:00Z");
    }
}
