//! Daily session window derivation.
//!
//! A window is anchored on its end time: `end = day at HH:MM:00.000` and
//! `start = end - session length`. Windows are half-open, `[start, end)`.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Shortest session the window will ever span.
pub const MIN_SESSION_LENGTH_MIN: u32 = 1;

/// Wall-clock time of day at which the daily session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndTime {
    time: NaiveTime,
}

impl EndTime {
    pub fn new(hour: u32, minute: u32) -> Result<Self, ValidationError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(|time| Self { time })
            .ok_or(ValidationError::InvalidEndTime { hour, minute })
    }

    /// Hour and minute of `at`, seconds dropped.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self {
            time: NaiveTime::from_hms_opt(at.hour(), at.minute(), 0).unwrap_or(NaiveTime::MIN),
        }
    }

    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    /// This end time on the given calendar day.
    pub fn on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.time)
    }
}

impl fmt::Display for EndTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for EndTime {
    type Err = ValidationError;

    /// Parses `HH:MM` (24-hour clock).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidValue {
            field: "end_time".into(),
            message: format!("expected HH:MM, got '{s}'"),
        };
        let (h, m) = s.trim().split_once(':').ok_or_else(invalid)?;
        let hour = h.parse::<u32>().map_err(|_| invalid())?;
        let minute = m.parse::<u32>().map_err(|_| invalid())?;
        Self::new(hour, minute)
    }
}

impl TryFrom<String> for EndTime {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EndTime> for String {
    fn from(value: EndTime) -> Self {
        value.to_string()
    }
}

/// End time plus session length: everything needed to place a window on any day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPlan {
    pub end_time: EndTime,
    length_min: u32,
}

impl SessionPlan {
    /// Lengths below one minute are clamped so that `start < end` always holds.
    pub fn new(end_time: EndTime, length_min: u32) -> Self {
        Self {
            end_time,
            length_min: length_min.max(MIN_SESSION_LENGTH_MIN),
        }
    }

    pub fn length_min(&self) -> u32 {
        self.length_min
    }

    pub fn window_on(&self, day: NaiveDate) -> SessionWindow {
        let end = self.end_time.on(day);
        let start = end - Duration::minutes(i64::from(self.length_min));
        SessionWindow { day, start, end }
    }

    /// The window that governs `now`: tomorrow's if it has already opened
    /// (a session straddling midnight), otherwise today's.
    pub fn window_at(&self, now: NaiveDateTime) -> SessionWindow {
        if let Some(tomorrow) = now.date().succ_opt() {
            let next = self.window_on(tomorrow);
            if next.has_started(now) {
                return next;
            }
        }
        self.window_on(now.date())
    }
}

/// A concrete `[start, end)` interval for one calendar day.
///
/// `day` is the day of `end`; `start` may fall on the previous day when the
/// session straddles midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWindow {
    pub day: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl SessionWindow {
    pub fn contains(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now < self.end
    }

    pub fn has_started(&self, now: NaiveDateTime) -> bool {
        now >= self.start
    }

    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        now >= self.end
    }

    /// Next occurrence of the start time, rolled to tomorrow once today's has passed.
    pub fn next_start_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        if now > self.start {
            self.start + Duration::days(1)
        } else {
            self.start
        }
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        day().and_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn ten_pm_five_minutes_starts_at_nine_fifty_five() {
        let plan = SessionPlan::new(EndTime::new(22, 0).unwrap(), 5);
        let window = plan.window_on(day());
        assert_eq!(window.start, at(21, 55, 0));
        assert_eq!(window.end, at(22, 0, 0));
        assert_eq!(window.length(), Duration::minutes(5));
    }

    #[test]
    fn zero_length_is_clamped_to_one_minute() {
        let plan = SessionPlan::new(EndTime::new(8, 30).unwrap(), 0);
        let window = plan.window_on(day());
        assert_eq!(plan.length_min(), 1);
        assert!(window.start < window.end);
        assert_eq!(window.start, at(8, 29, 0));
    }

    #[test]
    fn window_is_half_open() {
        let window = SessionPlan::new(EndTime::new(22, 0).unwrap(), 5).window_on(day());
        assert!(!window.contains(at(21, 54, 59)));
        assert!(window.contains(at(21, 55, 0)));
        assert!(window.contains(at(21, 59, 59)));
        assert!(!window.contains(at(22, 0, 0)));
        assert!(window.has_ended(at(22, 0, 0)));
    }

    #[test]
    fn start_may_fall_on_previous_day() {
        let window = SessionPlan::new(EndTime::new(0, 3).unwrap(), 5).window_on(day());
        assert_eq!(window.start.date(), day().pred_opt().unwrap());
        assert_eq!((window.start.hour(), window.start.minute()), (23, 58));
    }

    #[test]
    fn window_at_prefers_tomorrow_once_it_opens() {
        let plan = SessionPlan::new(EndTime::new(0, 3).unwrap(), 5);
        let tomorrow = day().succ_opt().unwrap();
        assert_eq!(plan.window_at(at(12, 0, 0)).day, day());
        assert_eq!(plan.window_at(at(23, 58, 0)).day, tomorrow);
        assert_eq!(plan.window_at(at(0, 1, 0)).day, day());
    }

    #[test]
    fn next_start_rolls_forward_after_start() {
        let window = SessionPlan::new(EndTime::new(22, 0).unwrap(), 5).window_on(day());
        assert_eq!(window.next_start_after(at(12, 0, 0)), at(21, 55, 0));
        assert_eq!(window.next_start_after(at(21, 55, 0)), at(21, 55, 0));
        assert_eq!(
            window.next_start_after(at(21, 55, 1)),
            at(21, 55, 0) + Duration::days(1)
        );
    }

    #[test]
    fn end_time_parses_and_displays() {
        let end: EndTime = "7:05".parse().unwrap();
        assert_eq!((end.hour(), end.minute()), (7, 5));
        assert_eq!(end.to_string(), "07:05");
        assert!("24:00".parse::<EndTime>().is_err());
        assert!("22".parse::<EndTime>().is_err());
        assert!("ab:cd".parse::<EndTime>().is_err());
    }

    #[test]
    fn end_time_serializes_as_string() {
        let end = EndTime::new(22, 0).unwrap();
        assert_eq!(serde_json::to_string(&end).unwrap(), "\"22:00\"");
        let back: EndTime = serde_json::from_str("\"21:30\"").unwrap();
        assert_eq!(back, EndTime::new(21, 30).unwrap());
    }

    #[test]
    fn from_datetime_drops_seconds() {
        let end = EndTime::from_datetime(at(13, 45, 59));
        assert_eq!(end.on(day()), at(13, 45, 0));
    }
}
