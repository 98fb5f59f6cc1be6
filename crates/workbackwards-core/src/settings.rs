//! User settings and their persisted form.
//!
//! Each field lives under its own key in a [`KeyValueStore`]. Loading never
//! fails: unreadable keys are logged and defaulted, malformed values are
//! coerced into range.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::StorageError;
use crate::session::{
    EndTime, Outcome, SessionMachine, SessionPlan, SessionState, StreakProgress,
    DEFAULT_INCREMENT_MIN, DEFAULT_SESSION_LENGTH_MIN,
};
use crate::storage::KeyValueStore;

/// Store keys.
pub mod keys {
    pub const SESSION_LENGTH: &str = "session_length";
    pub const INCREMENT: &str = "increment";
    pub const END_HOUR: &str = "end_hour";
    pub const END_MINUTE: &str = "end_minute";
    pub const STREAK: &str = "streak";
    pub const SESSION_STATE: &str = "session_state";
    pub const LAST_SESSION_DATE: &str = "last_session_date";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub session_length_min: u32,
    pub increment_min: u32,
    pub end_time: EndTime,
    pub streak: u32,
    pub session: SessionMachine,
}

impl Settings {
    /// First-launch settings.
    pub fn with_end_time(end_time: EndTime) -> Self {
        Self {
            session_length_min: DEFAULT_SESSION_LENGTH_MIN,
            increment_min: DEFAULT_INCREMENT_MIN,
            end_time,
            streak: 0,
            session: SessionMachine::default(),
        }
    }

    pub fn plan(&self) -> SessionPlan {
        SessionPlan::new(self.end_time, self.session_length_min)
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn progress(&self) -> StreakProgress {
        StreakProgress {
            streak: self.streak,
            session_length_min: self.session_length_min,
        }
    }

    /// Apply the streak rule. Returns the progress before and after.
    pub fn update_streak(&mut self, outcome: Outcome) -> (StreakProgress, StreakProgress) {
        let before = self.progress();
        let after = before.apply(outcome, self.increment_min);
        tracing::info!(
            ?outcome,
            streak = after.streak,
            session_length = after.session_length_min,
            increment = self.increment_min,
            "streak updated"
        );
        self.streak = after.streak;
        self.session_length_min = after.session_length_min;
        (before, after)
    }

    pub fn apply_update(&mut self, update: &SettingsUpdate) {
        self.session_length_min = update.session_length_min;
        self.increment_min = update.increment_min;
        self.end_time = update.end_time;
    }

    /// Read every key, falling back per key. `fallback_end` is used when no
    /// usable end time is stored.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S, fallback_end: EndTime) -> Self {
        let session_length_min = read(store, keys::SESSION_LENGTH)
            .and_then(|v| positive(&v))
            .unwrap_or(DEFAULT_SESSION_LENGTH_MIN);
        let increment_min = read(store, keys::INCREMENT)
            .and_then(|v| positive(&v))
            .unwrap_or(DEFAULT_INCREMENT_MIN);
        let hour = read(store, keys::END_HOUR)
            .and_then(|v| integer(&v))
            .filter(|h| (0..=23).contains(h));
        let minute = read(store, keys::END_MINUTE)
            .and_then(|v| integer(&v))
            .filter(|m| (0..=59).contains(m));
        let end_time = match (hour, minute) {
            (Some(h), Some(m)) => EndTime::new(h as u32, m as u32).unwrap_or(fallback_end),
            _ => fallback_end,
        };
        let streak = read(store, keys::STREAK)
            .and_then(|v| integer(&v))
            .and_then(|s| u32::try_from(s).ok())
            .unwrap_or(0);
        let state = read(store, keys::SESSION_STATE)
            .and_then(|v| decode::<SessionState>(keys::SESSION_STATE, v))
            .unwrap_or_default();
        let last_session_date = read(store, keys::LAST_SESSION_DATE)
            .and_then(|v| decode::<Option<NaiveDate>>(keys::LAST_SESSION_DATE, v))
            .flatten();

        Self {
            session_length_min,
            increment_min,
            end_time,
            streak,
            session: SessionMachine::new(state, last_session_date),
        }
    }

    /// Write every key. Stops at the first failing write.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &S) -> Result<(), StorageError> {
        store.set(keys::SESSION_LENGTH, json!(self.session_length_min))?;
        store.set(keys::INCREMENT, json!(self.increment_min))?;
        store.set(keys::END_HOUR, json!(self.end_time.hour()))?;
        store.set(keys::END_MINUTE, json!(self.end_time.minute()))?;
        store.set(keys::STREAK, json!(self.streak))?;
        store.set(keys::SESSION_STATE, json!(self.session.state()))?;
        store.set(keys::LAST_SESSION_DATE, json!(self.session.last_session_date()))?;
        Ok(())
    }
}

fn read<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Option<Value> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read setting, using default");
            None
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(key: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key, error = %e, "malformed setting, using default");
            None
        }
    }
}

/// Integer view of a stored value: numbers are truncated, strings are read
/// up to the first non-digit.
fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn positive(value: &Value) -> Option<u32> {
    integer(value)
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

/// Leading-integer parse: `" 12abc"` is 12, `"abc"` is `None`.
pub(crate) fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Validated result of the settings editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsUpdate {
    pub session_length_min: u32,
    pub increment_min: u32,
    pub end_time: EndTime,
}

/// Editable copy of the settings, as text fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsDraft {
    pub session_length: String,
    pub increment: String,
    pub end_time: EndTime,
}

impl SettingsDraft {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            session_length: settings.session_length_min.to_string(),
            increment: settings.increment_min.to_string(),
            end_time: settings.end_time,
        }
    }

    /// Discard edits.
    pub fn reset(&mut self, settings: &Settings) {
        *self = Self::from_settings(settings);
    }

    /// Unparseable or non-positive fields fall back to the defaults.
    pub fn resolve(&self) -> SettingsUpdate {
        let field = |text: &str, default: u32| {
            parse_leading_int(text)
                .filter(|n| *n >= 1)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(default)
        };
        SettingsUpdate {
            session_length_min: field(&self.session_length, DEFAULT_SESSION_LENGTH_MIN),
            increment_min: field(&self.increment, DEFAULT_INCREMENT_MIN),
            end_time: self.end_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn ten_pm() -> EndTime {
        EndTime::new(22, 0).unwrap()
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Value>, StorageError> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("disk on fire".into()))
        }
    }

    #[test]
    fn empty_store_yields_defaults() {
        let settings = Settings::load(&MemoryStore::new(), ten_pm());
        assert_eq!(settings, Settings::with_end_time(ten_pm()));
        assert_eq!(settings.session_length_min, 5);
        assert_eq!(settings.increment_min, 1);
        assert_eq!(settings.state(), SessionState::NotRunning);
    }

    #[test]
    fn save_then_load_roundtrip() {
        let store = MemoryStore::new();
        let mut settings = Settings::with_end_time(EndTime::new(7, 45).unwrap());
        settings.session_length_min = 17;
        settings.increment_min = 3;
        settings.streak = 4;
        settings.session = SessionMachine::new(
            SessionState::Waiting,
            NaiveDate::from_ymd_opt(2026, 10, 15),
        );
        settings.save(&store).unwrap();
        assert_eq!(store.get(keys::SESSION_LENGTH).unwrap(), Some(json!(17)));
        assert_eq!(Settings::load(&store, ten_pm()), settings);
    }

    #[test]
    fn corrupted_values_are_coerced() {
        let store = MemoryStore::with_values([
            (keys::SESSION_LENGTH, json!("banana")),
            (keys::INCREMENT, json!(0)),
            (keys::END_HOUR, json!(31)),
            (keys::END_MINUTE, json!(15)),
            (keys::STREAK, json!(-4)),
            (keys::SESSION_STATE, json!({"state": "DANCING"})),
            (keys::LAST_SESSION_DATE, json!("yesterday")),
        ]);
        let settings = Settings::load(&store, ten_pm());
        assert_eq!(settings.session_length_min, 5);
        assert_eq!(settings.increment_min, 1);
        assert_eq!(settings.end_time, ten_pm());
        assert_eq!(settings.streak, 0);
        assert_eq!(settings.state(), SessionState::NotRunning);
        assert_eq!(settings.session.last_session_date(), None);
    }

    #[test]
    fn numeric_strings_are_accepted() {
        let store = MemoryStore::with_values([
            (keys::SESSION_LENGTH, json!("12")),
            (keys::INCREMENT, json!("2 minutes")),
            (keys::END_HOUR, json!("6")),
            (keys::END_MINUTE, json!(30.0)),
        ]);
        let settings = Settings::load(&store, ten_pm());
        assert_eq!(settings.session_length_min, 12);
        assert_eq!(settings.increment_min, 2);
        assert_eq!(settings.end_time, EndTime::new(6, 30).unwrap());
    }

    #[test]
    fn unreadable_store_falls_back() {
        let settings = Settings::load(&BrokenStore, ten_pm());
        assert_eq!(settings, Settings::with_end_time(ten_pm()));
        assert!(settings.save(&BrokenStore).is_err());
    }

    #[test]
    fn update_streak_applies_rule() {
        let mut settings = Settings::with_end_time(ten_pm());
        settings.increment_min = 2;
        settings.update_streak(Outcome::Success);
        let (before, after) = settings.update_streak(Outcome::Success);
        assert_eq!(before.streak, 1);
        assert_eq!(after.streak, 2);
        assert_eq!(settings.session_length_min, 9);
        settings.update_streak(Outcome::Failure);
        assert_eq!((settings.streak, settings.session_length_min), (0, 5));
    }

    #[test]
    fn draft_resolves_with_fallbacks() {
        let settings = Settings::with_end_time(ten_pm());
        let mut draft = SettingsDraft::from_settings(&settings);
        assert_eq!(draft.session_length, "5");
        draft.session_length = "".into();
        draft.increment = "0".into();
        let update = draft.resolve();
        assert_eq!(update.session_length_min, 5);
        assert_eq!(update.increment_min, 1);

        draft.session_length = "20".into();
        draft.increment = "4".into();
        draft.end_time = EndTime::new(6, 0).unwrap();
        let update = draft.resolve();
        assert_eq!(update.session_length_min, 20);
        assert_eq!(update.increment_min, 4);

        draft.reset(&settings);
        assert_eq!(draft, SettingsDraft::from_settings(&settings));
    }

    #[test]
    fn leading_int_parse() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  7min"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("x1"), None);
        assert_eq!(parse_leading_int(""), None);
    }
}
