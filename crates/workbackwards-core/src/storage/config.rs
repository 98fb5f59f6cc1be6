//! TOML-based application configuration.
//!
//! Stores preferences that are not part of the session settings:
//! - Notification permission, scheduling mode and texts
//! - Tick interval of the watch loop
//! - The end time used on first launch
//!
//! Configuration is stored at `<data dir>/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::notify::{NotificationContent, NotificationKind, NotificationScheduler, ScheduleMode};
use crate::session::EndTime;

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Acts as the notification permission.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub mode: ScheduleMode,
    #[serde(default = "default_start_title")]
    pub start_title: String,
    #[serde(default = "default_start_body")]
    pub start_body: String,
    #[serde(default = "default_end_title")]
    pub end_title: String,
    #[serde(default = "default_end_body")]
    pub end_body: String,
}

/// Periodic re-evaluation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

/// First-launch defaults for the session settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// When unset, the wall-clock time at first launch is used.
    #[serde(default)]
    pub default_end_hour: Option<u32>,
    #[serde(default)]
    pub default_end_minute: Option<u32>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `<data dir>/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub ticker: TickerConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_start_title() -> String {
    NotificationContent::default_for(NotificationKind::Start).title
}
fn default_start_body() -> String {
    NotificationContent::default_for(NotificationKind::Start).body
}
fn default_end_title() -> String {
    NotificationContent::default_for(NotificationKind::End).title
}
fn default_end_body() -> String {
    NotificationContent::default_for(NotificationKind::End).body
}
fn default_interval_ms() -> u64 {
    1000
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ScheduleMode::Daily,
            start_title: default_start_title(),
            start_body: default_start_body(),
            end_title: default_end_title(),
            end_body: default_end_body(),
        }
    }
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as bool")))?,
                    ),
                    // Optional fields: a number sets them, "none" clears them.
                    // Clearing a required number is rejected when the result
                    // is deserialized back into `Config`.
                    serde_json::Value::Number(_) | serde_json::Value::Null => match value {
                        "none" | "null" | "" => serde_json::Value::Null,
                        _ => value
                            .parse::<u64>()
                            .map(|n| serde_json::Value::Number(n.into()))
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    },
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the data directory, writing defaults if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without saving.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not fit the
    /// field's type.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Set a config value by key and save.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Self::default()
        })
    }

    /// Scheduler carrying the configured mode and notification texts.
    pub fn scheduler(&self) -> NotificationScheduler {
        let n = &self.notifications;
        let mut start = NotificationContent::default_for(NotificationKind::Start);
        start.title = n.start_title.clone();
        start.body = n.start_body.clone();
        let mut end = NotificationContent::default_for(NotificationKind::End);
        end.title = n.end_title.clone();
        end.body = n.end_body.clone();
        NotificationScheduler::new(n.mode).with_content(start, end)
    }

    /// End time for first launch: the configured default, or `now`'s hour and minute.
    pub fn default_end_time(&self, now: NaiveDateTime) -> EndTime {
        match (self.session.default_end_hour, self.session.default_end_minute) {
            (Some(h), m) => {
                EndTime::new(h, m.unwrap_or(0)).unwrap_or_else(|_| EndTime::from_datetime(now))
            }
            (None, _) => EndTime::from_datetime(now),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.ticker.interval_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert!(parsed.notifications.enabled);
        assert_eq!(parsed.notifications.mode, ScheduleMode::Daily);
        assert_eq!(parsed.ticker.interval_ms, 1000);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("notifications.enabled").as_deref(), Some("true"));
        assert_eq!(cfg.get("notifications.mode").as_deref(), Some("daily"));
        assert_eq!(cfg.get("ticker.interval_ms").as_deref(), Some("1000"));
        assert_eq!(cfg.get("session.default_end_hour").as_deref(), Some("null"));
        assert!(cfg.get("ticker.missing_key").is_none());
    }

    #[test]
    fn set_value_updates_fields() {
        let mut cfg = Config::default();
        cfg.set_value("notifications.enabled", "false").unwrap();
        cfg.set_value("notifications.mode", "one_shot").unwrap();
        cfg.set_value("ticker.interval_ms", "250").unwrap();
        cfg.set_value("session.default_end_hour", "22").unwrap();
        assert!(!cfg.notifications.enabled);
        assert_eq!(cfg.notifications.mode, ScheduleMode::OneShot);
        assert_eq!(cfg.ticker.interval_ms, 250);
        assert_eq!(cfg.session.default_end_hour, Some(22));
        cfg.set_value("session.default_end_hour", "none").unwrap();
        assert_eq!(cfg.session.default_end_hour, None);
    }

    #[test]
    fn set_value_clears_optional_number_once_set() {
        let mut cfg = Config::default();
        cfg.set_value("session.default_end_hour", "21").unwrap();
        cfg.set_value("session.default_end_minute", "30").unwrap();
        cfg.set_value("session.default_end_hour", "none").unwrap();
        cfg.set_value("session.default_end_minute", "null").unwrap();
        assert_eq!(cfg.session, SessionConfig::default());
        assert_eq!(cfg.get("session.default_end_hour").as_deref(), Some("null"));
    }

    #[test]
    fn set_value_refuses_to_clear_required_number() {
        let mut cfg = Config::default();
        let err = cfg.set_value("ticker.interval_ms", "none").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
        assert_eq!(cfg.ticker.interval_ms, 1000);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        let err = cfg.set_value("ticker.nonexistent", "1").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("notifications.enabled", "maybe").is_err());
        assert!(cfg.set_value("notifications.mode", "hourly").is_err());
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert!(cfg.notifications.enabled);
    }

    #[test]
    fn load_from_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[notifications]\nmode = \"one_shot\"\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.notifications.mode, ScheduleMode::OneShot);
        assert_eq!(cfg.notifications.start_title, "Time to Work on Posture!");
        assert_eq!(cfg.ticker.interval_ms, 1000);
    }

    #[test]
    fn default_end_time_prefers_config() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(14, 37, 12)
            .unwrap();
        let mut cfg = Config::default();
        assert_eq!(cfg.default_end_time(now), EndTime::new(14, 37).unwrap());
        cfg.session.default_end_hour = Some(22);
        assert_eq!(cfg.default_end_time(now), EndTime::new(22, 0).unwrap());
    }

    #[test]
    fn scheduler_uses_configured_texts() {
        let mut cfg = Config::default();
        cfg.notifications.mode = ScheduleMode::OneShot;
        let scheduler = cfg.scheduler();
        assert_eq!(scheduler.mode(), ScheduleMode::OneShot);
    }
}
