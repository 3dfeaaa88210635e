//! TOML-based application configuration.
//!
//! Stores:
//! - Breathing session defaults (duration bounds, pattern, poll cadence)
//! - Ledger tunables (routine duration bounds, XP floor, title length)
//!
//! Configuration is stored at `~/.config/pacer/config.toml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::clock::BreathingPattern;
use crate::error::ConfigError;
use crate::ledger::{self, LedgerOptions};

/// Breathing session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_session_secs")]
    pub default_secs: u32,
    #[serde(default = "default_min_session_secs")]
    pub min_secs: u32,
    #[serde(default = "default_max_session_secs")]
    pub max_secs: u32,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    /// How often the host polls a running session.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Routine ledger configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_min_duration_secs")]
    pub min_duration_secs: u32,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u32,
    #[serde(default = "default_duration_secs")]
    pub default_duration_secs: u32,
    #[serde(default = "default_min_xp")]
    pub min_xp: u64,
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pacer/config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

// Default functions
fn default_session_secs() -> u32 {
    20
}
fn default_min_session_secs() -> u32 {
    1
}
fn default_max_session_secs() -> u32 {
    3600
}
fn default_pattern() -> String {
    BreathingPattern::default().to_string()
}
fn default_poll_interval_ms() -> u64 {
    150
}
fn default_min_duration_secs() -> u32 {
    ledger::MIN_DURATION_SECS
}
fn default_max_duration_secs() -> u32 {
    ledger::MAX_DURATION_SECS
}
fn default_duration_secs() -> u32 {
    ledger::DEFAULT_DURATION_SECS
}
fn default_min_xp() -> u64 {
    ledger::MIN_XP
}
fn default_max_title_chars() -> usize {
    ledger::MAX_TITLE_CHARS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_secs: default_session_secs(),
            min_secs: default_min_session_secs(),
            max_secs: default_max_session_secs(),
            pattern: default_pattern(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_duration_secs: default_min_duration_secs(),
            max_duration_secs: default_max_duration_secs(),
            default_duration_secs: default_duration_secs(),
            min_xp: default_min_xp(),
            max_title_chars: default_max_title_chars(),
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
        if parts.peek().is_none() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as a whole number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => return Err(unknown()),
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default, writing the default file when
    /// none exists yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning default on error.
    /// This is a convenience method that never fails.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|err| {
            tracing::warn!("using default configuration: {err}");
            Self::default()
        })
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
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
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a value by key in memory, validating the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the resulting configuration is invalid. `self` is unchanged on error.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a value by key and save.
    ///
    /// # Errors
    ///
    /// As [`Config::set_value`], plus save failures.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.set_value(key, value)?;
        self.save()
    }

    /// Check cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| {
            Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            })
        };

        let s = &self.session;
        if s.min_secs == 0 || s.min_secs > s.max_secs {
            return invalid("session.min_secs", format!("must be 1-{} (got {})", s.max_secs, s.min_secs));
        }
        if !(s.min_secs..=s.max_secs).contains(&s.default_secs) {
            return invalid(
                "session.default_secs",
                format!("must be {}-{} (got {})", s.min_secs, s.max_secs, s.default_secs),
            );
        }
        if let Err(err) = s.pattern.parse::<BreathingPattern>() {
            return invalid("session.pattern", err.to_string());
        }
        if s.poll_interval_ms == 0 {
            return invalid("session.poll_interval_ms", "must be positive".into());
        }

        let l = &self.ledger;
        if l.min_duration_secs == 0 || l.min_duration_secs > l.max_duration_secs {
            return invalid(
                "ledger.min_duration_secs",
                format!("must be 1-{} (got {})", l.max_duration_secs, l.min_duration_secs),
            );
        }
        if !(l.min_duration_secs..=l.max_duration_secs).contains(&l.default_duration_secs) {
            return invalid(
                "ledger.default_duration_secs",
                format!(
                    "must be {}-{} (got {})",
                    l.min_duration_secs, l.max_duration_secs, l.default_duration_secs
                ),
            );
        }
        if l.max_title_chars == 0 {
            return invalid("ledger.max_title_chars", "must be positive".into());
        }
        Ok(())
    }

    pub fn pattern(&self) -> BreathingPattern {
        BreathingPattern::parse_or_default(&self.session.pattern)
    }

    pub fn ledger_options(&self) -> LedgerOptions {
        LedgerOptions {
            min_duration_secs: self.ledger.min_duration_secs,
            max_duration_secs: self.ledger.max_duration_secs,
            default_duration_secs: self.ledger.default_duration_secs,
            min_xp: self.ledger.min_xp,
            max_title_chars: self.ledger.max_title_chars,
            ..LedgerOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: Config = toml::from_str("[ledger]\nmin_xp = 5\n").unwrap();
        assert_eq!(parsed.ledger.min_xp, 5);
        assert_eq!(parsed.ledger.max_duration_secs, 900);
        assert_eq!(parsed.session.default_secs, 20);
        assert_eq!(parsed.session.pattern, "4-2-4");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.pattern").as_deref(), Some("4-2-4"));
        assert_eq!(cfg.get("ledger.min_xp").as_deref(), Some("10"));
        assert!(cfg.get("ledger.missing_key").is_none());
        assert!(cfg.get("ledger").is_none());
    }

    #[test]
    fn set_value_updates_number_and_string() {
        let mut cfg = Config::default();
        cfg.set_value("ledger.min_duration_secs", "30").unwrap();
        cfg.set_value("session.pattern", "4-7-8").unwrap();
        assert_eq!(cfg.ledger.min_duration_secs, 30);
        assert_eq!(cfg.pattern().cycle_secs(), 19);
    }

    #[test]
    fn set_value_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set_value("ledger.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set_value("", "1"), Err(ConfigError::UnknownKey(_))));
    }

    #[test]
    fn set_value_rejects_invalid_type() {
        let mut cfg = Config::default();
        assert!(cfg.set_value("ledger.min_xp", "lots").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn set_value_rejects_inconsistent_bounds() {
        let mut cfg = Config::default();
        let err = cfg.set_value("ledger.min_duration_secs", "1000").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ledger.min_duration_secs"));
        assert!(cfg.set_value("session.pattern", "4-0-4").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn load_from_writes_default_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());
    }

    #[test]
    fn load_from_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\npattern = \"nope\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
        std::fs::write(&path, "not = [toml").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn ledger_options_follow_config() {
        let mut cfg = Config::default();
        cfg.set_value("ledger.min_xp", "5").unwrap();
        let opts = cfg.ledger_options();
        assert_eq!(opts.min_xp, 5);
        assert_eq!(opts.seeds.len(), 3);
    }
}
