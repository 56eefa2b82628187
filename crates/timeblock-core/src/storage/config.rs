//! User preferences, kept as TOML at `config.toml` under the data
//! directory. Covers the out-of-box session length plus the notification
//! and leaderboard display switches.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

use super::data_dir;

/// Countdown configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Session length used when no checkpoint exists, in minutes.
    #[serde(default = "default_minutes")]
    pub default_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardConfig {
    /// Number of rows shown by the leaderboard commands.
    #[serde(default = "default_leaderboard_size")]
    pub size: u32,
}

/// Everything the user can tune, one TOML table per area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

fn default_minutes() -> u32 {
    25
}
fn default_true() -> bool {
    true
}
fn default_leaderboard_size() -> u32 {
    10
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_minutes: default_minutes(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            size: default_leaderboard_size(),
        }
    }
}

impl Config {
    /// Default session length in seconds, for a fresh engine.
    pub fn default_total_secs(&self) -> u32 {
        self.timer.default_minutes.max(1).saturating_mul(60)
    }

    /// Walk a dot-separated key through the JSON form of the config.
    fn value_at<'a>(root: &'a serde_json::Value, key: &str) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }
        key.split('.')
            .try_fold(root, |node, segment| node.get(segment))
    }

    /// Replace the leaf named by `key`, coercing `value` to the type the
    /// field already holds.
    fn assign_at(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let (parents, leaf) = match key.rsplit_once('.') {
            Some(split) => split,
            None if key.is_empty() => return Err(unknown()),
            None => ("", key),
        };

        let mut node = root;
        if !parents.is_empty() {
            for segment in parents.split('.') {
                node = node.get_mut(segment).ok_or_else(unknown)?;
            }
        }
        let table = node.as_object_mut().ok_or_else(unknown)?;
        let slot = table.get(leaf).ok_or_else(unknown)?;

        let replacement = match slot {
            serde_json::Value::Bool(_) => {
                let flag: bool = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as bool"),
                })?;
                serde_json::Value::Bool(flag)
            }
            serde_json::Value::Number(_) => {
                let number: u64 = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{value}' as number"),
                })?;
                serde_json::Value::Number(number.into())
            }
            _ => serde_json::Value::String(value.to_string()),
        };
        table.insert(leaf.to_string(), replacement);
        Ok(())
    }

    fn file_path() -> std::io::Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk; a missing file is written out with the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        let Ok(content) = std::fs::read_to_string(&path) else {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        };
        toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Write the TOML file.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::file_path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Read one value by dot-separated key, rendered as a string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let value = Self::value_at(&json, key)?;
        Some(match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Change one value by dot-separated key and persist. Unknown keys,
    /// values the field cannot hold and out-of-range settings are all
    /// rejected before anything is written.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut tree =
            serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::assign_at(&mut tree, key, value)?;
        let updated: Config =
            serde_json::from_value(tree).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        self.save()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=120).contains(&self.timer.default_minutes) {
            return Err(ConfigError::InvalidValue {
                key: "timer.default_minutes".to_string(),
                message: "must be between 1 and 120".to_string(),
            });
        }
        if self.leaderboard.size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "leaderboard.size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Load, falling back to the defaults if the file is unreadable.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }
}
