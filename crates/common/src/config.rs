//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ZenError, ZenResult};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory where session logs are stored.
    pub session_dir: PathBuf,

    /// Posture monitor settings.
    #[serde(default)]
    pub monitor: MonitorDefaults,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default posture monitor parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorDefaults {
    /// Keypoints scoring below this confidence count as missing.
    pub min_keypoint_confidence: f64,

    /// Smoothed scores below this raise a low-posture alert.
    pub alert_threshold: u8,

    /// Minimum seconds between two low-posture alerts.
    pub alert_cooldown_secs: u64,

    /// Smoothed scores below this raise an exercise reminder.
    pub reminder_threshold: u8,

    /// Minimum seconds between two exercise reminders.
    pub reminder_cooldown_secs: u64,

    /// Master switch for both alert classes.
    pub notifications_enabled: bool,

    /// Period of the detection tick (milliseconds).
    pub detection_interval_ms: u64,

    /// Period at which the smoothed score is written to the session log.
    pub publish_interval_secs: u64,

    /// Period at which the reminder class is evaluated.
    pub reminder_interval_secs: u64,

    /// Optional path to exported posture model weights.
    pub model_path: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "zenposture=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_dir: default_session_dir(),
            monitor: MonitorDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for MonitorDefaults {
    fn default() -> Self {
        Self {
            min_keypoint_confidence: 0.5,
            alert_threshold: 70,
            alert_cooldown_secs: 5,
            reminder_threshold: 70,
            reminder_cooldown_secs: 60,
            notifications_enabled: true,
            detection_interval_ms: 100,
            publish_interval_secs: 5,
            reminder_interval_secs: 60,
            model_path: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl MonitorDefaults {
    /// Reject settings the monitor cannot run with.
    pub fn validate(&self) -> ZenResult<()> {
        if !(0.0..=1.0).contains(&self.min_keypoint_confidence) {
            return Err(ZenError::config(format!(
                "min_keypoint_confidence must be within [0, 1], got {}",
                self.min_keypoint_confidence
            )));
        }
        if self.alert_threshold > 100 || self.reminder_threshold > 100 {
            return Err(ZenError::config("alert thresholds must be within [0, 100]"));
        }
        if self.detection_interval_ms == 0 {
            return Err(ZenError::config("detection_interval_ms must be > 0"));
        }
        if self.publish_interval_secs == 0 || self.reminder_interval_secs == 0 {
            return Err(ZenError::config("schedule intervals must be > 0"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match std::fs::read_to_string(&config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path. Unlike [`AppConfig::load`], errors are returned.
    pub fn load_from(path: &Path) -> ZenResult<Self> {
        if !path.exists() {
            return Err(ZenError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.monitor.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<PathBuf, std::io::Error> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("zenposture").join("config.json")
}

/// Default session log directory.
fn default_session_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("zenposture").join("sessions")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let defaults = MonitorDefaults::default();
        assert!(defaults.validate().is_ok());
        assert_eq!(defaults.alert_threshold, 70);
        assert_eq!(defaults.alert_cooldown_secs, 5);
        assert_eq!(defaults.reminder_cooldown_secs, 60);
    }

    #[test]
    fn test_partial_monitor_section_fills_defaults() {
        let raw = r#"{
            "session_dir": "/tmp/zen",
            "monitor": { "alert_threshold": 60 }
        }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.monitor.alert_threshold, 60);
        assert_eq!(config.monitor.detection_interval_ms, 100);
        assert!(config.monitor.notifications_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_rejects_out_of_range_confidence() {
        let settings = MonitorDefaults {
            min_keypoint_confidence: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ZenError::Config { .. })
        ));
    }

    #[test]
    fn test_save_and_load_from_roundtrip() {
        let dir = std::env::temp_dir().join("zenposture_test_config");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.monitor.alert_cooldown_secs = 12;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded.monitor, config.monitor);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_load_from_missing_file() {
        let path = std::env::temp_dir().join("zenposture_no_such_config.json");
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ZenError::FileNotFound { .. }));
    }
}
