use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String, // "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_true")]
    pub file_logging_enabled: bool,
    #[serde(default = "default_true")]
    pub console_logging_enabled: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_prefix")]
    pub file_name_prefix: String,
    #[serde(default = "default_true")]
    pub show_file_line: bool,
    #[serde(default = "default_false")]
    pub show_thread_ids: bool,
    #[serde(default = "default_true")]
    pub show_target: bool,
    #[serde(default = "default_true")]
    pub ansi_colors: bool,
    #[serde(default = "default_rotation")]
    pub rotation: String, // "daily", "hourly", "minutely", "never"
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            file_logging_enabled: default_true(),
            console_logging_enabled: default_true(),
            log_dir: default_log_dir(),
            file_name_prefix: default_prefix(),
            show_file_line: default_true(),
            show_thread_ids: default_false(),
            show_target: default_true(),
            ansi_colors: default_true(),
            rotation: default_rotation(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_dir() -> String {
    "logs".to_string()
}
fn default_prefix() -> String {
    "audiolock".to_string()
}
fn default_rotation() -> String {
    "daily".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path of the loop played and panned with head yaw.
    #[serde(default = "default_audio_file")]
    pub audio_file: String,
    #[serde(default = "default_volume")]
    pub volume: f32,

    /// Game-rotation sample period in milliseconds. Must be one of the
    /// periods the firmware accepts (10/20/40/80).
    #[serde(default = "default_sample_period_ms")]
    pub sample_period_ms: u64,

    // Gesture streams requested from the device
    #[serde(default = "default_true")]
    pub enable_single_tap: bool,
    #[serde(default = "default_true")]
    pub enable_double_tap: bool,
    #[serde(default = "default_true")]
    pub enable_head_nod: bool,
    #[serde(default = "default_true")]
    pub enable_head_shake: bool,

    /// Reopen the session automatically after a clean close.
    #[serde(default = "default_false")]
    pub auto_reopen: bool,

    #[serde(default)]
    pub log_settings: LogSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            audio_file: default_audio_file(),
            volume: default_volume(),
            sample_period_ms: default_sample_period_ms(),
            enable_single_tap: true,
            enable_double_tap: true,
            enable_head_nod: true,
            enable_head_shake: true,
            auto_reopen: false,
            log_settings: LogSettings::default(),
        }
    }
}

fn default_audio_file() -> String {
    "assets/crowd.mp3".to_string()
}
fn default_volume() -> f32 {
    1.0
}
fn default_sample_period_ms() -> u64 {
    20
}

pub struct SettingsService {
    settings: Settings,
    settings_path: PathBuf,
}

impl SettingsService {
    pub fn new() -> anyhow::Result<Self> {
        let settings_path = Self::get_settings_path()?;
        let settings = Self::load_from_file(&settings_path).unwrap_or_default();

        Ok(Self {
            settings,
            settings_path,
        })
    }

    fn get_settings_path() -> anyhow::Result<PathBuf> {
        let mut path = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        path.push("AudioLock");
        fs::create_dir_all(&path)?;
        path.push("settings.json");
        Ok(path)
    }

    fn load_from_file(path: &PathBuf) -> anyhow::Result<Settings> {
        let contents = fs::read_to_string(path)?;
        let settings = serde_json::from_str(&contents)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(&self.settings)?;
        fs::write(&self.settings_path, json)?;
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// In-memory service for tests; saving goes to a scratch file.
    #[cfg(test)]
    pub fn for_tests(settings: Settings) -> Self {
        Self {
            settings,
            settings_path: std::env::temp_dir().join("audiolock-test-settings.json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::SamplePeriod;

    #[test]
    fn default_sample_period_is_a_firmware_rate() {
        let settings = Settings::default();
        assert!(SamplePeriod::from_millis(settings.sample_period_ms).is_some());
    }

    #[test]
    fn settings_survive_a_json_round_trip() {
        let mut settings = Settings::default();
        settings.volume = 0.5;
        settings.enable_head_shake = false;
        settings.sample_period_ms = 40;

        let json = serde_json::to_string(&settings).unwrap();
        let back: Settings = serde_json::from_str(&json).unwrap();
        assert_eq!(back.volume, 0.5);
        assert!(!back.enable_head_shake);
        assert_eq!(back.sample_period_ms, 40);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let back: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(back.sample_period_ms, 20);
        assert_eq!(back.volume, 1.0);
        assert!(back.enable_double_tap);
        assert_eq!(back.log_settings.level, "info");
    }
}
