//! Configuration management for crabclip
//!
//! Provides loading, saving and validation of the recording, camera and
//! storage settings consumed by the hold-to-record screen.

use crate::errors::CaptureError;
use crate::storage::FileNaming;
use crate::types::CameraFacing;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrabClipConfig {
    pub recording: RecordingSettings,
    pub camera: CameraSettings,
    pub storage: StorageSettings,
}

/// Timing and gesture thresholds for one hold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingSettings {
    /// Maximum clip duration in seconds
    pub max_duration_secs: u32,
    /// Interval of the progress timer in milliseconds
    pub tick_interval_ms: u64,
    /// Holds shorter than this many ticks are discarded
    pub min_hold_ticks: u32,
    /// Upward drag distance that arms cancel
    pub cancel_threshold: f32,
}

/// Camera selection and negotiation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub default_facing: CameraFacing,
    /// Zoom step applied by double tap
    pub zoom_level: u32,
    /// Height the size negotiator falls back to when no size matches 3:4
    pub reference_height: u32,
}

/// Output location configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub output_directory: String,
    /// Fixed file name; a fresh name is generated per clip when unset
    pub file_name: Option<String>,
    pub naming: FileNaming,
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self {
            max_duration_secs: 15,
            tick_interval_ms: 100,
            min_hold_ticks: 10,
            cancel_threshold: 10.0,
        }
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            default_facing: CameraFacing::Back,
            zoom_level: 20,
            reference_height: 720,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_directory: "./clips".to_string(),
            file_name: None,
            naming: FileNaming::Uuid,
        }
    }
}

impl Default for CrabClipConfig {
    fn default() -> Self {
        Self {
            recording: RecordingSettings::default(),
            camera: CameraSettings::default(),
            storage: StorageSettings::default(),
        }
    }
}

impl CrabClipConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| CaptureError::Config(format!("Failed to read config file: {}", e)))?;

        let config: CrabClipConfig = toml::from_str(&contents)
            .map_err(|e| CaptureError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate().map_err(CaptureError::Config)?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), CaptureError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                CaptureError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| CaptureError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| CaptureError::Config(format!("Failed to write config file: {}", e)))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    pub fn default_path() -> PathBuf {
        PathBuf::from("crabclip.toml")
    }

    /// Load from default location or fall back to defaults
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), String> {
        let rec = &self.recording;
        if rec.max_duration_secs == 0 || rec.max_duration_secs > 600 {
            return Err("Max duration must be between 1 and 600 seconds".to_string());
        }
        if rec.tick_interval_ms == 0 || rec.tick_interval_ms > 1000 {
            return Err("Tick interval must be between 1 and 1000 ms".to_string());
        }
        if rec.tick_interval_ms > rec.max_duration_secs as u64 * 1000 {
            return Err("Tick interval must not exceed the max duration".to_string());
        }
        if !(rec.cancel_threshold.is_finite() && rec.cancel_threshold >= 0.0) {
            return Err("Cancel threshold must be a non-negative number".to_string());
        }

        if self.camera.reference_height == 0 {
            return Err("Reference height must be positive".to_string());
        }

        if self.storage.output_directory.trim().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        if let Some(name) = &self.storage.file_name {
            if name.is_empty() || name.contains(['/', '\\']) {
                return Err("File name must be a plain, non-empty name".to_string());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CrabClipConfig::default();
        assert_eq!(config.recording.max_duration_secs, 15);
        assert_eq!(config.recording.tick_interval_ms, 100);
        assert_eq!(config.recording.min_hold_ticks, 10);
        assert_eq!(config.camera.default_facing, CameraFacing::Back);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut bad = CrabClipConfig::default();
        bad.recording.max_duration_secs = 0;
        assert!(bad.validate().is_err());

        let mut bad_name = CrabClipConfig::default();
        bad_name.storage.file_name = Some("../escape.mp4".to_string());
        assert!(bad_name.validate().is_err());

        let mut bad_threshold = CrabClipConfig::default();
        bad_threshold.recording.cancel_threshold = f32::NAN;
        assert!(bad_threshold.validate().is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("crabclip.toml");

        let mut config = CrabClipConfig::default();
        config.recording.max_duration_secs = 30;
        config.storage.naming = FileNaming::Timestamp;
        config.save_to_file(&config_path).unwrap();

        let loaded = CrabClipConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_config_toml_format() {
        let toml_string = toml::to_string_pretty(&CrabClipConfig::default()).unwrap();
        assert!(toml_string.contains("[recording]"));
        assert!(toml_string.contains("[camera]"));
        assert!(toml_string.contains("[storage]"));
        assert!(toml_string.contains("max_duration_secs"));
        assert!(toml_string.contains("default_facing = \"back\""));
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = CrabClipConfig::load_from_file("nonexistent_crabclip.toml");
        assert_eq!(result.unwrap().recording.max_duration_secs, 15);
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        let mut config = CrabClipConfig::default();
        config.recording.tick_interval_ms = 0;
        fs::write(&path, toml::to_string_pretty(&config).unwrap()).unwrap();
        assert!(matches!(
            CrabClipConfig::load_from_file(&path),
            Err(CaptureError::Config(_))
        ));
    }
}
