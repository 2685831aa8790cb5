use crate::config::CrabClipConfig;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tauri::command;

lazy_static::lazy_static! {
    static ref GLOBAL_CONFIG: Arc<RwLock<CrabClipConfig>> = Arc::new(RwLock::new(CrabClipConfig::load_or_default()));
    static ref CONFIG_PATH: RwLock<PathBuf> = RwLock::new(CrabClipConfig::default_path());
}

/// File that `update_recorder_config` persists to
pub fn config_path() -> PathBuf {
    match CONFIG_PATH.read() {
        Ok(path) => path.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Persist configuration updates to `path` instead of `crabclip.toml` in the working directory
pub fn set_config_path(path: impl Into<PathBuf>) {
    let path = path.into();
    log::debug!("Config updates will be saved to {:?}", path);
    match CONFIG_PATH.write() {
        Ok(mut slot) => *slot = path,
        Err(poisoned) => *poisoned.into_inner() = path,
    }
}

/// Configuration the plugin was initialized with, or last updated to
pub fn current_config() -> CrabClipConfig {
    match GLOBAL_CONFIG.read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Get the current configuration
#[command]
pub async fn get_recorder_config() -> Result<CrabClipConfig, String> {
    let config = GLOBAL_CONFIG.read().map_err(|e| e.to_string())?;
    Ok(config.clone())
}

/// Update configuration.
///
/// The file and the stored copy are always updated. Returns whether the
/// running recorder picked the settings up; it refuses while a clip is in
/// progress.
#[command]
pub async fn update_recorder_config(new_config: CrabClipConfig) -> Result<bool, String> {
    // Validate first
    new_config.validate()?;

    {
        let mut config = GLOBAL_CONFIG.write().map_err(|e| e.to_string())?;
        *config = new_config.clone();
    }

    new_config
        .save_to_file(config_path())
        .map_err(|e| e.to_string())?;

    Ok(super::recording::apply_recorder_config(&new_config).await)
}
