//! CrabClip: press-and-hold video clip recording for Tauri applications
//!
//! This crate holds the core of a "hold to record" screen: the camera and
//! encoder session controller, capture parameter negotiation, the touch
//! gesture state machine and the progress ring. Platform access goes through
//! the [`platform::MediaBackend`] trait.
//!
//! # Features
//! - `recording`: openh264 + muxide MP4 clip writer
//! - `desktop`: webcam backend on nokhwa (implies `recording`)
//! - `plugin`: Tauri plugin with the recorder commands
//!
//! # Usage
//! Add this to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! crabclip = { version = "0.3", features = ["plugin", "desktop"] }
//! tauri = { version = "2.0", features = ["protocol-asset"] }
//! ```
//!
//! Then in your Tauri app:
//! ```rust,ignore
//! fn main() {
//!     tauri::Builder::default()
//!         .plugin(crabclip::init())
//!         .run(tauri::generate_context!())
//!         .expect("error while running tauri application");
//! }
//! ```
pub mod config;
pub mod controller;
pub mod errors;
pub mod gesture;
pub mod invariants;
pub mod negotiator;
pub mod platform;
pub mod progress;
pub mod storage;
pub mod types;

#[cfg(feature = "plugin")]
pub mod commands;

#[cfg(feature = "recording")]
pub mod recording;

// Testing utilities - in-memory backend for offline testing
pub mod testing;

// Re-exports for convenience
pub use config::CrabClipConfig;
pub use controller::RecorderController;
pub use errors::CaptureError;
pub use gesture::{HoldRecorder, HoldState, TickOutcome, TouchEvent, TouchOutcome};
pub use negotiator::Negotiator;
pub use platform::{CameraDevice, MediaBackend, VideoEncoder};
pub use progress::ProgressRing;
pub use types::{CameraCapabilities, CameraFacing, CaptureProfile, FrameSize};

#[cfg(feature = "desktop")]
pub use platform::desktop::DesktopBackend;

#[cfg(feature = "plugin")]
use tauri::{
    plugin::{Builder, TauriPlugin},
    Runtime,
};

/// Initialize the CrabClip plugin on the webcam backend
#[cfg(all(feature = "plugin", feature = "desktop"))]
pub fn init<R: Runtime>() -> TauriPlugin<R> {
    init_with_backend(Box::new(DesktopBackend::new()))
}

/// Initialize the CrabClip plugin with all commands on a custom backend
#[cfg(feature = "plugin")]
pub fn init_with_backend<R: Runtime>(backend: Box<dyn MediaBackend>) -> TauriPlugin<R> {
    let config = commands::config::current_config();
    if let Err(e) = commands::recording::install_backend(backend, &config) {
        log::error!("Failed to install recorder: {}", e);
    }

    Builder::new("crabclip")
        .invoke_handler(tauri::generate_handler![
            // Preview surface
            commands::recording::open_camera_preview,
            commands::recording::close_camera,
            // Record button
            commands::recording::press_record,
            commands::recording::drag_record,
            commands::recording::release_record,
            commands::recording::tick_record,
            // Camera controls
            commands::recording::switch_camera,
            commands::recording::toggle_zoom,
            // Review panel
            commands::recording::confirm_clip,
            commands::recording::discard_clip,
            // Status
            commands::recording::get_capture_profile,
            commands::recording::is_recording,
            commands::recording::get_recorder_status,
            // Configuration commands
            commands::config::get_recorder_config,
            commands::config::update_recorder_config,
        ])
        .build()
}

/// Initialize logging for the recorder
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "crabclip=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        backends: available_backends(),
    }
}

/// Backends compiled into this build
pub fn available_backends() -> Vec<String> {
    let mut backends = vec!["synthetic".to_string()];
    if cfg!(feature = "desktop") {
        backends.push("desktop".to_string());
    }
    backends
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub backends: Vec<String>,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "crabclip");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_synthetic_backend_always_available() {
        assert!(available_backends().contains(&"synthetic".to_string()));
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging();
        init_logging();
    }
}
