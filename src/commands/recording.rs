//! Tauri commands for the hold-to-record screen
//!
//! The frontend forwards the record button's touch stream here and polls
//! `tick_record` from its progress timer while `is_recording` is true.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tauri::command;
use tokio::sync::Mutex as AsyncMutex;

use crate::config::CrabClipConfig;
use crate::controller::RecorderController;
use crate::errors::CaptureError;
use crate::gesture::{HoldRecorder, HoldState, Prompt, TickOutcome, TouchEvent, TouchOutcome};
use crate::platform::MediaBackend;
use crate::progress::ProgressSnapshot;
use crate::types::{CameraFacing, CaptureProfile};

lazy_static::lazy_static! {
    static ref RECORDER: Arc<AsyncMutex<Option<HoldRecorder>>> = Arc::new(AsyncMutex::new(None));
}

/// Snapshot of the recorder for redrawing the screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecorderStatus {
    pub recording: bool,
    pub camera_open: bool,
    pub facing: CameraFacing,
    pub prompt: Prompt,
    pub progress: ProgressSnapshot,
    pub reviewing: Option<PathBuf>,
}

/// Install a recorder built on `backend`, replacing any previous one.
///
/// Called while the plugin is being built, before any command can run.
pub fn install_backend(backend: Box<dyn MediaBackend>, config: &CrabClipConfig) -> Result<(), String> {
    let controller = RecorderController::new(backend, &config.camera);
    let recorder = HoldRecorder::new(controller, config);
    let mut slot = RECORDER
        .try_lock()
        .map_err(|_| "Recorder is busy; cannot install a backend now".to_string())?;
    *slot = Some(recorder);
    Ok(())
}

/// Push new settings into the installed recorder. Returns false while a
/// clip is in progress or no recorder is installed.
pub(crate) async fn apply_recorder_config(config: &CrabClipConfig) -> bool {
    let mut slot = RECORDER.lock().await;
    match slot.as_mut() {
        Some(recorder) => recorder.apply_config(config),
        None => false,
    }
}

async fn with_recorder<T>(
    f: impl FnOnce(&mut HoldRecorder) -> Result<T, CaptureError>,
) -> Result<T, String> {
    let mut slot = RECORDER.lock().await;
    let recorder = slot
        .as_mut()
        .ok_or_else(|| "Recorder not initialized".to_string())?;
    f(recorder).map_err(|e| e.to_string())
}

/// Open the camera behind the preview surface and return the negotiated profile
#[command]
pub async fn open_camera_preview() -> Result<Option<CaptureProfile>, String> {
    with_recorder(|rec| {
        rec.open_preview()?;
        Ok(rec.controller().profile())
    })
    .await
}

/// Preview surface destroyed: discard any hold in progress and release the camera
#[command]
pub async fn close_camera() -> Result<(), String> {
    with_recorder(|rec| {
        rec.close();
        Ok(())
    })
    .await
}

#[command]
pub async fn press_record() -> Result<TouchOutcome, String> {
    with_recorder(|rec| rec.handle(TouchEvent::Press)).await
}

/// `delta_y` is the vertical offset from the press point in screen pixels
#[command]
pub async fn drag_record(delta_y: f32) -> Result<TouchOutcome, String> {
    with_recorder(|rec| rec.handle(TouchEvent::Drag(delta_y))).await
}

#[command]
pub async fn release_record() -> Result<TouchOutcome, String> {
    with_recorder(|rec| rec.handle(TouchEvent::Release)).await
}

/// Advance the progress ring; the frontend stops its timer on `stopped`
#[command]
pub async fn tick_record() -> Result<TickOutcome, String> {
    with_recorder(|rec| rec.tick()).await
}

#[command]
pub async fn switch_camera() -> Result<CameraFacing, String> {
    with_recorder(|rec| rec.switch_camera()).await
}

/// Double tap on the preview. Returns the zoom step now applied.
#[command]
pub async fn toggle_zoom() -> Result<u32, String> {
    with_recorder(|rec| rec.toggle_zoom()).await
}

/// Keep the reviewed clip and hand its path to the caller
#[command]
pub async fn confirm_clip() -> Result<Option<String>, String> {
    with_recorder(|rec| Ok(rec.confirm().map(|p| p.to_string_lossy().to_string()))).await
}

/// Throw the reviewed clip away. Returns whether a file was deleted.
#[command]
pub async fn discard_clip() -> Result<bool, String> {
    with_recorder(|rec| Ok(rec.retake())).await
}

#[command]
pub async fn get_capture_profile() -> Result<Option<CaptureProfile>, String> {
    with_recorder(|rec| Ok(rec.controller().profile())).await
}

#[command]
pub async fn is_recording() -> Result<bool, String> {
    with_recorder(|rec| Ok(rec.is_recording())).await
}

#[command]
pub async fn get_recorder_status() -> Result<RecorderStatus, String> {
    with_recorder(|rec| {
        let reviewing = match rec.state() {
            HoldState::Reviewing { path } | HoldState::Completed { path } => Some(path.clone()),
            _ => None,
        };
        Ok(RecorderStatus {
            recording: rec.is_recording(),
            camera_open: rec.controller().is_camera_open(),
            facing: rec.controller().facing(),
            prompt: rec.prompt(),
            progress: rec.progress(),
            reviewing,
        })
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        let status = RecorderStatus {
            recording: false,
            camera_open: true,
            facing: CameraFacing::Front,
            prompt: Prompt::HoldToRecord,
            progress: crate::progress::ProgressRing::from_settings(15, 100).snapshot(),
            reviewing: None,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"facing\":\"front\""));
        assert!(json.contains("\"prompt\":\"hold_to_record\""));
    }
}
