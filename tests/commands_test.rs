//! Tauri command layer driven end to end on the synthetic backend
//!
//! The recorder behind the commands is process-wide, so the whole flow runs
//! in a single test.

use crabclip::commands::recording::*;
use crabclip::commands::{get_recorder_config, set_config_path, update_recorder_config};
use crabclip::config::CrabClipConfig;
use crabclip::gesture::{TickOutcome, TouchOutcome};
use crabclip::testing::SyntheticBackend;
use crabclip::types::{CameraFacing, FrameSize};
use std::path::PathBuf;
use tempfile::tempdir;

#[tokio::test]
async fn test_hold_to_record_through_commands() {
    // Nothing is installed yet
    assert!(is_recording().await.is_err());

    let dir = tempdir().unwrap();
    let config_file = dir.path().join("settings").join("crabclip.toml");
    set_config_path(&config_file);
    let mut config = CrabClipConfig::default();
    config.storage.output_directory = dir.path().to_string_lossy().to_string();
    let backend = SyntheticBackend::new();
    let tally = backend.tally();
    install_backend(Box::new(backend), &config).unwrap();

    let profile = open_camera_preview().await.unwrap().unwrap();
    assert_eq!(profile.preview, FrameSize::new(1280, 960));
    assert_eq!(get_capture_profile().await.unwrap(), Some(profile));

    assert_eq!(toggle_zoom().await.unwrap(), 20);
    assert_eq!(toggle_zoom().await.unwrap(), 0);

    // Short hold
    assert!(matches!(press_record().await.unwrap(), TouchOutcome::Started { .. }));
    assert!(is_recording().await.unwrap());
    for _ in 0..3 {
        tick_record().await.unwrap();
    }
    assert_eq!(release_record().await.unwrap(), TouchOutcome::TooShort);
    assert!(!is_recording().await.unwrap());

    // Cancelled hold
    press_record().await.unwrap();
    assert_eq!(
        drag_record(-25.0).await.unwrap(),
        TouchOutcome::Dragged { cancel_armed: true }
    );
    assert_eq!(release_record().await.unwrap(), TouchOutcome::Cancelled);

    // Kept hold, then confirmed
    let output = match press_record().await.unwrap() {
        TouchOutcome::Started { output } => output,
        other => panic!("unexpected {:?}", other),
    };
    assert!(switch_camera().await.is_err());
    for _ in 0..20 {
        assert!(matches!(tick_record().await.unwrap(), TickOutcome::Progress { .. }));
    }
    assert_eq!(
        release_record().await.unwrap(),
        TouchOutcome::Saved { path: output.clone() }
    );
    let status = get_recorder_status().await.unwrap();
    assert_eq!(status.reviewing, Some(output.clone()));
    let confirmed = confirm_clip().await.unwrap().map(PathBuf::from);
    assert_eq!(confirmed, Some(output.clone()));
    assert!(output.exists());

    // Kept hold, then discarded
    press_record().await.unwrap();
    for _ in 0..15 {
        tick_record().await.unwrap();
    }
    release_record().await.unwrap();
    assert!(discard_clip().await.unwrap());
    assert_eq!(tick_record().await.unwrap(), TickOutcome::Stopped);

    // Settings taken between clips reach the open camera
    let mut update = config.clone();
    update.camera.zoom_level = 5;
    assert!(update_recorder_config(update.clone()).await.unwrap());
    assert_eq!(get_recorder_config().await.unwrap().camera.zoom_level, 5);
    assert_eq!(CrabClipConfig::load_from_file(&config_file).unwrap().camera.zoom_level, 5);
    assert_eq!(toggle_zoom().await.unwrap(), 5);
    assert_eq!(toggle_zoom().await.unwrap(), 0);

    // ...but not while a clip is being held
    press_record().await.unwrap();
    update.camera.zoom_level = 7;
    assert!(!update_recorder_config(update).await.unwrap());
    assert_eq!(toggle_zoom().await.unwrap(), 5);
    drag_record(-25.0).await.unwrap();
    assert_eq!(release_record().await.unwrap(), TouchOutcome::Cancelled);

    assert_eq!(switch_camera().await.unwrap(), CameraFacing::Front);
    close_camera().await.unwrap();
    assert_eq!(tally.cameras_open(), 0);
    assert_eq!(tally.encoders_live(), 0);

    // Invalid settings never reach the recorder
    let mut bad = get_recorder_config().await.unwrap();
    bad.recording.max_duration_secs = 0;
    assert!(update_recorder_config(bad).await.is_err());
}
