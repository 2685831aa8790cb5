//! Hold-to-record state machine
//!
//! Turns the record button's touch stream and the progress timer into
//! controller calls:
//!
//! | state       | event          | effect                                   |
//! |-------------|----------------|------------------------------------------|
//! | `Idle`      | `Press`        | start a session, go to `Holding`         |
//! | `Holding`   | `Drag(dy)`     | arm cancel while `-dy > threshold`        |
//! | `Holding`   | `Release`      | cancel, too short, or save to `Reviewing` |
//! | `Holding`   | tick at max    | save, go to `Completed`                  |
//! | `Completed` | `Release`      | go to `Reviewing`                        |
//! | `Reviewing` | confirm/retake | keep or delete the clip, back to `Idle`  |
//!
//! Drag offsets are in screen coordinates, so moving up is negative.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::{CrabClipConfig, RecordingSettings, StorageSettings};
use crate::controller::RecorderController;
use crate::errors::CaptureError;
use crate::progress::{ProgressRing, ProgressSnapshot};
use crate::storage::OutputTarget;
use crate::types::CameraFacing;

/// One touch event on the record button
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TouchEvent {
    Press,
    /// Vertical offset from the press point, negative is upward
    Drag(f32),
    Release,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TouchOutcome {
    Started { output: PathBuf },
    Dragged { cancel_armed: bool },
    Saved { path: PathBuf },
    /// Released before the minimum hold; nothing was kept
    TooShort,
    Cancelled,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TickOutcome {
    Progress { progress: ProgressSnapshot },
    /// Max duration reached; the clip was saved while the button is still held
    Completed {
        path: PathBuf,
        progress: ProgressSnapshot,
    },
    /// Nothing is recording; the timer should stop
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoldState {
    Idle,
    Holding { cancel_armed: bool },
    Completed { path: PathBuf },
    Reviewing { path: PathBuf },
}

/// Hint shown above the record button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prompt {
    HoldToRecord,
    SwipeUpToCancel,
    ReleaseToCancel,
    Review,
}

pub struct HoldRecorder {
    controller: RecorderController,
    settings: RecordingSettings,
    storage: StorageSettings,
    ring: ProgressRing,
    state: HoldState,
}

impl HoldRecorder {
    pub fn new(controller: RecorderController, config: &CrabClipConfig) -> Self {
        let settings = config.recording.clone();
        let ring = ProgressRing::from_settings(settings.max_duration_secs, settings.tick_interval_ms);
        Self {
            controller,
            settings,
            storage: config.storage.clone(),
            ring,
            state: HoldState::Idle,
        }
    }

    pub fn controller(&self) -> &RecorderController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut RecorderController {
        &mut self.controller
    }

    pub fn state(&self) -> &HoldState {
        &self.state
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.ring.snapshot()
    }

    /// Polled by the progress timer to decide whether to keep ticking
    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    pub fn prompt(&self) -> Prompt {
        match self.state {
            HoldState::Idle => Prompt::HoldToRecord,
            HoldState::Holding { cancel_armed: false } => Prompt::SwipeUpToCancel,
            HoldState::Holding { cancel_armed: true } => Prompt::ReleaseToCancel,
            HoldState::Completed { .. } | HoldState::Reviewing { .. } => Prompt::Review,
        }
    }

    /// Replace settings between clips; ignored while a hold is in progress
    pub fn apply_config(&mut self, config: &CrabClipConfig) -> bool {
        if !matches!(self.state, HoldState::Idle) || !self.controller.apply_settings(&config.camera) {
            return false;
        }
        self.settings = config.recording.clone();
        self.storage = config.storage.clone();
        self.ring = ProgressRing::from_settings(
            self.settings.max_duration_secs,
            self.settings.tick_interval_ms,
        );
        true
    }

    fn next_target(&self) -> OutputTarget {
        match &self.storage.file_name {
            Some(name) => OutputTarget::new(&self.storage.output_directory, name.clone()),
            None => OutputTarget::generate(&self.storage.output_directory, self.storage.naming),
        }
    }

    pub fn handle(&mut self, event: TouchEvent) -> Result<TouchOutcome, CaptureError> {
        match event {
            TouchEvent::Press => self.press(),
            TouchEvent::Drag(delta_y) => Ok(self.drag(delta_y)),
            TouchEvent::Release => self.release(),
        }
    }

    fn press(&mut self) -> Result<TouchOutcome, CaptureError> {
        if !matches!(self.state, HoldState::Idle) {
            return Ok(TouchOutcome::Ignored);
        }

        let output = self.next_target().path();
        self.controller
            .start_session(self.controller.facing(), &output)?;

        self.ring.reset();
        self.state = HoldState::Holding {
            cancel_armed: false,
        };
        Ok(TouchOutcome::Started { output })
    }

    fn drag(&mut self, delta_y: f32) -> TouchOutcome {
        match &mut self.state {
            HoldState::Holding { cancel_armed } => {
                *cancel_armed = -delta_y > self.settings.cancel_threshold;
                TouchOutcome::Dragged {
                    cancel_armed: *cancel_armed,
                }
            }
            _ => TouchOutcome::Ignored,
        }
    }

    fn release(&mut self) -> Result<TouchOutcome, CaptureError> {
        let state = std::mem::replace(&mut self.state, HoldState::Idle);
        let ticks = self.ring.ticks();
        self.ring.reset();

        match state {
            HoldState::Holding { .. } if !self.controller.is_recording() => {
                Ok(TouchOutcome::Ignored)
            }
            HoldState::Holding { cancel_armed: true } => {
                self.controller.stop_and_discard();
                Ok(TouchOutcome::Cancelled)
            }
            HoldState::Holding { cancel_armed: false } if ticks < self.settings.min_hold_ticks => {
                log::info!("Hold too short ({} ticks), discarding", ticks);
                self.controller.stop_and_discard();
                Ok(TouchOutcome::TooShort)
            }
            HoldState::Holding { cancel_armed: false } => match self.controller.stop_and_save()? {
                Some(path) => {
                    self.state = HoldState::Reviewing { path: path.clone() };
                    Ok(TouchOutcome::Saved { path })
                }
                None => Ok(TouchOutcome::TooShort),
            },
            HoldState::Completed { path } => {
                self.state = HoldState::Reviewing { path: path.clone() };
                Ok(TouchOutcome::Saved { path })
            }
            other => {
                self.state = other;
                Ok(TouchOutcome::Ignored)
            }
        }
    }

    /// Advance the ring by one timer tick
    pub fn tick(&mut self) -> Result<TickOutcome, CaptureError> {
        if !matches!(self.state, HoldState::Holding { .. }) || !self.controller.is_recording() {
            return Ok(TickOutcome::Stopped);
        }

        if !self.ring.tick() {
            return Ok(TickOutcome::Progress {
                progress: self.ring.snapshot(),
            });
        }

        log::info!("Max clip duration reached");
        let progress = self.ring.snapshot();
        match self.controller.stop_and_save() {
            Ok(Some(path)) => {
                self.state = HoldState::Completed { path: path.clone() };
                Ok(TickOutcome::Completed { path, progress })
            }
            Ok(None) => {
                self.state = HoldState::Idle;
                Ok(TickOutcome::Stopped)
            }
            Err(e) => {
                self.state = HoldState::Idle;
                Err(e)
            }
        }
    }

    /// Accept the reviewed clip
    pub fn confirm(&mut self) -> Option<PathBuf> {
        match std::mem::replace(&mut self.state, HoldState::Idle) {
            HoldState::Reviewing { path } => Some(path),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Reject the reviewed clip and delete it
    pub fn retake(&mut self) -> bool {
        if !matches!(self.state, HoldState::Reviewing { .. }) {
            return false;
        }
        self.state = HoldState::Idle;
        self.controller.delete_last_file()
    }

    pub fn switch_camera(&mut self) -> Result<CameraFacing, CaptureError> {
        self.controller.switch_camera()
    }

    pub fn toggle_zoom(&mut self) -> Result<u32, CaptureError> {
        self.controller.toggle_zoom()
    }

    pub fn open_preview(&mut self) -> Result<(), CaptureError> {
        self.controller.open_preview()
    }

    /// Screen torn down: any hold in progress is discarded
    pub fn close(&mut self) {
        self.controller.close();
        self.ring.reset();
        if matches!(self.state, HoldState::Holding { .. }) {
            self.state = HoldState::Idle;
        }
    }
}
