//! Recorder session controller
//!
//! Owns the camera and the encoder for the hold-to-record screen. The
//! controller moves between three stages:
//!
//! - `Closed`: no camera is open.
//! - `Previewing`: one camera is open and locked, preview running.
//! - `Recording`: the camera has been unlocked and moved into the active
//!   session together with the encoder.
//!
//! Ending a session moves the camera back out, locked, into `Previewing`.
//! Every handle sits inside a [`CameraGuard`] or [`EncoderGuard`], so any
//! early return or dropped stage releases it exactly once.

use std::mem;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::check_invariant;
use crate::config::CameraSettings;
use crate::errors::CaptureError;
use crate::negotiator::{Negotiator, DISPLAY_ORIENTATION};
use crate::platform::{CameraGuard, EncoderGuard, EncoderSetup, MediaBackend};
use crate::storage;
use crate::types::{CameraFacing, CaptureProfile};

struct Session {
    camera: CameraGuard,
    encoder: EncoderGuard,
    output: PathBuf,
    started_at: Instant,
}

enum Stage {
    Closed,
    Previewing(CameraGuard),
    Recording(Session),
}

/// Drives one camera and at most one encoding session at a time
pub struct RecorderController {
    backend: Box<dyn MediaBackend>,
    negotiator: Negotiator,
    zoom_level: u32,
    facing: CameraFacing,
    stage: Stage,
    profile: Option<CaptureProfile>,
    last_file: Option<PathBuf>,
    zoomed_in: bool,
}

impl RecorderController {
    pub fn new(backend: Box<dyn MediaBackend>, settings: &CameraSettings) -> Self {
        log::info!("Recorder controller using {} backend", backend.name());
        Self {
            backend,
            negotiator: Negotiator::default().with_reference_height(settings.reference_height),
            zoom_level: settings.zoom_level,
            facing: settings.default_facing,
            stage: Stage::Closed,
            profile: None,
            last_file: None,
            zoomed_in: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.stage, Stage::Recording(_))
    }

    pub fn is_camera_open(&self) -> bool {
        !matches!(self.stage, Stage::Closed)
    }

    pub fn facing(&self) -> CameraFacing {
        self.facing
    }

    /// Profile negotiated for the open camera
    pub fn profile(&self) -> Option<CaptureProfile> {
        self.profile
    }

    pub fn last_file(&self) -> Option<&Path> {
        self.last_file.as_deref()
    }

    /// File being written by the active session
    pub fn output_path(&self) -> Option<&Path> {
        match &self.stage {
            Stage::Recording(session) => Some(&session.output),
            _ => None,
        }
    }

    pub fn elapsed(&self) -> Duration {
        match &self.stage {
            Stage::Recording(session) => session.started_at.elapsed(),
            _ => Duration::ZERO,
        }
    }

    /// Open the camera for the current facing and start its preview
    pub fn open_preview(&mut self) -> Result<(), CaptureError> {
        if let Stage::Closed = self.stage {
            let camera = self.open_camera(self.facing)?;
            self.stage = Stage::Previewing(camera);
        }
        Ok(())
    }

    fn open_camera(&mut self, facing: CameraFacing) -> Result<CameraGuard, CaptureError> {
        check_invariant!(
            matches!(self.stage, Stage::Closed),
            "one camera handle at a time",
            "RecorderController::open_camera"
        );
        self.profile = None;
        self.zoomed_in = false;

        let mut camera = CameraGuard::new(self.backend.open_camera(facing)?);
        let profile = self.negotiator.negotiate(&camera.capabilities(), facing);
        camera.configure_preview(profile.preview, DISPLAY_ORIENTATION)?;
        camera.start_preview()?;

        log::info!(
            "Opened {} camera: preview {}, video {}",
            facing,
            profile.preview,
            profile.video
        );
        self.profile = Some(profile);
        Ok(camera)
    }

    /// Begin recording `facing` into `output`.
    ///
    /// Rejected while a session is active, before any camera is touched.
    /// Storage is checked before any encoder exists.
    pub fn start_session(&mut self, facing: CameraFacing, output: &Path) -> Result<(), CaptureError> {
        let current = match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Recording(session) => {
                self.stage = Stage::Recording(session);
                log::warn!("Ignoring start request: already recording");
                return Err(CaptureError::already_recording());
            }
            Stage::Previewing(camera) => Some(camera),
            Stage::Closed => None,
        };

        if let Err(e) = storage::ensure_writable(output) {
            if let Some(camera) = current {
                self.stage = Stage::Previewing(camera);
            }
            return Err(e);
        }

        let mut camera = match current {
            Some(camera) if camera.facing() == facing => camera,
            Some(camera) => {
                let previous = camera.facing();
                drop(camera);
                match self.open_camera(facing) {
                    Ok(camera) => camera,
                    Err(e) => {
                        log::warn!("Could not open {} camera: {}", facing, e);
                        self.reopen(previous);
                        return Err(e);
                    }
                }
            }
            None => self.open_camera(facing)?,
        };
        self.facing = facing;

        let profile = match self.profile {
            Some(profile) => profile,
            None => {
                let profile = self.negotiator.negotiate(&camera.capabilities(), facing);
                self.profile = Some(profile);
                profile
            }
        };

        match self.begin_encoding(&mut camera, profile, output) {
            Ok(encoder) => {
                check_invariant!(
                    camera.is_unlocked(),
                    "camera handed to encoder while recording",
                    "RecorderController::start_session"
                );
                log::info!("Recording {} camera to {}", facing, output.display());
                self.stage = Stage::Recording(Session {
                    camera,
                    encoder,
                    output: output.to_path_buf(),
                    started_at: Instant::now(),
                });
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to start recording: {}", e);
                self.reclaim_camera(camera);
                Err(e)
            }
        }
    }

    fn begin_encoding(
        &mut self,
        camera: &mut CameraGuard,
        profile: CaptureProfile,
        output: &Path,
    ) -> Result<EncoderGuard, CaptureError> {
        camera.unlock()?;

        let mut encoder = EncoderGuard::new(self.backend.create_encoder()?);
        let setup = EncoderSetup {
            profile,
            output: output.to_path_buf(),
        };
        let started = encoder
            .prepare(&**camera, &setup)
            .and_then(|()| encoder.start());
        if let Err(e) = started {
            storage::remove_if_exists(output);
            return Err(prepare_failure(e));
        }
        Ok(encoder)
    }

    fn take_session(&mut self) -> Option<Session> {
        match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Recording(session) => Some(session),
            other => {
                self.stage = other;
                None
            }
        }
    }

    /// Lock the camera back; a camera that refuses is released
    fn reclaim_camera(&mut self, mut camera: CameraGuard) {
        match camera.lock() {
            Ok(()) => self.stage = Stage::Previewing(camera),
            Err(e) => {
                log::error!("Camera could not be locked back, releasing it: {}", e);
                self.profile = None;
                drop(camera);
                self.stage = Stage::Closed;
            }
        }
    }

    /// Stop and keep the clip.
    ///
    /// Returns `Ok(None)` when nothing was recording, or when the encoder
    /// was stopped before producing data (the malformed file is deleted).
    pub fn stop_and_save(&mut self) -> Result<Option<PathBuf>, CaptureError> {
        let Some(session) = self.take_session() else {
            log::debug!("Stop requested while idle, nothing to save");
            return Ok(None);
        };

        let Session {
            camera,
            mut encoder,
            output,
            started_at,
        } = session;
        let stopped = encoder.stop();
        drop(encoder);
        self.reclaim_camera(camera);

        match stopped {
            Ok(()) => {
                log::info!(
                    "Saved {} ({:.1}s)",
                    output.display(),
                    started_at.elapsed().as_secs_f64()
                );
                self.last_file = Some(output.clone());
                Ok(Some(output))
            }
            Err(e) if e.is_benign() => {
                log::warn!("Encoder stopped before writing data, discarding {}", output.display());
                storage::remove_if_exists(&output);
                Ok(None)
            }
            Err(e) => {
                log::error!("Failed to finalize {}: {}", output.display(), e);
                storage::remove_if_exists(&output);
                Err(e)
            }
        }
    }

    /// Stop and delete the clip. Stop failures are ignored: the file is unwanted anyway.
    pub fn stop_and_discard(&mut self) {
        let Some(session) = self.take_session() else {
            log::debug!("Discard requested while idle");
            return;
        };

        let Session {
            camera,
            mut encoder,
            output,
            ..
        } = session;
        if let Err(e) = encoder.stop() {
            log::debug!("Encoder stop failed while discarding: {}", e);
        }
        drop(encoder);
        self.reclaim_camera(camera);

        storage::remove_if_exists(&output);
        log::info!("Discarded {}", output.display());
    }

    /// Swap to the other camera. Not allowed while recording.
    pub fn switch_camera(&mut self) -> Result<CameraFacing, CaptureError> {
        let target = self.facing.opposite();

        match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Recording(session) => {
                self.stage = Stage::Recording(session);
                Err(CaptureError::InvalidState(
                    "cannot switch cameras while recording".to_string(),
                ))
            }
            Stage::Closed => {
                self.facing = target;
                Ok(target)
            }
            Stage::Previewing(camera) => {
                let previous = camera.facing();
                drop(camera);

                match self.open_camera(target) {
                    Ok(camera) => {
                        self.facing = target;
                        self.stage = Stage::Previewing(camera);
                        Ok(target)
                    }
                    Err(e) => {
                        log::warn!("Could not open {} camera: {}", target, e);
                        self.reopen(previous);
                        Err(e)
                    }
                }
            }
        }
    }

    /// Bring back the camera that was previewing before a failed open
    fn reopen(&mut self, previous: CameraFacing) {
        match self.open_camera(previous) {
            Ok(camera) => self.stage = Stage::Previewing(camera),
            Err(e) => log::error!("Could not reopen {} camera: {}", previous, e),
        }
    }

    /// Take new camera settings between sessions.
    ///
    /// Returns false while recording. The reference height is used from the
    /// next negotiation on; an open preview is renegotiated right away. The
    /// default facing only moves a closed controller.
    pub fn apply_settings(&mut self, settings: &CameraSettings) -> bool {
        if self.is_recording() {
            log::warn!("Camera settings not applied: recording in progress");
            return false;
        }

        self.negotiator = Negotiator::default().with_reference_height(settings.reference_height);
        self.zoom_level = settings.zoom_level;

        match mem::replace(&mut self.stage, Stage::Closed) {
            Stage::Previewing(camera) => {
                let facing = camera.facing();
                drop(camera);
                self.reopen(facing);
            }
            other => {
                self.stage = other;
                self.facing = settings.default_facing;
            }
        }
        log::debug!(
            "Camera settings applied: zoom {}, reference height {}",
            settings.zoom_level,
            settings.reference_height
        );
        true
    }

    /// Remove the last saved clip; true if a file was deleted
    pub fn delete_last_file(&mut self) -> bool {
        match self.last_file.take() {
            Some(path) => storage::remove_if_exists(&path),
            None => false,
        }
    }

    /// Double-tap zoom: alternate between the configured step and no zoom.
    ///
    /// Returns the zoom level now applied; 0 on cameras without zoom.
    pub fn toggle_zoom(&mut self) -> Result<u32, CaptureError> {
        let wanted = if self.zoomed_in { 0 } else { self.zoom_level };

        let camera = match &mut self.stage {
            Stage::Previewing(camera) => camera,
            Stage::Recording(session) => &mut session.camera,
            Stage::Closed => {
                return Err(CaptureError::CameraUnavailable("no camera is open".to_string()))
            }
        };

        let caps = camera.capabilities();
        if !caps.zoom_supported() {
            return Ok(0);
        }
        let level = wanted.min(caps.max_zoom);
        camera.set_zoom(level)?;
        self.zoomed_in = level > 0;
        Ok(level)
    }

    /// Release everything; an active session is discarded
    pub fn close(&mut self) {
        if self.is_recording() {
            self.stop_and_discard();
        }
        if let Stage::Previewing(camera) = mem::replace(&mut self.stage, Stage::Closed) {
            drop(camera);
            log::debug!("Camera closed");
        }
        self.profile = None;
        self.zoomed_in = false;
    }
}

impl Drop for RecorderController {
    fn drop(&mut self) {
        self.close();
    }
}

fn prepare_failure(e: CaptureError) -> CaptureError {
    match e {
        CaptureError::EncoderPrepareFailed(_)
        | CaptureError::CameraUnavailable(_)
        | CaptureError::StorageUnwritable(_) => e,
        other => CaptureError::EncoderPrepareFailed(other.to_string()),
    }
}
