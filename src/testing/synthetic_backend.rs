//! Synthetic camera and encoder
//!
//! Capabilities mirror a typical mid-range phone: a 12 MP back camera with
//! separate video sizes and zoom, and a 2 MP front camera that records at
//! preview sizes. The encoder writes a small placeholder file so output
//! contracts can be checked on disk.
//!
//! [`SyntheticTally`] counts every open, release, lock and unlock so tests
//! can assert handle discipline. [`SyntheticFaults`] injects the failures a
//! real device produces.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::errors::CaptureError;
use crate::platform::{CameraDevice, EncoderSetup, MediaBackend, VideoEncoder};
use crate::types::{CameraCapabilities, CameraFacing, FrameSize};

const HEADER: &[u8] = b"\0\0\0\x18ftypmp42synthetic";
const PAYLOAD: &[u8] = b"\0\0\0\x10mdatsynthetic";

fn guard<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Default)]
struct TallyState {
    cameras_open: usize,
    max_cameras_open: usize,
    camera_opens: usize,
    camera_releases: usize,
    unlocks: usize,
    locks: usize,
    previews_started: usize,
    preview_size: Option<FrameSize>,
    zoom: u32,
    encoders_live: usize,
    encoder_releases: usize,
    encoders_started: usize,
    prepared_files: usize,
    last_setup: Option<EncoderSetup>,
}

/// Read-only view of what the synthetic backend has done
#[derive(Debug, Clone, Default)]
pub struct SyntheticTally {
    state: Arc<Mutex<TallyState>>,
}

impl SyntheticTally {
    pub fn cameras_open(&self) -> usize {
        guard(&self.state).cameras_open
    }

    /// Highest number of simultaneously open cameras ever observed
    pub fn max_cameras_open(&self) -> usize {
        guard(&self.state).max_cameras_open
    }

    pub fn camera_opens(&self) -> usize {
        guard(&self.state).camera_opens
    }

    pub fn camera_releases(&self) -> usize {
        guard(&self.state).camera_releases
    }

    pub fn unlocks(&self) -> usize {
        guard(&self.state).unlocks
    }

    pub fn locks(&self) -> usize {
        guard(&self.state).locks
    }

    pub fn previews_started(&self) -> usize {
        guard(&self.state).previews_started
    }

    pub fn preview_size(&self) -> Option<FrameSize> {
        guard(&self.state).preview_size
    }

    pub fn zoom(&self) -> u32 {
        guard(&self.state).zoom
    }

    pub fn encoders_live(&self) -> usize {
        guard(&self.state).encoders_live
    }

    pub fn encoder_releases(&self) -> usize {
        guard(&self.state).encoder_releases
    }

    pub fn encoders_started(&self) -> usize {
        guard(&self.state).encoders_started
    }

    /// Output files created by `prepare`, including ones whose prepare failed
    pub fn prepared_files(&self) -> usize {
        guard(&self.state).prepared_files
    }

    pub fn last_setup(&self) -> Option<EncoderSetup> {
        guard(&self.state).last_setup.clone()
    }
}

#[derive(Debug, Default)]
struct FaultState {
    missing: Vec<CameraFacing>,
    fail_prepare: bool,
    fail_start: bool,
    stop_race: bool,
    fail_lock: bool,
}

/// Switches for injecting device failures, shareable after the backend moves
#[derive(Debug, Clone, Default)]
pub struct SyntheticFaults {
    state: Arc<Mutex<FaultState>>,
}

impl SyntheticFaults {
    /// Make opening the camera with this facing fail
    pub fn remove_camera(&self, facing: CameraFacing) {
        let mut s = guard(&self.state);
        if !s.missing.contains(&facing) {
            s.missing.push(facing);
        }
    }

    pub fn restore_camera(&self, facing: CameraFacing) {
        guard(&self.state).missing.retain(|f| *f != facing);
    }

    pub fn set_fail_prepare(&self, on: bool) {
        guard(&self.state).fail_prepare = on;
    }

    pub fn set_fail_start(&self, on: bool) {
        guard(&self.state).fail_start = on;
    }

    /// Make the next stops behave like a stop issued right after start
    pub fn set_stop_race(&self, on: bool) {
        guard(&self.state).stop_race = on;
    }

    pub fn set_fail_lock(&self, on: bool) {
        guard(&self.state).fail_lock = on;
    }
}

/// In-memory media backend
pub struct SyntheticBackend {
    tally: SyntheticTally,
    faults: SyntheticFaults,
    capabilities: HashMap<CameraFacing, CameraCapabilities>,
}

impl SyntheticBackend {
    pub fn new() -> Self {
        let mut capabilities = HashMap::new();
        capabilities.insert(
            CameraFacing::Back,
            CameraCapabilities::new(vec![
                FrameSize::new(1920, 1080),
                FrameSize::new(1280, 720),
                FrameSize::new(1280, 960),
                FrameSize::new(640, 480),
            ])
            .with_video_sizes(vec![
                FrameSize::new(1920, 1080),
                FrameSize::new(1280, 960),
                FrameSize::new(640, 480),
            ])
            .with_picture_sizes(vec![FrameSize::new(4000, 3000), FrameSize::new(1920, 1080)])
            .with_max_zoom(30),
        );
        capabilities.insert(
            CameraFacing::Front,
            CameraCapabilities::new(vec![FrameSize::new(1280, 720), FrameSize::new(640, 480)])
                .with_picture_sizes(vec![FrameSize::new(1600, 1200)]),
        );

        Self {
            tally: SyntheticTally::default(),
            faults: SyntheticFaults::default(),
            capabilities,
        }
    }

    pub fn with_capabilities(mut self, facing: CameraFacing, caps: CameraCapabilities) -> Self {
        self.capabilities.insert(facing, caps);
        self
    }

    pub fn tally(&self) -> SyntheticTally {
        self.tally.clone()
    }

    pub fn faults(&self) -> SyntheticFaults {
        self.faults.clone()
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for SyntheticBackend {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn open_camera(&mut self, facing: CameraFacing) -> Result<Box<dyn CameraDevice>, CaptureError> {
        if guard(&self.faults.state).missing.contains(&facing) {
            return Err(CaptureError::CameraUnavailable(format!(
                "no {} camera on this device",
                facing
            )));
        }

        {
            let mut s = guard(&self.tally.state);
            if s.cameras_open > 0 {
                return Err(CaptureError::CameraUnavailable(
                    "camera is held by another client".to_string(),
                ));
            }
            s.cameras_open += 1;
            s.camera_opens += 1;
            s.max_cameras_open = s.max_cameras_open.max(s.cameras_open);
        }

        Ok(Box::new(SyntheticCamera {
            facing,
            caps: self.capabilities.get(&facing).cloned().unwrap_or_default(),
            tally: self.tally.clone(),
            faults: self.faults.clone(),
            released: false,
        }))
    }

    fn create_encoder(&mut self) -> Result<Box<dyn VideoEncoder>, CaptureError> {
        guard(&self.tally.state).encoders_live += 1;
        Ok(Box::new(SyntheticEncoder {
            tally: self.tally.clone(),
            faults: self.faults.clone(),
            output: None,
            started: false,
            released: false,
        }))
    }
}

struct SyntheticCamera {
    facing: CameraFacing,
    caps: CameraCapabilities,
    tally: SyntheticTally,
    faults: SyntheticFaults,
    released: bool,
}

impl CameraDevice for SyntheticCamera {
    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn capabilities(&self) -> CameraCapabilities {
        self.caps.clone()
    }

    fn configure_preview(&mut self, size: FrameSize, _display_orientation: u32) -> Result<(), CaptureError> {
        if !self.caps.preview_sizes.is_empty() && !self.caps.preview_sizes.contains(&size) {
            return Err(CaptureError::CameraUnavailable(format!(
                "preview size {} not supported",
                size
            )));
        }
        guard(&self.tally.state).preview_size = Some(size);
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CaptureError> {
        guard(&self.tally.state).previews_started += 1;
        Ok(())
    }

    fn stop_preview(&mut self) {}

    fn unlock(&mut self) -> Result<(), CaptureError> {
        guard(&self.tally.state).unlocks += 1;
        Ok(())
    }

    fn lock(&mut self) -> Result<(), CaptureError> {
        if guard(&self.faults.state).fail_lock {
            return Err(CaptureError::CameraUnavailable(
                "camera could not be reclaimed from the encoder".to_string(),
            ));
        }
        guard(&self.tally.state).locks += 1;
        Ok(())
    }

    fn set_zoom(&mut self, level: u32) -> Result<(), CaptureError> {
        if !self.caps.zoom_supported() {
            return Err(CaptureError::CameraUnavailable("zoom not supported".to_string()));
        }
        guard(&self.tally.state).zoom = level.min(self.caps.max_zoom);
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut s = guard(&self.tally.state);
        s.cameras_open = s.cameras_open.saturating_sub(1);
        s.camera_releases += 1;
    }
}

struct SyntheticEncoder {
    tally: SyntheticTally,
    faults: SyntheticFaults,
    output: Option<PathBuf>,
    started: bool,
    released: bool,
}

impl VideoEncoder for SyntheticEncoder {
    fn prepare(&mut self, _camera: &dyn CameraDevice, setup: &EncoderSetup) -> Result<(), CaptureError> {
        // Like MediaRecorder, the output exists once prepare has run
        File::create(&setup.output)?;
        guard(&self.tally.state).prepared_files += 1;
        if guard(&self.faults.state).fail_prepare {
            return Err(CaptureError::EncoderPrepareFailed(
                "unsupported encoder profile".to_string(),
            ));
        }
        self.output = Some(setup.output.clone());
        guard(&self.tally.state).last_setup = Some(setup.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        let output = self.output.as_ref().ok_or_else(|| {
            CaptureError::EncoderPrepareFailed("start called before prepare".to_string())
        })?;
        if guard(&self.faults.state).fail_start {
            return Err(CaptureError::EncoderPrepareFailed("encoder refused to start".to_string()));
        }
        let mut file = File::create(output)?;
        file.write_all(HEADER)?;
        self.started = true;
        guard(&self.tally.state).encoders_started += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        if !self.started || guard(&self.faults.state).stop_race {
            self.started = false;
            return Err(CaptureError::EncoderStopRace);
        }
        self.started = false;
        if let Some(output) = &self.output {
            let mut file = OpenOptions::new().append(true).open(output)?;
            file.write_all(PAYLOAD)?;
        }
        Ok(())
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        let mut s = guard(&self.tally.state);
        s.encoders_live = s.encoders_live.saturating_sub(1);
        s.encoder_releases += 1;
    }
}
