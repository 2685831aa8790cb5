//! Seams between the recorder core and the host's camera and encoder APIs
//!
//! A host implements [`MediaBackend`] to hand out cameras and encoders. The
//! controller never touches these handles directly; it wraps them in the
//! scoped guards from [`guard`] so every handle is released exactly once.

pub mod guard;

#[cfg(feature = "desktop")]
pub mod desktop;

use std::path::PathBuf;
use std::sync::Arc;

use crate::errors::CaptureError;
use crate::types::{CameraCapabilities, CameraFacing, CaptureProfile, FrameSize};

pub use guard::{CameraGuard, EncoderGuard};

/// Raw RGB24 frame pulled from a camera stream
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Source of frames an encoder can pull from while the camera is unlocked
pub trait FrameSource: Send + Sync {
    fn next_frame(&self) -> Result<RawFrame, CaptureError>;
}

/// An opened camera
pub trait CameraDevice: Send {
    fn facing(&self) -> CameraFacing;

    fn capabilities(&self) -> CameraCapabilities;

    fn configure_preview(&mut self, size: FrameSize, display_orientation: u32)
        -> Result<(), CaptureError>;

    fn start_preview(&mut self) -> Result<(), CaptureError>;

    fn stop_preview(&mut self);

    /// Hand the camera to the encoder
    fn unlock(&mut self) -> Result<(), CaptureError>;

    /// Take the camera back from the encoder
    fn lock(&mut self) -> Result<(), CaptureError>;

    fn set_zoom(&mut self, level: u32) -> Result<(), CaptureError>;

    /// Frames for encoders that pull from the camera themselves
    fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        None
    }

    /// Give the device back to the system. Called once, by [`CameraGuard`].
    fn release(&mut self);
}

/// Everything the encoder needs for one session
#[derive(Debug, Clone)]
pub struct EncoderSetup {
    pub profile: CaptureProfile,
    pub output: PathBuf,
}

/// A hardware or software video encoder writing one file
pub trait VideoEncoder: Send {
    fn prepare(&mut self, camera: &dyn CameraDevice, setup: &EncoderSetup)
        -> Result<(), CaptureError>;

    fn start(&mut self) -> Result<(), CaptureError>;

    /// Returns [`CaptureError::EncoderStopRace`] when stopped before any data was written
    fn stop(&mut self) -> Result<(), CaptureError>;

    /// Reset and free the encoder. Called once, by [`EncoderGuard`].
    fn release(&mut self);
}

/// Factory for cameras and encoders on one platform
pub trait MediaBackend: Send {
    fn name(&self) -> &str;

    fn open_camera(&mut self, facing: CameraFacing) -> Result<Box<dyn CameraDevice>, CaptureError>;

    fn create_encoder(&mut self) -> Result<Box<dyn VideoEncoder>, CaptureError>;
}
