//! Desktop backend: webcams through nokhwa, clips through openh264 + muxide
//!
//! The first webcam stands in for the back camera and the second for the
//! front one. The webcam is opened at the size closest to the negotiated
//! preview. Unlocking the camera hands its frame stream to the encoder,
//! which pumps frames into a [`ClipWriter`] sized and rate-controlled by the
//! negotiated profile on its own thread until stopped.
//!
//! muxide writes no track rotation, and webcams deliver upright frames, so
//! the profile's orientation hint is not applied on this backend.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{
        ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
        Resolution,
    },
    CallbackCamera,
};

use super::{CameraDevice, EncoderSetup, FrameSource, MediaBackend, RawFrame, VideoEncoder};
use crate::errors::CaptureError;
use crate::recording::{resize_rgb, ClipStats, ClipWriter};
use crate::types::{CameraCapabilities, CameraFacing, FrameSize};

const DEFAULT_FPS: f64 = 30.0;

/// Webcam handle shared between the preview owner and the encoder thread
struct SharedCamera(Mutex<CallbackCamera>);

// nokhwa's camera is only touched through the mutex.
unsafe impl Send for SharedCamera {}
unsafe impl Sync for SharedCamera {}

impl SharedCamera {
    fn with<T>(
        &self,
        f: impl FnOnce(&mut CallbackCamera) -> Result<T, CaptureError>,
    ) -> Result<T, CaptureError> {
        let mut camera = self
            .0
            .lock()
            .map_err(|_| CaptureError::CameraUnavailable("camera lock poisoned".to_string()))?;
        f(&mut camera)
    }
}

/// Name and index of a webcam visible to the desktop backend
#[derive(Debug, Clone, serde::Serialize)]
pub struct DesktopDevice {
    pub index: u32,
    pub name: String,
}

pub struct DesktopBackend {
    fps: f64,
}

impl DesktopBackend {
    pub fn new() -> Self {
        Self { fps: DEFAULT_FPS }
    }

    /// Frame rate written into the container
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    pub fn list_devices() -> Result<Vec<DesktopDevice>, CaptureError> {
        let cameras = query(ApiBackend::Auto).map_err(|e| {
            CaptureError::CameraUnavailable(format!("Failed to query cameras: {}", e))
        })?;
        Ok(cameras
            .into_iter()
            .map(|info| DesktopDevice {
                index: info.index().as_index().unwrap_or(0),
                name: info.human_name(),
            })
            .collect())
    }

    fn index_for(facing: CameraFacing) -> u32 {
        match facing {
            CameraFacing::Back => 0,
            CameraFacing::Front => 1,
        }
    }
}

impl Default for DesktopBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaBackend for DesktopBackend {
    fn name(&self) -> &str {
        "desktop"
    }

    fn open_camera(&mut self, facing: CameraFacing) -> Result<Box<dyn CameraDevice>, CaptureError> {
        let index = Self::index_for(facing);
        let available = Self::list_devices()?.len() as u32;
        if index >= available {
            return Err(CaptureError::CameraUnavailable(format!(
                "no {} camera: {} webcam(s) attached",
                facing, available
            )));
        }

        log::info!("Using webcam {} as {} camera", index, facing);
        Ok(Box::new(DesktopCamera {
            index,
            fps: self.fps,
            camera: None,
            facing,
            streaming: false,
        }))
    }

    fn create_encoder(&mut self) -> Result<Box<dyn VideoEncoder>, CaptureError> {
        Ok(Box::new(DesktopEncoder {
            fps: self.fps,
            source: None,
            setup: None,
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }))
    }
}

/// A webcam slot; the device itself is opened once the preview size is known
struct DesktopCamera {
    index: u32,
    fps: f64,
    camera: Option<Arc<SharedCamera>>,
    facing: CameraFacing,
    streaming: bool,
}

impl DesktopCamera {
    fn opened(&self) -> Result<&Arc<SharedCamera>, CaptureError> {
        self.camera.as_ref().ok_or_else(|| {
            CaptureError::CameraUnavailable("preview size was never configured".to_string())
        })
    }
}

impl CameraDevice for DesktopCamera {
    fn facing(&self) -> CameraFacing {
        self.facing
    }

    fn capabilities(&self) -> CameraCapabilities {
        // Common UVC modes; the driver picks the closest one it really has.
        let modes = vec![
            FrameSize::new(1920, 1080),
            FrameSize::new(1280, 720),
            FrameSize::new(960, 720),
            FrameSize::new(640, 480),
        ];
        CameraCapabilities::new(modes.clone())
            .with_video_sizes(modes.clone())
            .with_picture_sizes(modes)
    }

    fn configure_preview(&mut self, size: FrameSize, _display_orientation: u32) -> Result<(), CaptureError> {
        self.stop_preview();
        self.camera = None;

        let closest = CameraFormat::new(
            Resolution::new(size.width, size.height),
            FrameFormat::MJPEG,
            self.fps.round() as u32,
        );
        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(closest));
        let camera = CallbackCamera::new(CameraIndex::Index(self.index), requested, |_| {}).map_err(|e| {
            CaptureError::CameraUnavailable(format!("Failed to open webcam {}: {}", self.index, e))
        })?;

        log::debug!("Webcam {} opened near {}", self.index, size);
        self.camera = Some(Arc::new(SharedCamera(Mutex::new(camera))));
        Ok(())
    }

    fn start_preview(&mut self) -> Result<(), CaptureError> {
        if self.streaming {
            return Ok(());
        }
        self.opened()?.with(|cam| {
            cam.open_stream().map_err(|e| {
                CaptureError::CameraUnavailable(format!("Failed to start stream: {}", e))
            })
        })?;
        self.streaming = true;
        log::debug!("Webcam {} streaming", self.index);
        Ok(())
    }

    fn stop_preview(&mut self) {
        if !self.streaming {
            return;
        }
        self.streaming = false;
        let Some(camera) = &self.camera else {
            return;
        };
        let stopped = camera.with(|cam| {
            cam.stop_stream().map_err(|e| {
                CaptureError::CameraUnavailable(format!("Failed to stop stream: {}", e))
            })
        });
        if let Err(e) = stopped {
            log::warn!("{}", e);
        }
    }

    fn unlock(&mut self) -> Result<(), CaptureError> {
        if !self.streaming {
            return Err(CaptureError::CameraUnavailable(
                "stream must be running before recording".to_string(),
            ));
        }
        Ok(())
    }

    fn lock(&mut self) -> Result<(), CaptureError> {
        Ok(())
    }

    fn set_zoom(&mut self, _level: u32) -> Result<(), CaptureError> {
        Err(CaptureError::CameraUnavailable("webcams do not expose zoom".to_string()))
    }

    fn frame_source(&self) -> Option<Arc<dyn FrameSource>> {
        let camera = self.camera.as_ref()?;
        Some(Arc::new(WebcamFrames {
            camera: Arc::clone(camera),
        }))
    }

    fn release(&mut self) {
        self.stop_preview();
        self.camera = None;
    }
}

struct WebcamFrames {
    camera: Arc<SharedCamera>,
}

impl FrameSource for WebcamFrames {
    fn next_frame(&self) -> Result<RawFrame, CaptureError> {
        self.camera.with(|cam| {
            let buffer = cam.poll_frame().map_err(|e| {
                CaptureError::CameraUnavailable(format!("Failed to capture frame: {}", e))
            })?;
            let image = buffer.decode_image::<RgbFormat>().map_err(|e| {
                CaptureError::CameraUnavailable(format!("Failed to decode frame: {}", e))
            })?;
            Ok(RawFrame {
                width: image.width(),
                height: image.height(),
                data: image.into_raw(),
            })
        })
    }
}

struct DesktopEncoder {
    fps: f64,
    source: Option<Arc<dyn FrameSource>>,
    setup: Option<EncoderSetup>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<Result<ClipStats, CaptureError>>>,
}

impl VideoEncoder for DesktopEncoder {
    fn prepare(&mut self, camera: &dyn CameraDevice, setup: &EncoderSetup) -> Result<(), CaptureError> {
        let source = camera.frame_source().ok_or_else(|| {
            CaptureError::EncoderPrepareFailed("camera does not expose a frame stream".to_string())
        })?;
        self.source = Some(source);
        self.setup = Some(setup.clone());
        Ok(())
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        let (source, setup) = match (&self.source, &self.setup) {
            (Some(source), Some(setup)) => (Arc::clone(source), setup.clone()),
            _ => {
                return Err(CaptureError::EncoderPrepareFailed(
                    "start called before prepare".to_string(),
                ))
            }
        };

        self.stop.store(false, Ordering::Relaxed);
        let stop = Arc::clone(&self.stop);
        let fps = self.fps;

        let worker = std::thread::Builder::new()
            .name("crabclip-encoder".to_string())
            .spawn(move || pump_frames(source, setup, fps, stop))
            .map_err(|e| {
                CaptureError::EncoderPrepareFailed(format!("Failed to spawn encoder thread: {}", e))
            })?;
        self.worker = Some(worker);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), CaptureError> {
        self.stop.store(true, Ordering::Relaxed);
        let worker = self.worker.take().ok_or(CaptureError::EncoderStopRace)?;
        let stats = worker.join().map_err(|_| {
            CaptureError::EncoderPrepareFailed("encoder thread panicked".to_string())
        })??;
        log::info!(
            "Clip finalized: {} frames, {:.2}s, {} bytes",
            stats.frames,
            stats.duration_secs,
            stats.bytes_written
        );
        Ok(())
    }

    fn release(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        self.source = None;
        self.setup = None;
    }
}

fn pump_frames(
    source: Arc<dyn FrameSource>,
    setup: EncoderSetup,
    fps: f64,
    stop: Arc<AtomicBool>,
) -> Result<ClipStats, CaptureError> {
    let output: PathBuf = setup.output;
    let video = setup.profile.video;
    let fps = setup.profile.frame_rate.map(f64::from).unwrap_or(fps);
    let mut writer = ClipWriter::create(&output, video.width, video.height, fps, setup.profile.bitrate)?;
    let mut logged_mismatch = false;

    while !stop.load(Ordering::Relaxed) {
        let frame = source.next_frame()?;

        if (frame.width, frame.height) == (video.width, video.height) {
            writer.push_rgb(&frame.data, frame.width, frame.height)?;
            continue;
        }
        if !logged_mismatch {
            log::debug!(
                "Webcam delivers {}x{}, resampling to {}",
                frame.width,
                frame.height,
                video
            );
            logged_mismatch = true;
        }
        let scaled = resize_rgb(&frame.data, frame.width, frame.height, video.width, video.height);
        writer.push_rgb(&scaled, video.width, video.height)?;
    }

    writer.finish()
}
