//! Core value types shared by the negotiator, the controller and the backends

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which way a camera points relative to the screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraFacing {
    Back,
    Front,
}

impl CameraFacing {
    /// The camera on the other side of the device
    pub fn opposite(self) -> Self {
        match self {
            CameraFacing::Back => CameraFacing::Front,
            CameraFacing::Front => CameraFacing::Back,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CameraFacing::Back => "back",
            CameraFacing::Front => "front",
        }
    }
}

impl Default for CameraFacing {
    fn default() -> Self {
        CameraFacing::Back
    }
}

impl fmt::Display for CameraFacing {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CameraFacing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "back" | "rear" => Ok(CameraFacing::Back),
            "front" | "selfie" => Ok(CameraFacing::Front),
            other => Err(format!("unknown camera facing: {}", other)),
        }
    }
}

/// A frame size reported by a camera (preview, video or still)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Height over width; zero-width sizes report an infinite ratio
    pub fn ratio(&self) -> f64 {
        if self.width == 0 {
            return f64::INFINITY;
        }
        self.height as f64 / self.width as f64
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Video codec used by the encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoCodec {
    H264,
}

/// Everything a camera reports about what it can produce
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CameraCapabilities {
    pub preview_sizes: Vec<FrameSize>,
    /// Empty when the device records at preview sizes only
    pub video_sizes: Vec<FrameSize>,
    pub picture_sizes: Vec<FrameSize>,
    /// Highest zoom step; zero means zoom is unsupported
    pub max_zoom: u32,
}

impl CameraCapabilities {
    pub fn new(preview_sizes: Vec<FrameSize>) -> Self {
        Self {
            preview_sizes,
            ..Default::default()
        }
    }

    pub fn with_video_sizes(mut self, sizes: Vec<FrameSize>) -> Self {
        self.video_sizes = sizes;
        self
    }

    pub fn with_picture_sizes(mut self, sizes: Vec<FrameSize>) -> Self {
        self.picture_sizes = sizes;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u32) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Largest still-image resolution in pixels, zero if none are reported
    pub fn max_picture_pixels(&self) -> u64 {
        self.picture_sizes
            .iter()
            .map(FrameSize::pixels)
            .max()
            .unwrap_or(0)
    }

    pub fn zoom_supported(&self) -> bool {
        self.max_zoom > 0
    }
}

/// Resolved capture configuration for one camera open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub preview: FrameSize,
    pub video: FrameSize,
    /// Target bitrate in bits per second
    pub bitrate: u32,
    pub codec: VideoCodec,
    /// Rotation written into the output container, in degrees
    pub orientation_hint: u32,
    /// Always `None`: the platform default frame rate is used
    pub frame_rate: Option<u32>,
}
