//! Software recording pipeline used by the desktop backend
//!
//! - openh264 for H.264 encoding
//! - muxide for MP4 muxing
//!
//! # Example
//! ```rust,ignore
//! use crabclip::recording::ClipWriter;
//!
//! let mut writer = ClipWriter::create("clip.mp4", 640, 480, 30.0, 2 * 1024 * 1024)?;
//! writer.push_rgb(&rgb, 640, 480)?;
//! let stats = writer.finish()?;
//! ```

mod encoder;
mod writer;

pub use encoder::{resize_rgb, EncodedFrame, H264Encoder};
pub use writer::{ClipStats, ClipWriter};
