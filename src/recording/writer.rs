//! MP4 clip writer: H.264 encoder feeding a muxide muxer

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use muxide::api::{Metadata, Muxer, MuxerBuilder, VideoCodec};
use serde::{Deserialize, Serialize};

use super::encoder::H264Encoder;
use crate::errors::CaptureError;

/// Summary of a finished clip
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipStats {
    pub frames: u64,
    /// Frames the encoder produced no data for
    pub skipped: u64,
    pub duration_secs: f64,
    pub bytes_written: u64,
    pub path: PathBuf,
}

/// Writes constant-rate RGB frames into an MP4 file
pub struct ClipWriter {
    encoder: H264Encoder,
    muxer: Muxer<BufWriter<File>>,
    width: u32,
    height: u32,
    frame_secs: f64,
    frames: u64,
    skipped: u64,
    path: PathBuf,
}

impl ClipWriter {
    pub fn create<P: AsRef<Path>>(
        path: P,
        width: u32,
        height: u32,
        fps: f64,
        bitrate: u32,
    ) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        if !(fps > 0.0) {
            return Err(CaptureError::EncoderPrepareFailed(format!("invalid frame rate {}", fps)));
        }

        let encoder = H264Encoder::new(width, height, bitrate)?;

        let file = File::create(&path).map_err(|e| {
            CaptureError::StorageUnwritable(format!("Failed to create {}: {}", path.display(), e))
        })?;

        let muxer = MuxerBuilder::new(BufWriter::new(file))
            .video(VideoCodec::H264, width, height, fps)
            .with_fast_start(true)
            .with_metadata(Metadata::new().with_current_time())
            .build()
            .map_err(|e| CaptureError::EncoderPrepareFailed(format!("Failed to create muxer: {}", e)))?;

        Ok(Self {
            encoder,
            muxer,
            width,
            height,
            frame_secs: 1.0 / fps,
            frames: 0,
            skipped: 0,
            path,
        })
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Encode and mux one RGB24 frame
    pub fn push_rgb(&mut self, rgb: &[u8], width: u32, height: u32) -> Result<(), CaptureError> {
        if width != self.width || height != self.height {
            return Err(CaptureError::EncoderPrepareFailed(format!(
                "frame {}x{} does not match clip size {}x{}",
                width, height, self.width, self.height
            )));
        }

        let encoded = self.encoder.encode_rgb(rgb)?;
        if encoded.data.is_empty() {
            self.skipped += 1;
            return Ok(());
        }

        let pts = self.frames as f64 * self.frame_secs;
        self.muxer
            .write_video(pts, &encoded.data, encoded.is_keyframe)
            .map_err(|e| CaptureError::EncoderPrepareFailed(format!("Failed to mux frame: {}", e)))?;
        self.frames += 1;
        Ok(())
    }

    /// Finalize the file. A clip without frames is a stop race.
    pub fn finish(self) -> Result<ClipStats, CaptureError> {
        if self.frames == 0 {
            return Err(CaptureError::EncoderStopRace);
        }

        let stats = self
            .muxer
            .finish_with_stats()
            .map_err(|e| CaptureError::EncoderPrepareFailed(format!("Failed to finalize clip: {}", e)))?;

        Ok(ClipStats {
            frames: stats.video_frames,
            skipped: self.skipped,
            duration_secs: stats.duration_secs,
            bytes_written: stats.bytes_written,
            path: self.path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_writes_clip() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("clip.mp4");
        let mut writer = ClipWriter::create(&output, 320, 240, 15.0, 3 * 1024 * 1024).unwrap();

        for shade in 0..15u8 {
            writer.push_rgb(&vec![shade * 10; 320 * 240 * 3], 320, 240).unwrap();
        }
        let stats = writer.finish().unwrap();

        assert_eq!(stats.frames, 15);
        assert!(stats.bytes_written > 0);
        assert!(std::fs::metadata(&output).unwrap().len() > 0);
    }

    #[test]
    fn test_empty_clip_is_stop_race() {
        let dir = tempdir().unwrap();
        let writer = ClipWriter::create(dir.path().join("empty.mp4"), 320, 240, 30.0, 1_000_000).unwrap();
        assert!(matches!(writer.finish(), Err(CaptureError::EncoderStopRace)));
    }

    #[test]
    fn test_rejects_mismatched_frame() {
        let dir = tempdir().unwrap();
        let mut writer = ClipWriter::create(dir.path().join("bad.mp4"), 320, 240, 30.0, 1_000_000).unwrap();
        assert!(writer.push_rgb(&vec![0u8; 160 * 120 * 3], 160, 120).is_err());
    }
}
