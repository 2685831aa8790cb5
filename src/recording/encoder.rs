//! H.264 encoding of RGB frames through openh264

use openh264::encoder::{BitRate, Encoder, EncoderConfig, FrameType};
use openh264::formats::YUVBuffer;
use openh264::OpenH264API;

use crate::errors::CaptureError;

/// H.264 encoder for a fixed frame size
pub struct H264Encoder {
    encoder: Encoder,
    width: u32,
    height: u32,
    bitrate: u32,
    frames: u64,
}

impl H264Encoder {
    /// Create an encoder for `width` x `height` RGB frames targeting `bitrate` bits per second.
    ///
    /// openh264 picks dimensions up from each YUV source.
    pub fn new(width: u32, height: u32, bitrate: u32) -> Result<Self, CaptureError> {
        if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
            return Err(CaptureError::EncoderPrepareFailed(format!(
                "frame size {}x{} must be even and non-zero",
                width, height
            )));
        }

        if bitrate == 0 {
            return Err(CaptureError::EncoderPrepareFailed("bitrate must be non-zero".to_string()));
        }

        let config = EncoderConfig::new().bitrate(BitRate::from_bps(bitrate));
        let encoder = Encoder::with_api_config(OpenH264API::from_source(), config).map_err(|e| {
            CaptureError::EncoderPrepareFailed(format!("Failed to create H.264 encoder: {}", e))
        })?;

        Ok(Self {
            encoder,
            width,
            height,
            bitrate,
            frames: 0,
        })
    }

    pub fn bitrate(&self) -> u32 {
        self.bitrate
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Encode one packed RGB24 frame into Annex B NAL units
    pub fn encode_rgb(&mut self, rgb: &[u8]) -> Result<EncodedFrame, CaptureError> {
        let expected = self.width as usize * self.height as usize * 3;
        if rgb.len() != expected {
            return Err(CaptureError::EncoderPrepareFailed(format!(
                "RGB frame has {} bytes, expected {}",
                rgb.len(),
                expected
            )));
        }

        let yuv = rgb_to_i420(rgb, self.width as usize, self.height as usize);
        let source = YUVBuffer::from_vec(yuv, self.width as usize, self.height as usize);

        let bitstream = self.encoder.encode(&source).map_err(|e| {
            CaptureError::EncoderPrepareFailed(format!("H.264 encoding failed: {}", e))
        })?;

        self.frames += 1;
        Ok(EncodedFrame {
            is_keyframe: matches!(bitstream.frame_type(), FrameType::IDR | FrameType::I),
            data: bitstream.to_vec(),
        })
    }
}

/// Output of encoding a single frame
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// Annex B data with start codes; may be empty when the encoder skips a frame
    pub data: Vec<u8>,
    pub is_keyframe: bool,
}

/// Nearest-neighbour resample of a packed RGB24 frame.
///
/// Webcams may only offer a size close to the one requested; frames are
/// brought to the clip size before encoding.
pub fn resize_rgb(rgb: &[u8], width: u32, height: u32, to_width: u32, to_height: u32) -> Vec<u8> {
    if (width, height) == (to_width, to_height) {
        return rgb.to_vec();
    }
    let (w, h) = (width as usize, height as usize);
    let (tw, th) = (to_width as usize, to_height as usize);
    let mut out = Vec::with_capacity(tw * th * 3);
    for row in 0..th {
        let src_row = (row * h / th.max(1)).min(h.saturating_sub(1));
        for col in 0..tw {
            let src_col = (col * w / tw.max(1)).min(w.saturating_sub(1));
            let at = (src_row * w + src_col) * 3;
            out.extend_from_slice(&rgb[at..at + 3]);
        }
    }
    out
}

/// Packed RGB24 to planar I420 (BT.601, studio swing).
///
/// Chroma is taken from the top-left pixel of each 2x2 block.
fn rgb_to_i420(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    let luma_len = width * height;
    let chroma_w = width / 2;
    let chroma_len = chroma_w * (height / 2);

    let mut out = vec![0u8; luma_len + 2 * chroma_len];
    let (luma, chroma) = out.split_at_mut(luma_len);
    let (cb, cr) = chroma.split_at_mut(chroma_len);

    for (row, line) in rgb.chunks_exact(width * 3).enumerate() {
        for (col, px) in line.chunks_exact(3).enumerate() {
            let (r, g, b) = (px[0] as i32, px[1] as i32, px[2] as i32);
            luma[row * width + col] = (((66 * r + 129 * g + 25 * b + 128) >> 8) + 16).clamp(0, 255) as u8;

            if row % 2 == 0 && col % 2 == 0 {
                let at = (row / 2) * chroma_w + col / 2;
                cb[at] = (((-38 * r - 74 * g + 112 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
                cr[at] = (((112 * r - 94 * g - 18 * b + 128) >> 8) + 128).clamp(0, 255) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i420_layout_size() {
        let rgb = vec![200u8; 64 * 48 * 3];
        assert_eq!(rgb_to_i420(&rgb, 64, 48).len(), 64 * 48 * 3 / 2);
    }

    #[test]
    fn test_black_maps_to_studio_black() {
        let rgb = vec![0u8; 4 * 2 * 3];
        let yuv = rgb_to_i420(&rgb, 4, 2);
        assert!(yuv[..8].iter().all(|&y| y == 16));
        assert!(yuv[8..].iter().all(|&c| c == 128));
    }

    #[test]
    fn test_resize_keeps_matching_frames() {
        let rgb: Vec<u8> = (0..4 * 2 * 3).map(|i| i as u8).collect();
        assert_eq!(resize_rgb(&rgb, 4, 2, 4, 2), rgb);
    }

    #[test]
    fn test_resize_downscales_by_sampling() {
        // 4x2 frame whose pixel value is its column index
        let rgb: Vec<u8> = (0..2).flat_map(|_| (0..4u8).flat_map(|c| [c, c, c])).collect();
        let half = resize_rgb(&rgb, 4, 2, 2, 2);
        assert_eq!(half.len(), 2 * 2 * 3);
        assert_eq!(&half[..6], &[0, 0, 0, 2, 2, 2]);

        let up = resize_rgb(&rgb, 4, 2, 8, 4);
        assert_eq!(up.len(), 8 * 4 * 3);
        assert_eq!(&up[..6], &[0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_rejects_zero_bitrate() {
        assert!(matches!(
            H264Encoder::new(320, 240, 0),
            Err(CaptureError::EncoderPrepareFailed(_))
        ));
    }

    #[test]
    fn test_rejects_odd_dimensions() {
        assert!(H264Encoder::new(641, 480, 1_000_000).is_err());
    }

    #[test]
    fn test_first_frame_is_keyframe() {
        let mut encoder = H264Encoder::new(320, 240, 2 * 1024 * 1024).unwrap();
        let encoded = encoder.encode_rgb(&vec![90u8; 320 * 240 * 3]).unwrap();
        assert!(encoded.is_keyframe);
        assert!(
            encoded.data.starts_with(&[0, 0, 0, 1]) || encoded.data.starts_with(&[0, 0, 1])
        );
        assert_eq!(encoder.frames(), 1);
    }
}
