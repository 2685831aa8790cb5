//! Capture parameter negotiation
//!
//! Picks preview and recording sizes from the lists a camera reports, and
//! derives the encoder bitrate from the camera's best still resolution.
//!
//! Size selection works on a copy of the candidates sorted by descending
//! width. Sizes whose height/width ratio lies within [`RATIO_TOLERANCE`] of
//! the target are preferred, closest ratio first. When none qualifies the
//! candidate whose height is closest to the reference height wins. In both
//! passes the first minimal candidate is kept, so wider sizes win ties.

use crate::types::{CameraCapabilities, CameraFacing, CaptureProfile, FrameSize, VideoCodec};

/// Target height/width ratio (portrait 3:4)
pub const TARGET_RATIO: f64 = 3.0 / 4.0;

/// Maximum ratio distance for a size to count as matching the target
pub const RATIO_TOLERANCE: f64 = 0.1;

/// Used when the camera reports no preview sizes at all
pub const FALLBACK_PREVIEW: FrameSize = FrameSize::new(640, 360);

/// Rotation applied to the on-screen preview
pub const DISPLAY_ORIENTATION: u32 = 90;

const MIB: u32 = 1024 * 1024;

/// Selection parameters for one camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Negotiator {
    pub target_ratio: f64,
    pub tolerance: f64,
    /// Height that the fallback pass tries to approach
    pub reference_height: u32,
}

impl Default for Negotiator {
    fn default() -> Self {
        Self {
            target_ratio: TARGET_RATIO,
            tolerance: RATIO_TOLERANCE,
            reference_height: 720,
        }
    }
}

impl Negotiator {
    pub fn with_reference_height(mut self, reference_height: u32) -> Self {
        self.reference_height = reference_height;
        self
    }

    fn ratio_distance(&self, size: &FrameSize) -> f64 {
        (size.ratio() - self.target_ratio).abs()
    }

    /// True when `size` lies within tolerance of the target ratio
    pub fn matches_ratio(&self, size: &FrameSize) -> bool {
        self.ratio_distance(size) <= self.tolerance
    }

    /// Pick one size out of `candidates`; `None` only for an empty list
    pub fn select_size(&self, candidates: &[FrameSize]) -> Option<FrameSize> {
        let mut sorted = candidates.to_vec();
        // Stable sort keeps device order among equal widths.
        sorted.sort_by(|a, b| b.width.cmp(&a.width));

        let by_ratio = first_min_by(
            sorted.iter().filter(|s| self.matches_ratio(s)),
            |s| self.ratio_distance(s),
        );
        if by_ratio.is_some() {
            return by_ratio;
        }

        let reference = self.reference_height as f64;
        first_min_by(sorted.iter(), |s| (s.height as f64 - reference).abs())
    }

    /// Preview size, falling back to [`FALLBACK_PREVIEW`] for an empty list
    pub fn preview_size(&self, caps: &CameraCapabilities) -> FrameSize {
        self.select_size(&caps.preview_sizes)
            .unwrap_or(FALLBACK_PREVIEW)
    }

    /// Recording size; devices without a separate video list record at the preview size
    pub fn video_size(&self, caps: &CameraCapabilities, preview: FrameSize) -> FrameSize {
        if caps.video_sizes.is_empty() {
            return preview;
        }
        self.select_size(&caps.video_sizes).unwrap_or(preview)
    }

    /// Build the full profile for a freshly opened camera
    pub fn negotiate(&self, caps: &CameraCapabilities, facing: CameraFacing) -> CaptureProfile {
        let preview = self.preview_size(caps);
        let video = self.video_size(caps, preview);
        let bitrate = bitrate_for_picture_pixels(caps.max_picture_pixels());

        log::debug!(
            "Negotiated {} camera profile: preview {}, video {}, {} bps",
            facing,
            preview,
            video,
            bitrate
        );

        CaptureProfile {
            preview,
            video,
            bitrate,
            codec: VideoCodec::H264,
            orientation_hint: orientation_hint(facing),
            frame_rate: None,
        }
    }
}

/// Walks `items` keeping the first element whose key is strictly smaller than all before it
fn first_min_by<'a, I, F>(items: I, key: F) -> Option<FrameSize>
where
    I: Iterator<Item = &'a FrameSize>,
    F: Fn(&FrameSize) -> f64,
{
    let mut best: Option<(f64, FrameSize)> = None;
    for size in items {
        let k = key(size);
        match best {
            Some((best_key, _)) if k >= best_key => {}
            _ => best = Some((k, *size)),
        }
    }
    best.map(|(_, size)| size)
}

/// Encoder bitrate tier from the camera's largest still resolution.
///
/// Higher still resolution maps to a lower video bitrate. The tiers are
/// kept exactly as the widget always shipped them.
pub fn bitrate_for_picture_pixels(max_pixels: u64) -> u32 {
    if max_pixels < 3_000_000 {
        3 * MIB
    } else if max_pixels <= 5_000_000 {
        2 * MIB
    } else {
        MIB
    }
}

/// Rotation hint for the recorded file; the front camera is mirrored
pub fn orientation_hint(facing: CameraFacing) -> u32 {
    match facing {
        CameraFacing::Back => 90,
        CameraFacing::Front => 270,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(list: &[(u32, u32)]) -> Vec<FrameSize> {
        list.iter().map(|&(w, h)| FrameSize::new(w, h)).collect()
    }

    #[test]
    fn test_prefers_exact_ratio() {
        let candidates = sizes(&[(1920, 1080), (1280, 720), (640, 480), (1440, 1080)]);
        let picked = Negotiator::default().select_size(&candidates);
        assert_eq!(picked, Some(FrameSize::new(1440, 1080)));
    }

    #[test]
    fn test_tie_goes_to_widest() {
        let candidates = sizes(&[(320, 240), (1280, 960), (640, 480)]);
        let picked = Negotiator::default().select_size(&candidates);
        assert_eq!(picked, Some(FrameSize::new(1280, 960)));
    }

    #[test]
    fn test_falls_back_to_height_proximity() {
        // Only 16:9 sizes: none is within 0.1 of 3:4
        let candidates = sizes(&[(1920, 1080), (1280, 720), (854, 480)]);
        let negotiator = Negotiator::default().with_reference_height(500);
        assert_eq!(
            negotiator.select_size(&candidates),
            Some(FrameSize::new(854, 480))
        );
    }

    #[test]
    fn test_empty_list_yields_none() {
        assert_eq!(Negotiator::default().select_size(&[]), None);
    }

    #[test]
    fn test_video_size_defaults_to_preview() {
        let caps = CameraCapabilities::new(sizes(&[(640, 480)]));
        let negotiator = Negotiator::default();
        let preview = negotiator.preview_size(&caps);
        assert_eq!(negotiator.video_size(&caps, preview), preview);
    }

    #[test]
    fn test_empty_preview_list_uses_fallback() {
        let caps = CameraCapabilities::default();
        assert_eq!(Negotiator::default().preview_size(&caps), FALLBACK_PREVIEW);
    }

    #[test]
    fn test_bitrate_tiers() {
        assert_eq!(bitrate_for_picture_pixels(0), 3 * MIB);
        assert_eq!(bitrate_for_picture_pixels(2_999_999), 3 * MIB);
        assert_eq!(bitrate_for_picture_pixels(3_000_000), 2 * MIB);
        assert_eq!(bitrate_for_picture_pixels(5_000_000), 2 * MIB);
        assert_eq!(bitrate_for_picture_pixels(5_000_001), MIB);
    }

    #[test]
    fn test_negotiate_front_camera() {
        let caps = CameraCapabilities::new(sizes(&[(1280, 720), (640, 480)]))
            .with_video_sizes(sizes(&[(1280, 960), (320, 240)]))
            .with_picture_sizes(sizes(&[(4000, 3000)]));
        let profile = Negotiator::default().negotiate(&caps, CameraFacing::Front);
        assert_eq!(profile.preview, FrameSize::new(640, 480));
        assert_eq!(profile.video, FrameSize::new(1280, 960));
        assert_eq!(profile.bitrate, MIB);
        assert_eq!(profile.orientation_hint, 270);
        assert_eq!(profile.codec, VideoCodec::H264);
        assert!(profile.frame_rate.is_none());
    }
}
