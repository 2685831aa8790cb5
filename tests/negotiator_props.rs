//! Property-Based Tests for the capture parameter negotiator
//!
//! These tests verify invariants of size selection and bitrate tiers
//! using proptest for input generation and shrinking.
//!
//! Run with: cargo test --test negotiator_props

use crabclip::negotiator::{bitrate_for_picture_pixels, orientation_hint, Negotiator, FALLBACK_PREVIEW};
use crabclip::types::{CameraCapabilities, CameraFacing, FrameSize};
use proptest::prelude::*;

const MIB: u32 = 1024 * 1024;

fn frame_size() -> impl Strategy<Value = FrameSize> {
    (16u32..4096, 16u32..4096).prop_map(|(w, h)| FrameSize::new(w, h))
}

fn size_list() -> impl Strategy<Value = Vec<FrameSize>> {
    prop::collection::vec(frame_size(), 1..12)
}

// ═══════════════════════════════════════════════════════════════════════════
// SIZE SELECTION INVARIANTS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: A non-empty candidate list always yields one of its members
    #[test]
    fn selection_never_empty(candidates in size_list()) {
        let chosen = Negotiator::default().select_size(&candidates);
        prop_assert!(chosen.is_some());
        prop_assert!(candidates.contains(&chosen.unwrap()));
    }

    /// INVARIANT: When any candidate is near 3:4, the choice is near 3:4
    /// and no other near candidate is strictly closer
    #[test]
    fn ratio_match_wins_when_present(candidates in size_list()) {
        let negotiator = Negotiator::default();
        let chosen = negotiator.select_size(&candidates).unwrap();

        if candidates.iter().any(|s| negotiator.matches_ratio(s)) {
            prop_assert!(negotiator.matches_ratio(&chosen));
            let best = (chosen.ratio() - 0.75).abs();
            for s in candidates.iter().filter(|s| negotiator.matches_ratio(s)) {
                prop_assert!((s.ratio() - 0.75).abs() >= best);
            }
        }
    }

    /// INVARIANT: Without any 3:4-ish size the choice minimizes height distance
    #[test]
    fn fallback_minimizes_height_distance(
        candidates in prop::collection::vec(
            (100u32..4000).prop_map(|w| FrameSize::new(w, w / 4)), 1..10),
        reference in 240u32..2160,
    ) {
        let negotiator = Negotiator::default().with_reference_height(reference);
        let chosen = negotiator.select_size(&candidates).unwrap();

        let distance = |s: &FrameSize| (s.height as i64 - reference as i64).abs();
        let best = candidates.iter().map(distance).min().unwrap();
        prop_assert_eq!(distance(&chosen), best);
    }

    /// INVARIANT: Selection does not depend on the order the device lists sizes in,
    /// as long as widths are distinct
    #[test]
    fn selection_ignores_input_order(candidates in size_list()) {
        let mut widths: Vec<u32> = candidates.iter().map(|s| s.width).collect();
        widths.sort_unstable();
        widths.dedup();
        prop_assume!(widths.len() == candidates.len());

        let negotiator = Negotiator::default();
        let mut reversed = candidates.clone();
        reversed.reverse();
        prop_assert_eq!(negotiator.select_size(&candidates), negotiator.select_size(&reversed));
    }

    /// INVARIANT: Devices without a video list record at the preview size
    #[test]
    fn video_defaults_to_preview(previews in size_list()) {
        let caps = CameraCapabilities::new(previews);
        let negotiator = Negotiator::default();
        let profile = negotiator.negotiate(&caps, CameraFacing::Back);
        prop_assert_eq!(profile.video, profile.preview);
        prop_assert_eq!(profile.frame_rate, None);
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// BITRATE TIERS
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    /// INVARIANT: Bitrate is one of the three tiers and never increases with resolution
    #[test]
    fn bitrate_is_monotone_non_increasing(a in 0u64..50_000_000, b in 0u64..50_000_000) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let tiers = [MIB, 2 * MIB, 3 * MIB];
        prop_assert!(tiers.contains(&bitrate_for_picture_pixels(low)));
        prop_assert!(bitrate_for_picture_pixels(low) >= bitrate_for_picture_pixels(high));
    }
}

#[test]
fn bitrate_tier_boundaries() {
    assert_eq!(bitrate_for_picture_pixels(0), 3 * MIB);
    assert_eq!(bitrate_for_picture_pixels(2_999_999), 3 * MIB);
    assert_eq!(bitrate_for_picture_pixels(3_000_000), 2 * MIB);
    assert_eq!(bitrate_for_picture_pixels(5_000_000), 2 * MIB);
    assert_eq!(bitrate_for_picture_pixels(5_000_001), MIB);
}

#[test]
fn orientation_hints() {
    assert_eq!(orientation_hint(CameraFacing::Back), 90);
    assert_eq!(orientation_hint(CameraFacing::Front), 270);
}

#[test]
fn empty_preview_list_falls_back() {
    let caps = CameraCapabilities::new(vec![]);
    let profile = Negotiator::default().negotiate(&caps, CameraFacing::Front);
    assert_eq!(profile.preview, FALLBACK_PREVIEW);
    assert_eq!(profile.video, FALLBACK_PREVIEW);
}

#[test]
fn phone_back_camera_profile() {
    let caps = CameraCapabilities::new(vec![
        FrameSize::new(1920, 1080),
        FrameSize::new(1280, 720),
        FrameSize::new(1280, 960),
        FrameSize::new(640, 480),
    ])
    .with_video_sizes(vec![FrameSize::new(1920, 1080), FrameSize::new(640, 480)])
    .with_picture_sizes(vec![FrameSize::new(4000, 3000)]);

    let profile = Negotiator::default().negotiate(&caps, CameraFacing::Back);
    assert_eq!(profile.preview, FrameSize::new(1280, 960));
    assert_eq!(profile.video, FrameSize::new(640, 480));
    // 12 MP stills land in the lowest tier
    assert_eq!(profile.bitrate, MIB);
}
