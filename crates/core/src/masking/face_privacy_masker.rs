use super::gaussian::GaussianBlur;
use super::roi;
use crate::detection::domain::face_detection::FaceDetection;
use crate::settings::app_settings::{PrivacyMode, Settings, ThirdPartyMode};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::constants::{
    DEPTH_SCALE_FACTOR, FACE_BLUR_KERNEL_SIZE, FACE_FILL_COLOR, MAX_DEPTH_SCALE, MIN_DEPTH_SCALE,
};
use crate::shared::frame::Frame;

/// Owner rank for a frame with `face_count` detections, or `None` when
/// nothing was detected.
///
/// Clamped to the last detection, so an owner index past the end picks
/// the last face rather than nobody.
pub fn owner_index(configured: usize, face_count: usize) -> Option<usize> {
    face_count.checked_sub(1).map(|last| configured.min(last))
}

pub fn should_hide(rank: usize, owner: usize, mode: ThirdPartyMode) -> bool {
    match mode {
        ThirdPartyMode::HideAll => true,
        ThirdPartyMode::HideOwner => rank == owner,
        ThirdPartyMode::HideOthers => rank != owner,
    }
}

/// Growth factor for an occlusion box: closer faces get larger boxes.
pub fn depth_scale(depth: f32) -> f64 {
    (1.0 + (depth as f64).abs() * DEPTH_SCALE_FACTOR).clamp(MIN_DEPTH_SCALE, MAX_DEPTH_SCALE)
}

/// Occlusion box for one face, or `None` if it clamps away to nothing.
pub fn occlusion_box(face: &FaceDetection, width: u32, height: u32) -> Option<BoundingBox> {
    let bbox = face.bbox.clamp_to(width, height);
    if bbox.is_empty() {
        return None;
    }
    let scaled = bbox
        .scaled_about_center(depth_scale(face.depth))
        .clamp_to(width, height);
    (!scaled.is_empty()).then_some(scaled)
}

/// Decides which faces a policy hides and returns their occlusion boxes,
/// in detection order.
///
/// Faces keep the provider's order; rank `i` is the position in `faces`.
pub fn plan_occlusions(
    faces: &[FaceDetection],
    settings: &Settings,
    width: u32,
    height: u32,
) -> Vec<BoundingBox> {
    let Some(owner) = owner_index(settings.owner_face_index, faces.len()) else {
        return Vec::new();
    };
    faces
        .iter()
        .enumerate()
        .filter(|(rank, _)| should_hide(*rank, owner, settings.third_party_mode))
        .filter_map(|(_, face)| occlusion_box(face, width, height))
        .collect()
}

/// Obscures faces selected by the third-party policy.
///
/// `square_2d` fills the occlusion box with black; `blur_3d` replaces it
/// with a heavy blur of the input frame's pixels under that box.
pub struct FacePrivacyMasker {
    blur: GaussianBlur,
}

impl FacePrivacyMasker {
    pub fn new() -> Self {
        Self {
            blur: GaussianBlur::new(FACE_BLUR_KERNEL_SIZE),
        }
    }

    /// Returns a new frame; the input is never modified.
    pub fn apply(&self, frame: &Frame, faces: &[FaceDetection], settings: &Settings) -> Frame {
        let boxes = plan_occlusions(faces, settings, frame.width(), frame.height());
        let mut output = frame.clone();
        for rect in boxes {
            match settings.privacy_mode {
                PrivacyMode::Square => roi::fill(&mut output, rect, FACE_FILL_COLOR),
                PrivacyMode::Blur => {
                    let blurred = self.blur.blur_rect(frame, rect);
                    roi::write_back(&mut output, rect, &blurred);
                }
            }
        }
        output
    }
}

impl Default for FacePrivacyMasker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn face(x1: i32, y1: i32, x2: i32, y2: i32, depth: f32) -> FaceDetection {
        FaceDetection::new(BoundingBox::new(x1, y1, x2, y2), depth)
    }

    fn settings(owner: usize, mode: ThirdPartyMode, privacy: PrivacyMode) -> Settings {
        Settings {
            owner_face_index: owner,
            third_party_mode: mode,
            privacy_mode: privacy,
            ..Settings::default()
        }
    }

    /// Distinct non-black pixels so fills and blurs are observable.
    fn textured_frame(width: u32, height: u32) -> Frame {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x / 2 + y / 2) % 2 == 0 { 220 } else { 40 };
                data.extend_from_slice(&[v, v / 2 + 10, 255 - v]);
            }
        }
        Frame::new(data, width, height, 0)
    }

    fn region_pixels(frame: &Frame, b: BoundingBox) -> Vec<[u8; 3]> {
        let mut out = Vec::new();
        for y in b.y1..b.y2 {
            for x in b.x1..b.x2 {
                out.push(frame.pixel(x as u32, y as u32));
            }
        }
        out
    }

    fn hidden_ranks(n: usize, owner: usize, mode: ThirdPartyMode) -> Vec<usize> {
        match owner_index(owner, n) {
            Some(o) => (0..n).filter(|&i| should_hide(i, o, mode)).collect(),
            None => Vec::new(),
        }
    }

    // ── Owner selection ──────────────────────────────────────────────

    #[rstest]
    #[case::no_faces(3, 0, None)]
    #[case::in_range(1, 3, Some(1))]
    #[case::clamped(5, 3, Some(2))]
    #[case::single_face(4, 1, Some(0))]
    fn test_owner_index(
        #[case] configured: usize,
        #[case] count: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(owner_index(configured, count), expected);
    }

    #[test]
    fn test_owner_index_matches_min_for_all_counts() {
        for n in 1..8 {
            for configured in 0..10 {
                assert_eq!(owner_index(configured, n), Some(configured.min(n - 1)));
            }
        }
    }

    // ── Third-party policy ───────────────────────────────────────────

    #[test]
    fn test_hide_all_hides_every_face() {
        for n in 0..6 {
            assert_eq!(hidden_ranks(n, 0, ThirdPartyMode::HideAll), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_hide_owner_hides_exactly_owner() {
        assert!(hidden_ranks(0, 1, ThirdPartyMode::HideOwner).is_empty());
        for n in 1..6 {
            for configured in 0..7 {
                let owner = configured.min(n - 1);
                assert_eq!(hidden_ranks(n, configured, ThirdPartyMode::HideOwner), vec![owner]);
            }
        }
    }

    #[test]
    fn test_hide_others_spares_only_owner() {
        for n in 1..6 {
            for configured in 0..7 {
                let owner = configured.min(n - 1);
                let expected: Vec<_> = (0..n).filter(|&i| i != owner).collect();
                assert_eq!(hidden_ranks(n, configured, ThirdPartyMode::HideOthers), expected);
            }
        }
    }

    // ── Depth scaling ────────────────────────────────────────────────

    #[rstest]
    #[case::zero(0.0, 1.0)]
    #[case::small(-0.05, 1.2)]
    #[case::positive(0.1, 1.4)]
    #[case::at_cap(-0.2, 1.8)]
    #[case::extreme(100.0, 1.8)]
    #[case::extreme_negative(-100.0, 1.8)]
    fn test_depth_scale_clamped(#[case] depth: f32, #[case] expected: f64) {
        assert_relative_eq!(depth_scale(depth), expected, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_scale_always_in_range() {
        for i in -1000..=1000 {
            let s = depth_scale(i as f32 * 0.37);
            assert!((1.0..=1.8).contains(&s));
        }
        assert_relative_eq!(depth_scale(f32::MAX), 1.8);
    }

    // ── Occlusion geometry ───────────────────────────────────────────

    #[test]
    fn test_occlusion_box_grows_with_depth() {
        let b = occlusion_box(&face(40, 40, 60, 60, -0.125), 100, 100).unwrap();
        assert_eq!(b, BoundingBox::new(35, 35, 65, 65));
    }

    #[test]
    fn test_occlusion_box_clamped_to_frame() {
        let b = occlusion_box(&face(-10, 80, 30, 120, -1.0), 100, 100).unwrap();
        assert!(b.x1 >= 0 && b.y1 >= 0 && b.x2 <= 100 && b.y2 <= 100);
        assert!(!b.is_empty());
    }

    #[rstest]
    #[case::outside(face(150, 150, 200, 200, 0.0))]
    #[case::zero_width(face(10, 10, 10, 40, 0.0))]
    #[case::inverted(face(50, 50, 20, 20, -0.5))]
    fn test_degenerate_box_skipped(#[case] f: FaceDetection) {
        assert!(occlusion_box(&f, 100, 100).is_none());
    }

    #[test]
    fn test_degenerate_face_skipped_without_error() {
        let frame = textured_frame(40, 40);
        let s = settings(0, ThirdPartyMode::HideAll, PrivacyMode::Square);
        let out = FacePrivacyMasker::new().apply(&frame, &[face(100, 100, 120, 120, 0.0)], &s);
        assert_eq!(out, frame);
    }

    // ── Masking ──────────────────────────────────────────────────────

    #[test]
    fn test_no_detections_is_identity() {
        let frame = textured_frame(32, 24);
        let s = settings(0, ThirdPartyMode::HideAll, PrivacyMode::Square);
        assert_eq!(FacePrivacyMasker::new().apply(&frame, &[], &s), frame);
    }

    #[test]
    fn test_hide_others_square_blacks_out_second_face_only() {
        let frame = textured_frame(120, 60);
        let owner = face(5, 5, 35, 45, 0.0);
        let other = face(70, 10, 100, 50, 0.0);
        let s = settings(0, ThirdPartyMode::HideOthers, PrivacyMode::Square);

        let out = FacePrivacyMasker::new().apply(&frame, &[owner, other], &s);

        assert!(region_pixels(&out, other.bbox).iter().all(|p| *p == [0, 0, 0]));
        assert_eq!(region_pixels(&out, owner.bbox), region_pixels(&frame, owner.bbox));
    }

    #[test]
    fn test_input_frame_not_modified() {
        let frame = textured_frame(50, 50);
        let before = frame.clone();
        let s = settings(0, ThirdPartyMode::HideAll, PrivacyMode::Blur);
        let _ = FacePrivacyMasker::new().apply(&frame, &[face(10, 10, 30, 30, -0.1)], &s);
        assert_eq!(frame, before);
    }

    #[test]
    fn test_blur_mode_changes_only_occlusion_box() {
        let frame = textured_frame(80, 80);
        let f = face(20, 20, 50, 50, 0.0);
        let s = settings(0, ThirdPartyMode::HideAll, PrivacyMode::Blur);

        let out = FacePrivacyMasker::new().apply(&frame, &[f], &s);

        assert_ne!(region_pixels(&out, f.bbox), region_pixels(&frame, f.bbox));
        for y in 0..80 {
            for x in 0..80 {
                if !f.bbox.contains(x, y) {
                    assert_eq!(out.pixel(x as u32, y as u32), frame.pixel(x as u32, y as u32));
                }
            }
        }
    }

    #[test]
    fn test_hide_owner_with_out_of_range_owner_hides_last_face() {
        let frame = textured_frame(120, 40);
        let faces = [face(0, 0, 20, 20, 0.0), face(50, 0, 70, 20, 0.0), face(90, 0, 110, 20, 0.0)];
        let s = settings(9, ThirdPartyMode::HideOwner, PrivacyMode::Square);

        let out = FacePrivacyMasker::new().apply(&frame, &faces, &s);

        assert!(region_pixels(&out, faces[2].bbox).iter().all(|p| *p == [0, 0, 0]));
        assert_eq!(region_pixels(&out, faces[0].bbox), region_pixels(&frame, faces[0].bbox));
        assert_eq!(region_pixels(&out, faces[1].bbox), region_pixels(&frame, faces[1].bbox));
    }

    #[test]
    fn test_plan_keeps_detection_order() {
        let faces = [face(60, 0, 80, 20, 0.0), face(0, 0, 20, 20, 0.0)];
        let s = settings(0, ThirdPartyMode::HideAll, PrivacyMode::Square);
        let plan = plan_occlusions(&faces, &s, 100, 100);
        assert_eq!(plan, vec![faces[0].bbox, faces[1].bbox]);
    }
}
