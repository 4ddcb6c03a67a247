//! Gesture classification
//!
//! Maps the 21 landmarks of a single hand to a discrete [`Gesture`] using
//! geometric predicates evaluated in strict priority order:
//!
//! | Priority | Gesture | Rule |
//! |---|---|---|
//! | 1 | Pinch | thumb tip to index tip closer than `pinch` |
//! | 2 | Open Palm | all four fingertips further than `open_palm` from the wrist |
//! | 3 | Thumbs Up | thumb tip above the wrist, all four fingertips below it |
//! | 4 | Point | index extended and topmost, the other three curled |
//! | 5 | Middle Point | same posture with the middle finger (opt-in) |
//!
//! Classification is a pure function of the current hand. Thresholds are
//! in the same pixel units as the landmarks and are scaled to the capture
//! resolution with [`GestureThresholds::for_resolution`].

pub mod posture;

use serde::{Deserialize, Serialize};

use crate::geometry::{distance, FrameSize};
use crate::landmarks::{index, Hand};

/// Pinch distance at the reference resolution, in pixels
pub const PINCH_THRESHOLD_PX: f32 = 40.0;

/// Resolution the pixel thresholds were tuned at
pub const REFERENCE_RESOLUTION: FrameSize = FrameSize::new(1280, 720);

/// A recognised hand gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Gesture {
    #[default]
    None,
    Pinch,
    OpenPalm,
    ThumbsUp,
    Point,
    /// Point posture led by the middle finger; only reported when enabled
    MiddlePoint,
}

impl Gesture {
    /// Plain label, empty for [`Gesture::None`]
    pub fn label(&self) -> &'static str {
        match self {
            Gesture::None => "",
            Gesture::Pinch => "Pinch",
            Gesture::OpenPalm => "Open Palm",
            Gesture::ThumbsUp => "Thumbs Up",
            Gesture::Point => "Point",
            Gesture::MiddlePoint => "Middle Point",
        }
    }

    /// Label with its emoji, as shown in the gesture readout
    pub fn display_text(&self) -> String {
        let emoji = match self {
            Gesture::None => return String::new(),
            Gesture::Pinch => "👌",
            Gesture::OpenPalm => "✋",
            Gesture::ThumbsUp => "👍",
            Gesture::Point | Gesture::MiddlePoint => "👉",
        };
        format!("{} {}", self.label(), emoji)
    }
}

impl std::fmt::Display for Gesture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Threshold set selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GestureProfile {
    /// Full-screen layout: stricter palm and point rules
    #[default]
    Full,
    /// Compact layout: shorter reach, point only needs to rise above the wrist
    Compact,
}

/// Pixel thresholds used by [`classify`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureThresholds {
    /// Thumb/index distance below which the hand is pinching
    pub pinch: f32,
    /// Fingertip/wrist distance every finger must exceed for an open palm
    pub open_palm: f32,
    /// Fingertip/wrist distance the pointing finger must exceed
    pub point_extended: f32,
    /// Fingertip/wrist distance the other fingers must stay under, if checked
    pub point_curled: Option<f32>,
    /// How far above the wrist the pointing tip must be
    pub point_min_rise: f32,
    /// Whether the pointing tip must be the highest of the four fingertips
    pub point_requires_topmost: bool,
    /// Report [`Gesture::MiddlePoint`] instead of falling through to `None`
    pub report_middle_point: bool,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self::for_profile(GestureProfile::Full)
    }
}

impl GestureThresholds {
    /// Thresholds at the reference resolution
    pub fn for_profile(profile: GestureProfile) -> Self {
        match profile {
            GestureProfile::Full => Self {
                pinch: PINCH_THRESHOLD_PX,
                open_palm: 120.0,
                point_extended: 120.0,
                point_curled: Some(110.0),
                point_min_rise: 0.0,
                point_requires_topmost: true,
                report_middle_point: false,
            },
            GestureProfile::Compact => Self {
                pinch: PINCH_THRESHOLD_PX,
                open_palm: 100.0,
                point_extended: 100.0,
                point_curled: None,
                point_min_rise: 50.0,
                point_requires_topmost: false,
                report_middle_point: false,
            },
        }
    }

    /// Profile thresholds scaled from `reference` to the actual `frame` size
    pub fn for_resolution(profile: GestureProfile, frame: FrameSize, reference: FrameSize) -> Self {
        Self::for_profile(profile).scaled(resolution_scale(frame, reference))
    }

    /// Multiply every distance threshold by `factor`
    pub fn scaled(self, factor: f32) -> Self {
        Self {
            pinch: self.pinch * factor,
            open_palm: self.open_palm * factor,
            point_extended: self.point_extended * factor,
            point_curled: self.point_curled.map(|c| c * factor),
            point_min_rise: self.point_min_rise * factor,
            point_requires_topmost: self.point_requires_topmost,
            report_middle_point: self.report_middle_point,
        }
    }

    pub fn with_middle_point(mut self, enabled: bool) -> Self {
        self.report_middle_point = enabled;
        self
    }
}

/// Ratio of frame diagonal to reference diagonal; 1.0 if either is unsized
pub fn resolution_scale(frame: FrameSize, reference: FrameSize) -> f32 {
    if frame.is_empty() || reference.is_empty() {
        return 1.0;
    }
    frame.diagonal() / reference.diagonal()
}

/// Classify a single hand.
///
/// Returns [`Gesture::None`] for a missing hand or one with fewer than 21
/// landmarks.
pub fn classify(hand: Option<&Hand>, t: &GestureThresholds) -> Gesture {
    let Some(hand) = hand else {
        return Gesture::None;
    };
    if !hand.is_complete() {
        return Gesture::None;
    }

    let lm = &hand.landmarks;
    let wrist = lm[index::WRIST];
    let thumb = lm[index::THUMB_TIP];
    let index_tip = lm[index::INDEX_TIP];
    let middle = lm[index::MIDDLE_TIP];
    let ring = lm[index::RING_TIP];
    let pinky = lm[index::PINKY_TIP];
    let fingers = [index_tip, middle, ring, pinky];

    if distance(thumb, index_tip) < t.pinch {
        return Gesture::Pinch;
    }

    if fingers.iter().all(|&tip| distance(tip, wrist) > t.open_palm) {
        return Gesture::OpenPalm;
    }

    // Image y grows downward: smaller y is higher on screen
    if thumb.y < wrist.y && fingers.iter().all(|tip| tip.y > wrist.y) {
        return Gesture::ThumbsUp;
    }

    let curled = |tips: [crate::landmarks::Landmark; 3]| match t.point_curled {
        Some(limit) => tips.iter().all(|&tip| distance(tip, wrist) < limit),
        None => true,
    };
    let topmost = |tip: crate::landmarks::Landmark, others: [crate::landmarks::Landmark; 3]| {
        !t.point_requires_topmost || others.iter().all(|other| tip.y < other.y)
    };

    let index_points = distance(index_tip, wrist) > t.point_extended
        && wrist.y - index_tip.y > t.point_min_rise
        && curled([middle, ring, pinky])
        && topmost(index_tip, [middle, ring, pinky]);
    if index_points {
        return Gesture::Point;
    }

    if t.report_middle_point {
        let middle_points = distance(middle, wrist) > t.point_extended
            && wrist.y - middle.y > t.point_min_rise
            && curled([index_tip, ring, pinky])
            && topmost(middle, [index_tip, ring, pinky]);
        if middle_points {
            return Gesture::MiddlePoint;
        }
    }

    Gesture::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::landmarks::{Hand, Handedness};

    /// Hand with every landmark on the wrist, then the given overrides
    fn hand_with(wrist: Point, tips: &[(usize, Point)]) -> Hand {
        let mut points = vec![wrist; 21];
        for &(i, p) in tips {
            points[i] = p;
        }
        Hand::new(Handedness::Right, points)
    }

    #[test]
    fn test_incomplete_hand_is_none() {
        let t = GestureThresholds::default();
        let hand = Hand::new(Handedness::Left, vec![Point::new(0.0, 0.0); 20]);
        assert_eq!(classify(Some(&hand), &t), Gesture::None);
        assert_eq!(classify(None, &t), Gesture::None);
    }

    #[test]
    fn test_pinch_scenario() {
        let hand = hand_with(
            Point::new(300.0, 400.0),
            &[
                (index::THUMB_TIP, Point::new(100.0, 100.0)),
                (index::INDEX_TIP, Point::new(105.0, 102.0)),
            ],
        );
        assert_eq!(classify(Some(&hand), &GestureThresholds::default()), Gesture::Pinch);
    }

    #[test]
    fn test_pinch_dominates_open_palm() {
        let wrist = Point::new(300.0, 400.0);
        let hand = hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(290.0, 200.0)),
                (index::INDEX_TIP, Point::new(300.0, 200.0)),
                (index::MIDDLE_TIP, Point::new(330.0, 200.0)),
                (index::RING_TIP, Point::new(360.0, 210.0)),
                (index::PINKY_TIP, Point::new(400.0, 240.0)),
            ],
        );
        assert_eq!(classify(Some(&hand), &GestureThresholds::default()), Gesture::Pinch);
    }

    #[test]
    fn test_open_palm_scenario() {
        let wrist = Point::new(300.0, 400.0);
        let hand = hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(150.0, 330.0)),
                (index::INDEX_TIP, Point::new(250.0, 270.0)),
                (index::MIDDLE_TIP, Point::new(300.0, 279.0)),
                (index::RING_TIP, Point::new(350.0, 270.0)),
                (index::PINKY_TIP, Point::new(420.0, 300.0)),
            ],
        );
        assert_eq!(classify(Some(&hand), &GestureThresholds::default()), Gesture::OpenPalm);
        assert_eq!(Gesture::OpenPalm.label(), "Open Palm");
    }

    #[test]
    fn test_compact_profile_open_palm_threshold() {
        // Fingertips ~110 px out: open in compact, not in full
        let wrist = Point::new(300.0, 400.0);
        let hand = hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(200.0, 400.0)),
                (index::INDEX_TIP, Point::new(260.0, 298.0)),
                (index::MIDDLE_TIP, Point::new(300.0, 290.0)),
                (index::RING_TIP, Point::new(340.0, 298.0)),
                (index::PINKY_TIP, Point::new(400.0, 355.0)),
            ],
        );
        let compact = GestureThresholds::for_profile(GestureProfile::Compact);
        assert_eq!(classify(Some(&hand), &compact), Gesture::OpenPalm);
        assert_ne!(classify(Some(&hand), &GestureThresholds::default()), Gesture::OpenPalm);
    }

    #[test]
    fn test_thumbs_up() {
        let wrist = Point::new(300.0, 400.0);
        let hand = hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(300.0, 300.0)),
                (index::INDEX_TIP, Point::new(330.0, 420.0)),
                (index::MIDDLE_TIP, Point::new(335.0, 430.0)),
                (index::RING_TIP, Point::new(335.0, 440.0)),
                (index::PINKY_TIP, Point::new(330.0, 450.0)),
            ],
        );
        assert_eq!(classify(Some(&hand), &GestureThresholds::default()), Gesture::ThumbsUp);
    }

    fn pointing_hand() -> Hand {
        let wrist = Point::new(300.0, 400.0);
        hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(250.0, 380.0)),
                (index::INDEX_TIP, Point::new(300.0, 250.0)),
                (index::MIDDLE_TIP, Point::new(320.0, 340.0)),
                (index::RING_TIP, Point::new(335.0, 350.0)),
                (index::PINKY_TIP, Point::new(345.0, 365.0)),
            ],
        )
    }

    #[test]
    fn test_point() {
        let hand = pointing_hand();
        assert_eq!(classify(Some(&hand), &GestureThresholds::default()), Gesture::Point);
        let compact = GestureThresholds::for_profile(GestureProfile::Compact);
        assert_eq!(classify(Some(&hand), &compact), Gesture::Point);
    }

    #[test]
    fn test_point_requires_index_topmost() {
        let mut hand = pointing_hand();
        hand.landmarks[index::MIDDLE_TIP] = Point::new(320.0, 240.0);
        assert_ne!(classify(Some(&hand), &GestureThresholds::default()), Gesture::Point);
    }

    #[test]
    fn test_compact_point_ignores_higher_fingertips() {
        let hand = hand_with(
            Point::new(300.0, 400.0),
            &[
                (index::THUMB_TIP, Point::new(250.0, 380.0)),
                (index::INDEX_TIP, Point::new(300.0, 280.0)),
                (index::MIDDLE_TIP, Point::new(330.0, 270.0)),
                (index::RING_TIP, Point::new(335.0, 390.0)),
                (index::PINKY_TIP, Point::new(345.0, 395.0)),
            ],
        );
        let compact = GestureThresholds::for_profile(GestureProfile::Compact);
        assert_eq!(classify(Some(&hand), &compact), Gesture::Point);

        let mut full = GestureThresholds::for_profile(GestureProfile::Full);
        full.point_extended = 100.0;
        full.point_curled = None;
        assert_eq!(classify(Some(&hand), &full), Gesture::None);
    }

    #[test]
    fn test_middle_point_is_opt_in() {
        let wrist = Point::new(300.0, 400.0);
        let hand = hand_with(
            wrist,
            &[
                (index::THUMB_TIP, Point::new(250.0, 380.0)),
                (index::INDEX_TIP, Point::new(285.0, 340.0)),
                (index::MIDDLE_TIP, Point::new(305.0, 250.0)),
                (index::RING_TIP, Point::new(335.0, 350.0)),
                (index::PINKY_TIP, Point::new(345.0, 365.0)),
            ],
        );
        let t = GestureThresholds::default();
        assert_eq!(classify(Some(&hand), &t), Gesture::None);
        assert_eq!(classify(Some(&hand), &t.with_middle_point(true)), Gesture::MiddlePoint);
    }

    #[test]
    fn test_thresholds_scale_with_resolution() {
        let t = GestureThresholds::for_resolution(
            GestureProfile::Full,
            FrameSize::new(1920, 1080),
            REFERENCE_RESOLUTION,
        );
        assert!((t.pinch - 60.0).abs() < 1e-3);
        assert!((t.open_palm - 180.0).abs() < 1e-3);
        assert_eq!(resolution_scale(FrameSize::new(0, 0), REFERENCE_RESOLUTION), 1.0);
    }

    #[test]
    fn test_display_text() {
        assert_eq!(Gesture::Pinch.display_text(), "Pinch 👌");
        assert_eq!(Gesture::None.display_text(), "");
    }
}
