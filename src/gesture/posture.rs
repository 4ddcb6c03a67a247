//! Hand posture heuristics used to fill in the raised flag and confidence
//! when a detector does not supply them.

use crate::landmarks::{index, Hand, Landmark, HAND_LANDMARK_COUNT};

/// Fraction of the frame height the wrist must stay above to count as raised
const RAISED_WRIST_FRACTION: f32 = 0.6;

/// Penalty applied per finger that is not extended
const FOLDED_FINGER_PENALTY: f32 = 0.9;

const FINGER_TIPS: [usize; 4] = [index::INDEX_TIP, index::MIDDLE_TIP, index::RING_TIP, index::PINKY_TIP];
const FINGER_BASES: [usize; 4] = [index::INDEX_MCP, index::MIDDLE_MCP, index::RING_MCP, index::PINKY_MCP];

/// Count fingers (thumb excluded) whose tip is above its base knuckle
pub fn extended_finger_count(landmarks: &[Landmark]) -> usize {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return 0;
    }
    FINGER_TIPS
        .iter()
        .zip(FINGER_BASES.iter())
        .filter(|&(&tip, &base)| landmarks[tip].y < landmarks[base].y)
        .count()
}

/// A hand is raised when the wrist sits in the upper part of the frame, at
/// least one of index/middle/ring is above the wrist, and at least two
/// fingers are extended.
pub fn is_hand_raised(landmarks: &[Landmark], frame_height: f32) -> bool {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return false;
    }

    let wrist = landmarks[index::WRIST];
    let wrist_high = wrist.y < frame_height * RAISED_WRIST_FRACTION;
    let finger_above = [index::INDEX_TIP, index::MIDDLE_TIP, index::RING_TIP]
        .iter()
        .any(|&i| landmarks[i].y < wrist.y);

    wrist_high && finger_above && extended_finger_count(landmarks) >= 2
}

/// Pose-consistency confidence in [0, 1].
///
/// Starts at 1.0 and loses 10% for each finger pointing the wrong way: the
/// thumb tip left of its base, or a fingertip below its base knuckle.
pub fn hand_confidence(landmarks: &[Landmark]) -> f32 {
    if landmarks.len() < HAND_LANDMARK_COUNT {
        return 0.0;
    }

    let mut confidence = 1.0_f32;
    if landmarks[index::THUMB_TIP].x < landmarks[index::THUMB_MCP].x {
        confidence *= FOLDED_FINGER_PENALTY;
    }
    for (&tip, &base) in FINGER_TIPS.iter().zip(FINGER_BASES.iter()) {
        if landmarks[tip].y > landmarks[base].y {
            confidence *= FOLDED_FINGER_PENALTY;
        }
    }
    confidence.clamp(0.0, 1.0)
}

/// Fill in `is_raised` and `confidence` from the landmarks
pub fn annotate(mut hand: Hand, frame_height: f32) -> Hand {
    hand.is_raised = is_hand_raised(&hand.landmarks, frame_height);
    hand.confidence = hand_confidence(&hand.landmarks);
    hand
}
