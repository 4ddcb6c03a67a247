//! Thumb/index pinch detection

use crate::geometry::{distance, midpoint, Point};
use crate::landmarks::Hand;

/// Pinch state for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PinchEvent {
    pub active: bool,
    /// Mean of thumb tip and index tip in canvas pixels; only set while active
    pub midpoint: Option<Point>,
}

impl PinchEvent {
    pub const INACTIVE: PinchEvent = PinchEvent {
        active: false,
        midpoint: None,
    };

    /// The midpoint, if the pinch is active
    pub fn position(&self) -> Option<Point> {
        if self.active {
            self.midpoint
        } else {
            None
        }
    }
}

/// Derive the pinch state from a hand.
///
/// Missing or incomplete hands are never pinching.
pub fn compute_pinch(hand: Option<&Hand>, threshold: f32) -> PinchEvent {
    let Some(hand) = hand.filter(|h| h.is_complete()) else {
        return PinchEvent::INACTIVE;
    };
    let (Some(thumb), Some(index)) = (hand.thumb_tip(), hand.index_tip()) else {
        return PinchEvent::INACTIVE;
    };

    if distance(thumb, index) < threshold {
        PinchEvent {
            active: true,
            midpoint: Some(midpoint(thumb, index)),
        }
    } else {
        PinchEvent::INACTIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::PINCH_THRESHOLD_PX;
    use crate::landmarks::{index, Handedness};

    fn hand(thumb: Point, index_tip: Point) -> Hand {
        let mut points = vec![Point::new(300.0, 400.0); 21];
        points[index::THUMB_TIP] = thumb;
        points[index::INDEX_TIP] = index_tip;
        Hand::new(Handedness::Right, points)
    }

    #[test]
    fn test_close_tips_pinch_at_midpoint() {
        let h = hand(Point::new(100.0, 100.0), Point::new(105.0, 102.0));
        let pinch = compute_pinch(Some(&h), PINCH_THRESHOLD_PX);
        assert!(pinch.active);
        let mid = pinch.midpoint.unwrap();
        assert!((mid.x - 102.5).abs() < 1e-4);
        assert!((mid.y - 101.0).abs() < 1e-4);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let h = hand(Point::new(0.0, 0.0), Point::new(40.0, 0.0));
        assert_eq!(compute_pinch(Some(&h), 40.0), PinchEvent::INACTIVE);
    }

    #[test]
    fn test_idempotent_within_tick() {
        let h = hand(Point::new(10.0, 10.0), Point::new(20.0, 30.0));
        assert_eq!(compute_pinch(Some(&h), 40.0), compute_pinch(Some(&h), 40.0));
    }

    #[test]
    fn test_no_hand_or_short_hand() {
        assert_eq!(compute_pinch(None, 40.0), PinchEvent::INACTIVE);
        let short = Hand::new(Handedness::Left, vec![Point::new(1.0, 1.0); 9]);
        assert!(!compute_pinch(Some(&short), 40.0).active);
    }
}
