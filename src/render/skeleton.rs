//! Hand skeleton overlay

use image::Rgba;

use super::Canvas;
use crate::error::RenderError;
use crate::landmarks::{Hand, HAND_LANDMARK_COUNT};

/// Wrist-to-fingertip chains: thumb, index, middle, ring, pinky
pub const HAND_CONNECTIONS: [[usize; 5]; 5] = [
    [0, 1, 2, 3, 4],
    [0, 5, 6, 7, 8],
    [0, 9, 10, 11, 12],
    [0, 13, 14, 15, 16],
    [0, 17, 18, 19, 20],
];

pub const SKELETON_COLOR: Rgba<u8> = Rgba([0x4e, 0xcd, 0xc4, 255]);
const LINE_WIDTH: f32 = 2.0;
const WRIST_RADIUS: f32 = 8.0;
const JOINT_RADIUS: f32 = 6.0;

/// Draw the five finger chains and a dot on every landmark
pub fn draw_hand(canvas: &mut Canvas, hand: &Hand) -> Result<(), RenderError> {
    if hand.landmarks.len() < HAND_LANDMARK_COUNT {
        return Err(RenderError::IncompleteHand(hand.landmarks.len()));
    }
    if !hand.landmarks.iter().all(|p| p.is_finite()) {
        return Err(RenderError::NonFiniteGeometry { filter: "skeleton" });
    }

    for chain in HAND_CONNECTIONS {
        let points: Vec<_> = chain.iter().map(|&i| hand.landmarks[i]).collect();
        canvas.polyline(&points, LINE_WIDTH, SKELETON_COLOR);
    }

    for (i, &point) in hand.landmarks.iter().take(HAND_LANDMARK_COUNT).enumerate() {
        let radius = if i == 0 { WRIST_RADIUS } else { JOINT_RADIUS };
        canvas.fill_circle(point, radius, SKELETON_COLOR);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FrameSize, Point};
    use crate::landmarks::Handedness;

    #[test]
    fn test_wrist_dot_is_larger() {
        let mut points = vec![Point::new(80.0, 80.0); 21];
        points[0] = Point::new(20.0, 20.0);
        let hand = Hand::new(Handedness::Left, points);
        let mut canvas = Canvas::new(FrameSize::new(100, 100));

        draw_hand(&mut canvas, &hand).unwrap();
        // 7px from the wrist is inside its dot; 7px from a joint is not
        assert_eq!(canvas.image().get_pixel(27, 20), &SKELETON_COLOR);
        assert_eq!(canvas.image().get_pixel(80, 75), &SKELETON_COLOR);
        assert_eq!(canvas.image().get_pixel(80, 73)[3], 0);
        assert_eq!(canvas.image().get_pixel(73, 87)[3], 0);
    }

    #[test]
    fn test_rejects_bad_hands() {
        let mut canvas = Canvas::new(FrameSize::new(10, 10));
        let short = Hand::new(Handedness::Left, vec![Point::new(1.0, 1.0); 5]);
        assert!(matches!(draw_hand(&mut canvas, &short), Err(RenderError::IncompleteHand(5))));

        let mut points = vec![Point::new(1.0, 1.0); 21];
        points[3] = Point::new(f32::NAN, 0.0);
        let nan = Hand::new(Handedness::Left, points);
        assert!(draw_hand(&mut canvas, &nan).is_err());
    }
}
