//! Landmark source trait
//!
//! The detector is a black box. Each tick the frame loop asks for the next
//! frame, then for the hands and the face in it, awaiting each call. Sources
//! may suspend; failures are degraded here so they never reach the loop.

use tracing::{debug, warn};

use super::{Face, Hand, VideoFrame};
use crate::error::DetectionError;

/// Result of asking a source for its next frame
#[derive(Debug, Clone)]
pub enum FramePoll {
    /// A frame is ready for detection
    Frame(VideoFrame),
    /// No frame this tick (camera not ready, permission denied)
    NoFrame,
    /// The source will never produce another frame
    Ended,
}

/// Trait for landmark sources
#[allow(async_fn_in_trait)]
pub trait LandmarkSource: Send {
    /// Wait for the next video frame
    async fn next_frame(&mut self) -> FramePoll;

    /// Detect zero or more hands in `frame`
    async fn detect_hands(&mut self, frame: &VideoFrame) -> Result<Vec<Hand>, DetectionError>;

    /// Detect at most one face in `frame`
    async fn detect_face(&mut self, frame: &VideoFrame) -> Result<Option<Face>, DetectionError>;
}

/// Detect hands, treating a missing frame, a detector error or invalid
/// landmark data as "no hands".
pub async fn detect_hands_or_empty<S: LandmarkSource>(
    source: &mut S,
    frame: Option<&VideoFrame>,
) -> Vec<Hand> {
    let Some(frame) = frame else {
        return Vec::new();
    };

    match source.detect_hands(frame).await {
        Ok(hands) => {
            let before = hands.len();
            let hands: Vec<Hand> = hands
                .into_iter()
                .filter(|h| h.landmarks.iter().all(|p| p.is_finite()))
                .collect();
            if hands.len() != before {
                warn!(
                    "Dropped {} hand(s) with non-finite landmarks on frame {}",
                    before - hands.len(),
                    frame.index
                );
            }
            hands
        }
        Err(e) => {
            warn!("Hand detection failed on frame {}: {}", frame.index, e);
            Vec::new()
        }
    }
}

/// Detect a face, treating a missing frame, a detector error or invalid
/// landmark data as "no face".
pub async fn detect_face_or_none<S: LandmarkSource>(
    source: &mut S,
    frame: Option<&VideoFrame>,
) -> Option<Face> {
    let frame = frame?;

    match source.detect_face(frame).await {
        Ok(Some(face)) => {
            let l = &face.landmarks;
            let finite = [l.left_eye, l.right_eye, l.nose, l.mouth]
                .iter()
                .all(|p| p.is_finite());
            if finite {
                Some(face)
            } else {
                debug!("Discarding face with non-finite landmarks on frame {}", frame.index);
                None
            }
        }
        Ok(None) => None,
        Err(e) => {
            warn!("Face detection failed on frame {}: {}", frame.index, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{FrameSize, Point};
    use crate::landmarks::Handedness;

    struct FailingSource;

    impl LandmarkSource for FailingSource {
        async fn next_frame(&mut self) -> FramePoll {
            FramePoll::NoFrame
        }

        async fn detect_hands(&mut self, _frame: &VideoFrame) -> Result<Vec<Hand>, DetectionError> {
            Err(DetectionError::Backend("model crashed".to_string()))
        }

        async fn detect_face(&mut self, _frame: &VideoFrame) -> Result<Option<Face>, DetectionError> {
            Err(DetectionError::NotInitialized)
        }
    }

    struct NanSource;

    impl LandmarkSource for NanSource {
        async fn next_frame(&mut self) -> FramePoll {
            FramePoll::Ended
        }

        async fn detect_hands(&mut self, _frame: &VideoFrame) -> Result<Vec<Hand>, DetectionError> {
            let mut points = vec![Point::new(1.0, 1.0); 21];
            points[3] = Point::new(f32::NAN, 0.0);
            Ok(vec![
                Hand::new(Handedness::Left, points),
                Hand::new(Handedness::Right, vec![Point::new(2.0, 2.0); 21]),
            ])
        }

        async fn detect_face(&mut self, _frame: &VideoFrame) -> Result<Option<Face>, DetectionError> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let frame = VideoFrame::blank(1, FrameSize::new(640, 480));
        let mut source = FailingSource;
        assert!(detect_hands_or_empty(&mut source, Some(&frame)).await.is_empty());
        assert!(detect_face_or_none(&mut source, Some(&frame)).await.is_none());
    }

    #[tokio::test]
    async fn test_no_frame_means_no_hands() {
        let mut source = NanSource;
        assert!(detect_hands_or_empty(&mut source, None).await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_hands_are_dropped() {
        let frame = VideoFrame::blank(7, FrameSize::new(640, 480));
        let mut source = NanSource;
        let hands = detect_hands_or_empty(&mut source, Some(&frame)).await;
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].handedness, Handedness::Right);
    }
}
