//! Simulated landmark source
//!
//! Drives the engine without a camera or model: a swaying left hand that
//! appears intermittently and a face fixed at typical proportions of the
//! frame. Used by the binary when no replay file is given.

use std::time::Duration;

use super::source::{FramePoll, LandmarkSource};
use super::{BoundingBox, Face, FaceLandmarks, Hand, Handedness, Landmark, VideoFrame};
use crate::error::DetectionError;
use crate::geometry::{FrameSize, Point};

/// Wrist-relative offsets of the mock hand, as fractions of the frame size
const MOCK_HAND_OFFSETS: [(f32, f32); 21] = [
    (0.0, 0.0),
    (-0.05, -0.05),
    (-0.08, -0.08),
    (-0.10, -0.10),
    (-0.12, -0.12),
    (-0.02, -0.15),
    (-0.03, -0.20),
    (-0.04, -0.25),
    (-0.05, -0.30),
    (0.02, -0.18),
    (0.01, -0.23),
    (0.0, -0.28),
    (-0.01, -0.33),
    (0.06, -0.15),
    (0.05, -0.20),
    (0.04, -0.25),
    (0.03, -0.30),
    (0.10, -0.12),
    (0.09, -0.17),
    (0.08, -0.22),
    (0.07, -0.27),
];

/// Mock detector with a counter-driven hand
pub struct SimulatedSource {
    size: FrameSize,
    frame_index: u64,
    /// Advances once per hand detection
    counter: u64,
    /// Delay before each frame, standing in for detector latency
    latency: Duration,
    /// Stop after this many frames (None = run forever)
    frame_limit: Option<u64>,
}

impl SimulatedSource {
    pub fn new(size: FrameSize) -> Self {
        Self {
            size,
            frame_index: 0,
            counter: 0,
            latency: Duration::ZERO,
            frame_limit: None,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_frame_limit(mut self, limit: u64) -> Self {
        self.frame_limit = Some(limit);
        self
    }

    fn mock_hand(&self) -> Option<Hand> {
        // Visible on every third detection, and only inside the raised window
        if self.counter % 3 != 0 || self.counter % 8 >= 6 {
            return None;
        }

        let w = self.size.width as f32;
        let h = self.size.height as f32;
        let t = self.counter as f32;
        let base_x = w * (0.2 + (t * 0.1).sin() * 0.1);
        let base_y = h * (0.4 + (t * 0.08).cos() * 0.1);

        let landmarks: Vec<Landmark> = MOCK_HAND_OFFSETS
            .iter()
            .map(|&(dx, dy)| Point::new(base_x + w * dx, base_y + h * dy))
            .collect();

        Some(Hand {
            handedness: Handedness::Left,
            landmarks,
            is_raised: true,
            confidence: 0.8,
        })
    }

    fn mock_face(&self) -> Face {
        let w = self.size.width as f32;
        let h = self.size.height as f32;
        Face {
            bounding_box: BoundingBox {
                x: w * 0.25,
                y: h * 0.15,
                width: w * 0.5,
                height: h * 0.6,
            },
            landmarks: FaceLandmarks {
                left_eye: Point::new(w * 0.38, h * 0.32),
                right_eye: Point::new(w * 0.62, h * 0.32),
                nose: Point::new(w * 0.5, h * 0.42),
                mouth: Point::new(w * 0.5, h * 0.52),
            },
        }
    }
}

impl LandmarkSource for SimulatedSource {
    async fn next_frame(&mut self) -> FramePoll {
        if let Some(limit) = self.frame_limit {
            if self.frame_index >= limit {
                return FramePoll::Ended;
            }
        }
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.frame_index += 1;
        FramePoll::Frame(VideoFrame::blank(self.frame_index, self.size))
    }

    async fn detect_hands(&mut self, _frame: &VideoFrame) -> Result<Vec<Hand>, DetectionError> {
        self.counter += 1;
        Ok(self.mock_hand().into_iter().collect())
    }

    async fn detect_face(&mut self, _frame: &VideoFrame) -> Result<Option<Face>, DetectionError> {
        Ok(Some(self.mock_face()))
    }
}
