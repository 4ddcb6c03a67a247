//! Per-tick detection data: hands, faces and the frame they came from
//!
//! Everything here is produced fresh by a landmark source each tick and is
//! never mutated by the engine.

pub mod replay;
pub mod simulated;
mod source;

pub use source::{detect_face_or_none, detect_hands_or_empty, FramePoll, LandmarkSource};

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::geometry::{FrameSize, Point};

/// A tracked keypoint in video pixel space (not normalized)
pub type Landmark = Point;

/// Number of landmarks in a complete hand
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Hand landmark indices (MediaPipe hand model convention)
pub mod index {
    pub const WRIST: usize = 0;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_MCP: usize = 5;
    pub const INDEX_TIP: usize = 8;
    pub const MIDDLE_MCP: usize = 9;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_MCP: usize = 13;
    pub const RING_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_TIP: usize = 20;
}

/// Which hand the detector believes it saw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Handedness {
    Left,
    Right,
    #[default]
    #[serde(other)]
    Unknown,
}

impl std::fmt::Display for Handedness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handedness::Left => write!(f, "Left"),
            Handedness::Right => write!(f, "Right"),
            Handedness::Unknown => write!(f, "Unknown"),
        }
    }
}

/// One detected hand
#[derive(Debug, Clone, PartialEq)]
pub struct Hand {
    pub handedness: Handedness,
    /// Ordered landmarks; complete hands have exactly 21
    pub landmarks: Vec<Landmark>,
    pub is_raised: bool,
    /// Pose confidence in [0, 1]
    pub confidence: f32,
}

impl Hand {
    pub fn new(handedness: Handedness, landmarks: Vec<Landmark>) -> Self {
        Self {
            handedness,
            landmarks,
            is_raised: false,
            confidence: 0.0,
        }
    }

    /// True when all 21 landmarks are present
    pub fn is_complete(&self) -> bool {
        self.landmarks.len() >= HAND_LANDMARK_COUNT
    }

    pub fn landmark(&self, idx: usize) -> Option<Landmark> {
        self.landmarks.get(idx).copied()
    }

    pub fn wrist(&self) -> Option<Landmark> {
        self.landmark(index::WRIST)
    }

    pub fn thumb_tip(&self) -> Option<Landmark> {
        self.landmark(index::THUMB_TIP)
    }

    pub fn index_tip(&self) -> Option<Landmark> {
        self.landmark(index::INDEX_TIP)
    }
}

/// Face bounding box in video pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The fixed set of face keypoints used by the filters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceLandmarks {
    pub left_eye: Landmark,
    pub right_eye: Landmark,
    pub nose: Landmark,
    pub mouth: Landmark,
}

/// One detected face
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Face {
    pub bounding_box: BoundingBox,
    pub landmarks: FaceLandmarks,
}

/// A video frame handed to the detectors.
///
/// Pixels are optional: sources that only replay landmarks know the frame
/// size but carry no image.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Monotonic frame number from the source
    pub index: u64,
    pub size: FrameSize,
    pub pixels: Option<Arc<RgbaImage>>,
}

impl VideoFrame {
    pub fn blank(index: u64, size: FrameSize) -> Self {
        Self {
            index,
            size,
            pixels: None,
        }
    }
}
