//! Replay landmark source
//!
//! Reads newline-delimited JSON detection snapshots, one per frame, so an
//! external detector (or a recorded session) can drive the engine:
//!
//! ```json
//! {"width":1280,"height":720,"hands":[{"handedness":"Right","landmarks":[{"x":1,"y":2}, ...]}],"face":null}
//! ```
//!
//! `isRaised` and `confidence` are optional per hand; when absent they are
//! derived from the landmarks.

use serde::Deserialize;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use super::source::{FramePoll, LandmarkSource};
use super::{Face, Hand, Handedness, Landmark, VideoFrame};
use crate::error::DetectionError;
use crate::geometry::FrameSize;
use crate::gesture::posture;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HandRecord {
    #[serde(default)]
    handedness: Handedness,
    landmarks: Vec<Landmark>,
    is_raised: Option<bool>,
    confidence: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    width: u32,
    height: u32,
    #[serde(default)]
    hands: Vec<HandRecord>,
    #[serde(default)]
    face: Option<Face>,
}

impl HandRecord {
    fn into_hand(self, frame_height: f32) -> Hand {
        let derived = posture::annotate(Hand::new(self.handedness, self.landmarks), frame_height);
        Hand {
            is_raised: self.is_raised.unwrap_or(derived.is_raised),
            confidence: self
                .confidence
                .map(|c| c.clamp(0.0, 1.0))
                .unwrap_or(derived.confidence),
            ..derived
        }
    }
}

/// Line-at-a-time detection replay
pub struct ReplaySource<R> {
    lines: LinesStream<BufReader<R>>,
    line_number: usize,
    frame_index: u64,
    last_size: FrameSize,
    /// Detection result for the frame most recently returned
    current: Option<Result<FrameRecord, DetectionError>>,
}

impl ReplaySource<File> {
    /// Open an NDJSON replay file
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).await?;
        info!("Replaying detections from {:?}", path);
        Ok(Self::from_reader(file))
    }
}

impl<R: AsyncRead + Unpin + Send> ReplaySource<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: LinesStream::new(BufReader::new(reader).lines()),
            line_number: 0,
            frame_index: 0,
            last_size: FrameSize::new(0, 0),
            current: None,
        }
    }

    fn current_record(&self, frame: &VideoFrame) -> Result<&FrameRecord, DetectionError> {
        match self.current.as_ref() {
            Some(Ok(record)) => Ok(record),
            Some(Err(DetectionError::Malformed { line, .. })) => Err(DetectionError::Backend(format!(
                "frame {} came from malformed line {}",
                frame.index, line
            ))),
            Some(Err(e)) => Err(DetectionError::Backend(e.to_string())),
            None => Err(DetectionError::NotInitialized),
        }
    }
}

impl<R: AsyncRead + Unpin + Send> LandmarkSource for ReplaySource<R> {
    async fn next_frame(&mut self) -> FramePoll {
        loop {
            let line = match self.lines.next().await {
                Some(Ok(line)) => line,
                Some(Err(e)) => {
                    warn!("Replay stream read failed: {}", e);
                    return FramePoll::Ended;
                }
                None => {
                    debug!("Replay finished after {} frames", self.frame_index);
                    return FramePoll::Ended;
                }
            };
            self.line_number += 1;

            if line.trim().is_empty() {
                continue;
            }

            self.frame_index += 1;
            match serde_json::from_str::<FrameRecord>(&line) {
                Ok(record) => {
                    self.last_size = FrameSize::new(record.width, record.height);
                    self.current = Some(Ok(record));
                }
                Err(source) => {
                    // Keep the frame so the tick still runs; detection reports the failure
                    self.current = Some(Err(DetectionError::Malformed {
                        line: self.line_number,
                        source,
                    }));
                }
            }
            return FramePoll::Frame(VideoFrame::blank(self.frame_index, self.last_size));
        }
    }

    async fn detect_hands(&mut self, frame: &VideoFrame) -> Result<Vec<Hand>, DetectionError> {
        let height = frame.size.height as f32;
        let record = self.current_record(frame)?;
        Ok(record
            .hands
            .iter()
            .cloned()
            .map(|h| h.into_hand(height))
            .collect())
    }

    async fn detect_face(&mut self, frame: &VideoFrame) -> Result<Option<Face>, DetectionError> {
        Ok(self.current_record(frame)?.face)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand_json(x: f32) -> String {
        let points: Vec<String> = (0..21)
            .map(|i| format!(r#"{{"x":{},"y":{}}}"#, x + i as f32, 300.0 - i as f32))
            .collect();
        format!(r#"{{"handedness":"Right","landmarks":[{}]}}"#, points.join(","))
    }

    #[tokio::test]
    async fn test_replays_frames_in_order() {
        let input = format!(
            "{{\"width\":640,\"height\":480,\"hands\":[{}]}}\n\n{{\"width\":640,\"height\":480}}\n",
            hand_json(100.0)
        );
        let mut source = ReplaySource::from_reader(input.as_bytes());

        let FramePoll::Frame(first) = source.next_frame().await else {
            panic!("expected a frame");
        };
        assert_eq!(first.size, FrameSize::new(640, 480));
        let hands = source.detect_hands(&first).await.unwrap();
        assert_eq!(hands.len(), 1);
        assert_eq!(hands[0].handedness, Handedness::Right);
        assert!(hands[0].confidence > 0.0);

        let FramePoll::Frame(second) = source.next_frame().await else {
            panic!("expected a frame");
        };
        assert_eq!(second.index, 2);
        assert!(source.detect_hands(&second).await.unwrap().is_empty());
        assert!(source.detect_face(&second).await.unwrap().is_none());

        assert!(matches!(source.next_frame().await, FramePoll::Ended));
    }

    #[tokio::test]
    async fn test_malformed_line_fails_detection_only() {
        let input = "{\"width\":320,\"height\":240}\nnot json\n";
        let mut source = ReplaySource::from_reader(input.as_bytes());

        assert!(matches!(source.next_frame().await, FramePoll::Frame(_)));
        let FramePoll::Frame(bad) = source.next_frame().await else {
            panic!("malformed line still yields a frame");
        };
        // Size carries over from the last good record
        assert_eq!(bad.size, FrameSize::new(320, 240));
        assert!(source.detect_hands(&bad).await.is_err());
    }

    #[tokio::test]
    async fn test_supplied_flags_win() {
        let input = format!(
            "{{\"width\":640,\"height\":480,\"hands\":[{}]}}\n",
            hand_json(10.0).replace("\"handedness\"", "\"isRaised\":true,\"confidence\":0.5,\"handedness\"")
        );
        let mut source = ReplaySource::from_reader(input.as_bytes());
        let FramePoll::Frame(frame) = source.next_frame().await else {
            panic!("expected a frame");
        };
        let hands = source.detect_hands(&frame).await.unwrap();
        assert!(hands[0].is_raised);
        assert_eq!(hands[0].confidence, 0.5);
    }
}
