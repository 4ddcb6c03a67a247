//! Recording pipeline
//!
//! The [`Recorder`] state machine owns at most one [`RecordingSession`] and
//! drives a [`CaptureBackend`] through start, per-frame encode and
//! finalization. Finalized media is handed to a [`MediaSink`].

pub mod container;
pub mod recording;
pub mod sink;

pub use container::FrameArchiveCapture;
pub use recording::{FinishedRecording, Recorder, RecordingSession, RecordingState, Transition};
pub use sink::FileSink;

use chrono::{DateTime, Utc};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CaptureError;
use crate::geometry::FrameSize;

/// Description of the composited stream being recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamInfo {
    pub size: FrameSize,
    pub fps: u32,
}

/// Opaque token identifying an active capture in a backend
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub String);

impl std::fmt::Display for CaptureHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One encoded segment of a recording
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaChunk {
    /// Position of the segment within the recording
    pub sequence: u64,
    /// Offset from the start of the recording, in milliseconds
    pub timestamp_ms: u64,
    /// Stored as msgpack bin rather than an array of integers
    #[serde(with = "serde_bytes")]
    pub data: Vec<u8>,
}

/// A finalized recording, ready to save
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMedia {
    pub mime_type: String,
    /// File extension without the dot
    pub extension: String,
    pub data: Vec<u8>,
}

/// External media pipeline the recorder drives
#[allow(async_fn_in_trait)]
pub trait CaptureBackend: Send {
    /// Begin buffering the given stream
    async fn start_capture(&mut self, stream: &StreamInfo) -> Result<CaptureHandle, CaptureError>;

    /// Encode one composited frame into a chunk
    fn encode_frame(
        &mut self,
        handle: &CaptureHandle,
        frame: &RgbaImage,
        offset: Duration,
    ) -> Result<MediaChunk, CaptureError>;

    /// Finalize the buffered chunks into one media blob
    async fn stop_capture(
        &mut self,
        handle: CaptureHandle,
        chunks: Vec<MediaChunk>,
    ) -> Result<EncodedMedia, CaptureError>;

    /// Drop an active capture without finalizing it
    fn release(&mut self, handle: CaptureHandle);
}

/// Destination for finalized recordings
#[allow(async_fn_in_trait)]
pub trait MediaSink: Send {
    /// Persist the media and return where it went
    async fn save(&mut self, media: &EncodedMedia, suggested_filename: &str) -> anyhow::Result<PathBuf>;
}

/// `<prefix>-YYYY-MM-DDTHH-MM-SS.<ext>` in UTC
pub fn recording_filename(prefix: &str, at: DateTime<Utc>, extension: &str) -> String {
    format!("{}-{}.{}", prefix, at.format("%Y-%m-%dT%H-%M-%S"), extension)
}
