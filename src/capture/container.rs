//! Frame archive capture backend
//!
//! Buffers each composited frame as a PNG chunk and finalizes a recording
//! into a single MessagePack archive. No video codec is involved.

use chrono::{DateTime, Utc};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

use super::{CaptureBackend, CaptureHandle, EncodedMedia, MediaChunk, StreamInfo};
use crate::error::CaptureError;

pub const ARCHIVE_MIME_TYPE: &str = "application/vnd.pinchcast.frames+msgpack";
pub const ARCHIVE_EXTENSION: &str = "pcrec";
const ARCHIVE_VERSION: u32 = 1;

/// On-disk layout of a finalized recording
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameArchive {
    pub version: u32,
    pub capture_id: String,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub created_at: DateTime<Utc>,
    /// PNG-encoded frames in capture order
    pub frames: Vec<MediaChunk>,
}

impl FrameArchive {
    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::from_slice(bytes)
    }
}

/// In-process capture backend producing [`FrameArchive`]s
#[derive(Debug, Default)]
pub struct FrameArchiveCapture {
    active: HashMap<CaptureHandle, StreamInfo>,
}

impl FrameArchiveCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_captures(&self) -> usize {
        self.active.len()
    }
}

impl CaptureBackend for FrameArchiveCapture {
    async fn start_capture(&mut self, stream: &StreamInfo) -> Result<CaptureHandle, CaptureError> {
        if stream.size.is_empty() {
            return Err(CaptureError::NoStream);
        }
        let handle = CaptureHandle(Uuid::new_v4().to_string());
        debug!("Frame archive capture {} opened", handle);
        self.active.insert(handle.clone(), *stream);
        Ok(handle)
    }

    fn encode_frame(
        &mut self,
        handle: &CaptureHandle,
        frame: &RgbaImage,
        offset: Duration,
    ) -> Result<MediaChunk, CaptureError> {
        if !self.active.contains_key(handle) {
            return Err(CaptureError::UnknownHandle(handle.to_string()));
        }

        let mut data = Vec::new();
        PngEncoder::new(&mut data).write_image(
            frame.as_raw(),
            frame.width(),
            frame.height(),
            ExtendedColorType::Rgba8,
        )?;

        Ok(MediaChunk {
            sequence: 0,
            timestamp_ms: offset.as_millis() as u64,
            data,
        })
    }

    async fn stop_capture(
        &mut self,
        handle: CaptureHandle,
        chunks: Vec<MediaChunk>,
    ) -> Result<EncodedMedia, CaptureError> {
        let stream = self
            .active
            .remove(&handle)
            .ok_or_else(|| CaptureError::UnknownHandle(handle.to_string()))?;

        let archive = FrameArchive {
            version: ARCHIVE_VERSION,
            capture_id: handle.0,
            width: stream.size.width,
            height: stream.size.height,
            fps: stream.fps,
            created_at: Utc::now(),
            frames: chunks,
        };
        let data = rmp_serde::to_vec_named(&archive)?;
        info!(
            "Finalized frame archive: {} frames, {} bytes",
            archive.frames.len(),
            data.len()
        );

        Ok(EncodedMedia {
            mime_type: ARCHIVE_MIME_TYPE.to_string(),
            extension: ARCHIVE_EXTENSION.to_string(),
            data,
        })
    }

    fn release(&mut self, handle: CaptureHandle) {
        if self.active.remove(&handle).is_some() {
            debug!("Frame archive capture {} released", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::FrameSize;
    use image::Rgba;

    fn stream() -> StreamInfo {
        StreamInfo {
            size: FrameSize::new(4, 3),
            fps: 60,
        }
    }

    #[tokio::test]
    async fn test_archive_contains_decodable_frames() {
        let mut backend = FrameArchiveCapture::new();
        let handle = backend.start_capture(&stream()).await.unwrap();

        let frame = RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255]));
        let chunk = backend
            .encode_frame(&handle, &frame, Duration::from_millis(250))
            .unwrap();
        assert_eq!(chunk.timestamp_ms, 250);

        let media = backend.stop_capture(handle, vec![chunk]).await.unwrap();
        assert_eq!(media.extension, ARCHIVE_EXTENSION);
        assert_eq!(backend.active_captures(), 0);

        let archive = FrameArchive::from_msgpack(&media.data).unwrap();
        assert_eq!((archive.width, archive.height, archive.fps), (4, 3, 60));
        assert_eq!(archive.frames.len(), 1);

        let decoded = image::load_from_memory(&archive.frames[0].data).unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(2, 1), &Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn test_released_handle_is_unknown() {
        let mut backend = FrameArchiveCapture::new();
        let handle = backend.start_capture(&stream()).await.unwrap();
        backend.release(handle.clone());

        let frame = RgbaImage::new(4, 3);
        assert!(matches!(
            backend.encode_frame(&handle, &frame, Duration::ZERO),
            Err(CaptureError::UnknownHandle(_))
        ));
        assert!(backend.stop_capture(handle, Vec::new()).await.is_err());
    }
}
