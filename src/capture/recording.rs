//! Recording state machine
//!
//! `Idle --start--> Recording --stop--> Idle`. Starting while recording and
//! stopping while idle are no-ops that never reach the backend. Any backend
//! failure drops the session and returns to `Idle` without producing a file.

use chrono::Utc;
use image::RgbaImage;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{recording_filename, CaptureBackend, CaptureHandle, EncodedMedia, MediaChunk, StreamInfo};
use crate::error::CaptureError;

/// Recording state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordingState {
    #[default]
    Idle,
    Recording,
}

/// The single in-flight recording
#[derive(Debug)]
pub struct RecordingSession {
    pub id: Uuid,
    handle: CaptureHandle,
    started_at: Instant,
    chunks: Vec<MediaChunk>,
}

impl RecordingSession {
    pub fn frame_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }
}

/// Output of a successful stop
#[derive(Debug, Clone)]
pub struct FinishedRecording {
    pub session_id: Uuid,
    pub frames: usize,
    pub media: EncodedMedia,
    pub suggested_filename: String,
}

/// Result of a state machine request
#[derive(Debug)]
pub enum Transition {
    /// Request was a no-op in the current state
    Unchanged,
    Started,
    Stopped(FinishedRecording),
}

/// Owns the capture backend and the optional active session
pub struct Recorder<B> {
    backend: B,
    filename_prefix: String,
    session: Option<RecordingSession>,
}

impl<B: CaptureBackend> Recorder<B> {
    pub fn new(backend: B, filename_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            filename_prefix: filename_prefix.into(),
            session: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        if self.session.is_some() {
            RecordingState::Recording
        } else {
            RecordingState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&RecordingSession> {
        self.session.as_ref()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Start recording
    pub async fn start(&mut self, stream: &StreamInfo, now: Instant) -> Result<Transition, CaptureError> {
        if self.session.is_some() {
            debug!("Recording already started");
            return Ok(Transition::Unchanged);
        }
        if stream.size.is_empty() {
            return Err(CaptureError::NoStream);
        }

        let handle = self.backend.start_capture(stream).await?;
        let id = Uuid::new_v4();
        info!(
            "Recording started (session {}, {}x{} @ {} fps)",
            id, stream.size.width, stream.size.height, stream.fps
        );
        self.session = Some(RecordingSession {
            id,
            handle,
            started_at: now,
            chunks: Vec::new(),
        });
        Ok(Transition::Started)
    }

    /// Stop recording and finalize the session
    pub async fn stop(&mut self) -> Result<Transition, CaptureError> {
        let Some(session) = self.session.take() else {
            debug!("Recording already stopped");
            return Ok(Transition::Unchanged);
        };

        let frames = session.chunks.len();
        info!("Stopping recording (session {}, {} frames)", session.id, frames);
        let media = self.backend.stop_capture(session.handle, session.chunks).await?;
        let suggested_filename = recording_filename(&self.filename_prefix, Utc::now(), &media.extension);

        Ok(Transition::Stopped(FinishedRecording {
            session_id: session.id,
            frames,
            media,
            suggested_filename,
        }))
    }

    /// Start when idle, stop when recording
    pub async fn toggle(&mut self, stream: &StreamInfo, now: Instant) -> Result<Transition, CaptureError> {
        if self.is_recording() {
            self.stop().await
        } else {
            self.start(stream, now).await
        }
    }

    /// Buffer one composited frame. Ignored while idle.
    ///
    /// An encode failure aborts the session.
    pub fn push_frame(&mut self, frame: &RgbaImage, now: Instant) -> Result<(), CaptureError> {
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        let offset = now.saturating_duration_since(session.started_at);
        match self.backend.encode_frame(&session.handle, frame, offset) {
            Ok(mut chunk) => {
                chunk.sequence = session.chunks.len() as u64;
                session.chunks.push(chunk);
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    /// Discard the active session without finalizing it
    pub fn abort(&mut self) {
        if let Some(session) = self.session.take() {
            warn!(
                "Discarding recording session {} ({} buffered frames)",
                session.id,
                session.chunks.len()
            );
            self.backend.release(session.handle);
        }
    }
}
