//! Frame loop driver - ties detection, classification, interaction,
//! rendering and recording together once per tick

mod frame_loop;

pub use frame_loop::{coordinates_text, FrameLoop, TickOutcome};

use std::path::PathBuf;
use tokio::sync::{broadcast, mpsc};

use crate::render::FaceFilter;

/// Commands that can be sent to the frame loop
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Direct click on the record control
    ToggleRecording,
    /// Manually start recording
    StartRecording,
    /// Manually stop recording
    StopRecording,
    /// Switch the face decoration
    SetFaceFilter(FaceFilter),
    /// Tear the loop down, discarding any in-flight recording
    Shutdown,
}

/// Status updates from the frame loop
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    /// Not recording
    Idle,
    /// Recording is active
    Recording {
        /// Frames buffered so far
        frames: usize,
    },
    /// A recording was finalized and saved
    Saved { path: PathBuf },
    /// An error occurred
    Error(String),
}

/// Create command and status channels for the frame loop
pub fn create_engine_channels() -> (
    mpsc::Sender<EngineCommand>,
    mpsc::Receiver<EngineCommand>,
    broadcast::Sender<EngineStatus>,
    broadcast::Receiver<EngineStatus>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (status_tx, status_rx) = broadcast::channel(16);
    (cmd_tx, cmd_rx, status_tx, status_rx)
}
