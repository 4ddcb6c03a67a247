//! Typed failures for the per-frame engine
//!
//! Each enum maps to one recovery policy: detection failures degrade to an
//! empty tick, render failures are contained to the filter that raised them,
//! and capture failures drop the recorder back to idle.

use thiserror::Error;

/// Landmark source failed for the current tick
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("detector is not initialized")]
    NotInitialized,

    #[error("detector backend failed: {0}")]
    Backend(String),

    #[error("malformed detection record at line {line}: {source}")]
    Malformed {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read detection stream: {0}")]
    Io(#[from] std::io::Error),
}

/// A single overlay routine could not be drawn
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("filter '{filter}' received non-finite geometry")]
    NonFiniteGeometry { filter: &'static str },

    #[error("filter '{filter}' received a degenerate face box ({width}x{height})")]
    DegenerateFace {
        filter: &'static str,
        width: f32,
        height: f32,
    },

    #[error("filter '{filter}' face box ({width}x{height}) is far larger than the canvas")]
    OversizedFace {
        filter: &'static str,
        width: f32,
        height: f32,
    },

    #[error("hand has {0} landmarks, expected 21")]
    IncompleteHand(usize),
}

/// Media pipeline failure while starting, feeding or finalizing a recording
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture stream has no frame size yet")]
    NoStream,

    #[error("capture handle {0} is not active")]
    UnknownHandle(String),

    #[error("failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("failed to finalize recording: {0}")]
    Finalize(#[from] rmp_serde::encode::Error),

    #[error("capture backend failed: {0}")]
    Backend(String),
}
