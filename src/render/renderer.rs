use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, error};

use super::filters::{draw_face_filter, draw_hand_marker, FaceFilter};
use super::skeleton::draw_hand;
use super::Canvas;
use crate::error::RenderError;
use crate::landmarks::{Face, Hand};

/// Outcome of one render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderReport {
    pub drawn: usize,
    pub failed: usize,
}

/// Draws skeletons, hand markers and the face filter each tick.
///
/// Every routine runs behind its own boundary: an error or panic in one is
/// logged and the remaining routines still draw.
#[derive(Debug, Clone)]
pub struct OverlayRenderer {
    pub face_filter: FaceFilter,
    pub draw_skeleton: bool,
    pub hand_marker: bool,
    /// Animation step, advanced once per drawn face filter
    frame_counter: u64,
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self {
            face_filter: FaceFilter::None,
            draw_skeleton: true,
            hand_marker: true,
            frame_counter: 0,
        }
    }
}

impl OverlayRenderer {
    pub fn new(face_filter: FaceFilter, draw_skeleton: bool, hand_marker: bool) -> Self {
        Self {
            face_filter,
            draw_skeleton,
            hand_marker,
            frame_counter: 0,
        }
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn set_face_filter(&mut self, filter: FaceFilter) {
        if self.face_filter != filter {
            debug!("Face filter changed: {} -> {}", self.face_filter, filter);
            self.face_filter = filter;
        }
    }

    /// Clear the canvas and draw this tick's overlay
    pub fn render(&mut self, canvas: &mut Canvas, hands: &[Hand], face: Option<&Face>) -> RenderReport {
        canvas.clear();
        let mut report = RenderReport::default();

        for hand in hands {
            if self.draw_skeleton {
                guarded(&mut report, "skeleton", || draw_hand(canvas, hand));
            }
            if self.hand_marker {
                guarded(&mut report, "hand-marker", || draw_hand_marker(canvas, hand));
            }
        }

        let filter = self.face_filter;
        if let Some(face) = face {
            if filter != FaceFilter::None {
                self.frame_counter += 1;
                let frame = self.frame_counter;
                guarded(&mut report, filter.name(), || draw_face_filter(canvas, filter, face, frame));
            }
        }

        report
    }
}

fn guarded(report: &mut RenderReport, name: &str, draw: impl FnOnce() -> Result<(), RenderError>) {
    match catch_unwind(AssertUnwindSafe(draw)) {
        Ok(Ok(())) => report.drawn += 1,
        Ok(Err(e)) => {
            error!("Error rendering {}: {}", name, e);
            report.failed += 1;
        }
        Err(_) => {
            error!("Rendering {} panicked; skipped for this frame", name);
            report.failed += 1;
        }
    }
}
