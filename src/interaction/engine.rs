//! Debounced zone activation
//!
//! A pinch over a zone activates it at most once per cooldown window. The
//! cooldown is engine-wide: while it runs, no zone activates, including a
//! different one than the zone that armed it. Time is passed in by the caller
//! so the window is measured on a monotonic clock, independent of frame rate.

use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::pinch::PinchEvent;
use super::zones::{InteractiveZone, ZoneRegistry};
use crate::geometry::{FrameSize, ScreenRect};

/// Minimum interval between two zone activations
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone)]
pub struct InteractionEngine {
    cooldown: Duration,
    /// Activations are suppressed until this instant
    deadline: Option<Instant>,
}

impl Default for InteractionEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl InteractionEngine {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            deadline: None,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn is_cooling_down(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|deadline| now < deadline)
    }

    /// Time left before another activation may fire
    pub fn remaining(&self, now: Instant) -> Duration {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }

    /// Return the zone this pinch activates, arming the cooldown if any.
    pub fn resolve_activation<'z>(
        &mut self,
        pinch: &PinchEvent,
        zones: &'z ZoneRegistry,
        canvas: FrameSize,
        canvas_rect: ScreenRect,
        now: Instant,
    ) -> Option<&'z InteractiveZone> {
        let point = pinch.position()?;
        if self.is_cooling_down(now) {
            return None;
        }

        let zone = zones.find_hit(point, canvas, canvas_rect)?;
        self.deadline = Some(now + self.cooldown);
        info!(
            "Pinch activated zone {:?} ({}); cooldown {:?}",
            zone.name(),
            zone.action(),
            self.cooldown
        );
        Some(zone)
    }

    /// Zones under an active pinch. Ignores and does not arm the cooldown.
    pub fn hovered<'z>(
        &self,
        pinch: &PinchEvent,
        zones: &'z ZoneRegistry,
        canvas: FrameSize,
        canvas_rect: ScreenRect,
    ) -> Vec<&'z InteractiveZone> {
        match pinch.position() {
            Some(point) => zones
                .iter()
                .filter(|z| z.contains(point, canvas, canvas_rect))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Clear any running cooldown
    pub fn reset(&mut self) {
        if self.deadline.take().is_some() {
            debug!("Interaction cooldown cleared");
        }
    }
}
