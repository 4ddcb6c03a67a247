//! Presentation sinks
//!
//! The frame loop pushes discrete UI state through a [`UiSink`]: the
//! gesture readout, the coordinates text, the recording indicator, per-zone
//! hover highlights, error banners and the voice level bar.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info};

/// Receiver for UI updates. Called once per tick with current values.
pub trait UiSink: Send {
    /// Empty text hides the label
    fn set_gesture_label(&mut self, text: &str);

    /// Empty text hides the readout
    fn set_coordinates_text(&mut self, text: &str);

    fn set_recording_indicator(&mut self, recording: bool);

    fn set_zone_hover(&mut self, zone: &str, hovered: bool);

    fn show_error(&mut self, message: &str);

    /// Level in [0, 1]
    fn set_voice_level(&mut self, level: f32);
}

/// Everything a sink has been told, latest value per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UiSnapshot {
    pub gesture_label: String,
    pub coordinates_text: String,
    pub recording: bool,
    pub hovered_zones: HashMap<String, bool>,
    pub errors: Vec<String>,
    pub voice_level: f32,
}

impl UiSnapshot {
    pub fn is_hovered(&self, zone: &str) -> bool {
        self.hovered_zones.get(zone).copied().unwrap_or(false)
    }
}

/// Headless sink that logs state changes through `tracing`
#[derive(Debug, Default)]
pub struct LogUi {
    last: UiSnapshot,
    last_voice_percent: u8,
}

impl LogUi {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UiSink for LogUi {
    fn set_gesture_label(&mut self, text: &str) {
        if self.last.gesture_label != text {
            if !text.is_empty() {
                info!("Gesture: {}", text);
            }
            self.last.gesture_label = text.to_string();
        }
    }

    fn set_coordinates_text(&mut self, text: &str) {
        if self.last.coordinates_text != text {
            debug!("{}", text.replace('\n', " | "));
            self.last.coordinates_text = text.to_string();
        }
    }

    fn set_recording_indicator(&mut self, recording: bool) {
        if self.last.recording != recording {
            info!("{}", if recording { "● REC" } else { "Recording indicator off" });
            self.last.recording = recording;
        }
    }

    fn set_zone_hover(&mut self, zone: &str, hovered: bool) {
        let previous = self.last.hovered_zones.insert(zone.to_string(), hovered);
        if previous != Some(hovered) && hovered {
            debug!("Pinch hovering over zone {:?}", zone);
        }
    }

    fn show_error(&mut self, message: &str) {
        error!("{}", message);
        self.last.errors.push(message.to_string());
    }

    fn set_voice_level(&mut self, level: f32) {
        let percent = crate::audio::level_percent(level);
        // Log in 10% steps
        if percent / 10 != self.last_voice_percent / 10 {
            debug!("Voice Level: {}", percent);
        }
        self.last_voice_percent = percent;
        self.last.voice_level = level;
    }
}

/// Sink that records into a shared snapshot, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct SharedUi {
    state: Arc<Mutex<UiSnapshot>>,
}

impl SharedUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> UiSnapshot {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn update(&self, f: impl FnOnce(&mut UiSnapshot)) {
        if let Ok(mut state) = self.state.lock() {
            f(&mut state);
        }
    }
}

impl UiSink for SharedUi {
    fn set_gesture_label(&mut self, text: &str) {
        self.update(|s| s.gesture_label = text.to_string());
    }

    fn set_coordinates_text(&mut self, text: &str) {
        self.update(|s| s.coordinates_text = text.to_string());
    }

    fn set_recording_indicator(&mut self, recording: bool) {
        self.update(|s| s.recording = recording);
    }

    fn set_zone_hover(&mut self, zone: &str, hovered: bool) {
        self.update(|s| {
            s.hovered_zones.insert(zone.to_string(), hovered);
        });
    }

    fn show_error(&mut self, message: &str) {
        self.update(|s| s.errors.push(message.to_string()));
    }

    fn set_voice_level(&mut self, level: f32) {
        self.update(|s| s.voice_level = level);
    }
}
