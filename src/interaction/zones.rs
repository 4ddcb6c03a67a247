//! Named on-screen hit targets

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use crate::geometry::{hit_test, FrameSize, Point, ScreenRect};

/// What a zone does to the recorder when activated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneAction {
    #[serde(alias = "start-recording")]
    Start,
    #[serde(alias = "stop-recording")]
    Stop,
    Toggle,
}

impl fmt::Display for ZoneAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneAction::Start => write!(f, "start"),
            ZoneAction::Stop => write!(f, "stop"),
            ZoneAction::Toggle => write!(f, "toggle"),
        }
    }
}

/// Supplies a zone's current screen rectangle.
///
/// Layout can change between ticks, so the rectangle is read on every hit
/// test. `None` means the zone is not on screen and never hits.
pub trait RectProvider: Send {
    fn screen_rect(&self) -> Option<ScreenRect>;
}

impl RectProvider for ScreenRect {
    fn screen_rect(&self) -> Option<ScreenRect> {
        Some(*self)
    }
}

impl<F> RectProvider for F
where
    F: Fn() -> Option<ScreenRect> + Send,
{
    fn screen_rect(&self) -> Option<ScreenRect> {
        self()
    }
}

/// A named screen-space region bound to a recorder action
pub struct InteractiveZone {
    name: String,
    action: ZoneAction,
    rect: Box<dyn RectProvider>,
}

impl InteractiveZone {
    pub fn new(name: impl Into<String>, rect: impl RectProvider + 'static, action: ZoneAction) -> Self {
        Self {
            name: name.into(),
            action,
            rect: Box::new(rect),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> ZoneAction {
        self.action
    }

    pub fn screen_rect(&self) -> Option<ScreenRect> {
        self.rect.screen_rect()
    }

    /// Hit-test a canvas-space point through the mirrored canvas
    pub fn contains(&self, point: Point, canvas: FrameSize, canvas_rect: ScreenRect) -> bool {
        match self.screen_rect() {
            Some(rect) => hit_test(point, rect, canvas, canvas_rect),
            None => {
                debug!("Zone {:?} has no screen rect; skipping hit test", self.name);
                false
            }
        }
    }
}

impl fmt::Debug for InteractiveZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractiveZone")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("rect", &self.screen_rect())
            .finish()
    }
}

/// Zones in registration order; earlier zones win overlapping hits
#[derive(Debug, Default)]
pub struct ZoneRegistry {
    zones: Vec<InteractiveZone>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a zone. A zone registered under an existing name replaces it
    /// in place.
    pub fn register_zone(
        &mut self,
        name: impl Into<String>,
        rect: impl RectProvider + 'static,
        action: ZoneAction,
    ) -> &mut Self {
        let zone = InteractiveZone::new(name, rect, action);
        match self.zones.iter_mut().find(|z| z.name == zone.name) {
            Some(existing) => {
                warn!("Zone {:?} registered twice; replacing", zone.name);
                *existing = zone;
            }
            None => {
                debug!("Registered zone {:?} ({})", zone.name, zone.action);
                self.zones.push(zone);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&InteractiveZone> {
        self.zones.iter().find(|z| z.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractiveZone> {
        self.zones.iter()
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// First zone containing the point, in registration order
    pub fn find_hit(&self, point: Point, canvas: FrameSize, canvas_rect: ScreenRect) -> Option<&InteractiveZone> {
        self.zones.iter().find(|z| z.contains(point, canvas, canvas_rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    const CANVAS: FrameSize = FrameSize::new(640, 480);
    const CANVAS_RECT: ScreenRect = ScreenRect::new(0.0, 0.0, 640.0, 480.0);

    #[test]
    fn test_mirrored_hit() {
        let mut registry = ZoneRegistry::new();
        // Left edge of the screen is the right edge of the canvas
        registry.register_zone("start", ScreenRect::new(0.0, 0.0, 100.0, 100.0), ZoneAction::Start);

        assert!(registry.find_hit(Point::new(600.0, 50.0), CANVAS, CANVAS_RECT).is_some());
        assert!(registry.find_hit(Point::new(40.0, 50.0), CANVAS, CANVAS_RECT).is_none());
    }

    #[test]
    fn test_absent_rect_never_hits() {
        let visible = Arc::new(AtomicBool::new(false));
        let flag = visible.clone();
        let mut registry = ZoneRegistry::new();
        registry.register_zone(
            "stop",
            move || flag.load(Ordering::SeqCst).then(|| ScreenRect::new(0.0, 0.0, 640.0, 480.0)),
            ZoneAction::Stop,
        );

        let p = Point::new(320.0, 240.0);
        assert!(registry.find_hit(p, CANVAS, CANVAS_RECT).is_none());
        visible.store(true, Ordering::SeqCst);
        assert_eq!(registry.find_hit(p, CANVAS, CANVAS_RECT).map(|z| z.name()), Some("stop"));
    }

    #[test]
    fn test_first_registered_wins_and_reregister_replaces() {
        let whole = ScreenRect::new(0.0, 0.0, 640.0, 480.0);
        let mut registry = ZoneRegistry::new();
        registry
            .register_zone("a", whole, ZoneAction::Start)
            .register_zone("b", whole, ZoneAction::Stop);

        let p = Point::new(10.0, 10.0);
        assert_eq!(registry.find_hit(p, CANVAS, CANVAS_RECT).map(|z| z.name()), Some("a"));

        registry.register_zone("a", ScreenRect::new(-10.0, -10.0, 1.0, 1.0), ZoneAction::Toggle);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("a").map(|z| z.action()), Some(ZoneAction::Toggle));
        assert_eq!(registry.find_hit(p, CANVAS, CANVAS_RECT).map(|z| z.name()), Some("b"));
    }

    #[test]
    fn test_action_names() {
        let action: ZoneAction = serde_json::from_str("\"start-recording\"").unwrap();
        assert_eq!(action, ZoneAction::Start);
        assert_eq!(ZoneAction::Toggle.to_string(), "toggle");
    }
}
