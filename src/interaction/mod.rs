//! Pinch detection, on-screen zones and debounced zone activation

pub mod engine;
pub mod pinch;
pub mod zones;

pub use engine::{InteractionEngine, DEFAULT_COOLDOWN};
pub use pinch::{compute_pinch, PinchEvent};
pub use zones::{InteractiveZone, RectProvider, ZoneAction, ZoneRegistry};
