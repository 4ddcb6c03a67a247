//! pinchcast
//!
//! Gesture classification and spatial interaction over a mirrored camera
//! overlay: hand landmarks in, gesture labels, pinch activation of on-screen
//! zones and a pinch-driven recording of the composited output out.

pub mod audio;
pub mod capture;
pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod interaction;
pub mod landmarks;
pub mod logging;
pub mod render;
pub mod session;
pub mod ui;
