//! Configuration management for pinchcast

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geometry::{FrameSize, ScreenRect};
use crate::gesture::{resolution_scale, GestureProfile, GestureThresholds, PINCH_THRESHOLD_PX};
use crate::interaction::{ZoneAction, ZoneRegistry, DEFAULT_COOLDOWN};
use crate::render::FaceFilter;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gesture: GestureConfig,

    #[serde(default)]
    pub interaction: InteractionConfig,

    #[serde(default)]
    pub recording: RecordingConfig,

    #[serde(default)]
    pub overlay: OverlayConfig,

    /// Screen placement of the canvas and the recording zones
    #[serde(default)]
    pub layout: LayoutConfig,

    #[serde(default, rename = "loop")]
    pub frame_loop: LoopConfig,

    /// Path to config file (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureConfig {
    /// Threshold set: `full` or `compact`
    #[serde(default)]
    pub profile: GestureProfile,

    /// Resolution the thresholds are authored at
    #[serde(default = "default_reference_width")]
    pub reference_width: u32,

    #[serde(default = "default_reference_height")]
    pub reference_height: u32,

    /// Scale pixel thresholds to the video's native resolution
    #[serde(default = "default_true")]
    pub scale_with_resolution: bool,

    /// Report the middle-finger point posture as its own gesture
    #[serde(default)]
    pub report_middle_point: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionConfig {
    /// Thumb/index distance that counts as a pinch, at the reference resolution
    #[serde(default = "default_pinch_threshold")]
    pub pinch_threshold_px: f32,

    /// Minimum time between two zone activations (ms)
    #[serde(default = "default_cooldown_ms")]
    pub cooldown_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordingConfig {
    /// Where finished recordings are saved
    #[serde(default = "default_recording_output_directory_option")]
    pub output_directory: Option<PathBuf>,

    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,

    /// Record the selfie (mirrored) view rather than the raw frame
    #[serde(default = "default_true")]
    pub mirror_output: bool,

    /// Whether to start recording automatically on launch
    #[serde(default)]
    pub autostart_on_launch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default)]
    pub face_filter: FaceFilter,

    #[serde(default = "default_true")]
    pub draw_skeleton: bool,

    /// Mark the index tip of raised hands
    #[serde(default = "default_true")]
    pub hand_marker: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// On-screen rectangle of the mirrored canvas
    #[serde(default = "default_canvas_rect")]
    pub canvas_rect: ScreenRect,

    #[serde(default = "default_zones")]
    pub zones: Vec<ZoneConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneConfig {
    pub name: String,
    pub action: ZoneAction,
    pub rect: ScreenRect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Tick rate standing in for the display refresh
    #[serde(default = "default_target_fps")]
    pub target_fps: u32,
}

// Default value functions
fn default_true() -> bool {
    true
}

fn default_reference_width() -> u32 {
    crate::gesture::REFERENCE_RESOLUTION.width
}

fn default_reference_height() -> u32 {
    crate::gesture::REFERENCE_RESOLUTION.height
}

fn default_pinch_threshold() -> f32 {
    PINCH_THRESHOLD_PX
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN.as_millis() as u64
}

fn default_recording_output_directory() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|dirs| dirs.video_dir().map(|d| d.join("pinchcast")))
        .unwrap_or_else(|| std::env::temp_dir().join("pinchcast-recordings"))
}

fn default_recording_output_directory_option() -> Option<PathBuf> {
    Some(default_recording_output_directory())
}

fn default_filename_prefix() -> String {
    "ar-recording".to_string()
}

fn default_canvas_rect() -> ScreenRect {
    ScreenRect::new(0.0, 0.0, 1280.0, 720.0)
}

/// Start and stop buttons side by side along the bottom edge
fn default_zones() -> Vec<ZoneConfig> {
    vec![
        ZoneConfig {
            name: "start-recording".to_string(),
            action: ZoneAction::Start,
            rect: ScreenRect::new(420.0, 600.0, 200.0, 80.0),
        },
        ZoneConfig {
            name: "stop-recording".to_string(),
            action: ZoneAction::Stop,
            rect: ScreenRect::new(660.0, 600.0, 200.0, 80.0),
        },
    ]
}

fn default_target_fps() -> u32 {
    60
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            profile: GestureProfile::default(),
            reference_width: default_reference_width(),
            reference_height: default_reference_height(),
            scale_with_resolution: true,
            report_middle_point: false,
        }
    }
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            pinch_threshold_px: default_pinch_threshold(),
            cooldown_ms: default_cooldown_ms(),
        }
    }
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            output_directory: default_recording_output_directory_option(),
            filename_prefix: default_filename_prefix(),
            mirror_output: true,
            autostart_on_launch: false,
        }
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            face_filter: FaceFilter::default(),
            draw_skeleton: true,
            hand_marker: true,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas_rect: default_canvas_rect(),
            zones: default_zones(),
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            target_fps: default_target_fps(),
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it is missing
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = path.into();

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

            let mut config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;

            config.config_path = Some(config_path);
            Ok(config)
        } else {
            let config = Config {
                config_path: Some(config_path),
                ..Config::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    /// Get the config file path
    pub fn config_path(&self) -> Result<PathBuf> {
        match &self.config_path {
            Some(path) => Ok(path.clone()),
            None => Self::default_config_path(),
        }
    }

    /// Get default config path
    fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = directories::ProjectDirs::from("dev", "pinchcast", "pinchcast")
            .context("Failed to determine config directory")?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    pub fn reference_resolution(&self) -> FrameSize {
        FrameSize::new(self.gesture.reference_width, self.gesture.reference_height)
    }

    /// Classifier and pinch thresholds for a video of the given size
    pub fn thresholds_for(&self, frame: FrameSize) -> GestureThresholds {
        let mut thresholds = GestureThresholds::for_profile(self.gesture.profile)
            .with_middle_point(self.gesture.report_middle_point);
        thresholds.pinch = self.interaction.pinch_threshold_px;

        if self.gesture.scale_with_resolution {
            thresholds.scaled(resolution_scale(frame, self.reference_resolution()))
        } else {
            thresholds
        }
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.interaction.cooldown_ms)
    }

    /// Interval between ticks; fps is clamped to 1..=240
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / self.frame_loop.target_fps.clamp(1, 240) as u64)
    }

    pub fn output_directory(&self) -> PathBuf {
        self.recording
            .output_directory
            .clone()
            .unwrap_or_else(default_recording_output_directory)
    }

    /// Zones from the layout section, in file order
    pub fn zone_registry(&self) -> ZoneRegistry {
        let mut registry = ZoneRegistry::new();
        for zone in &self.layout.zones {
            registry.register_zone(zone.name.clone(), zone.rect, zone.action);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.interaction.cooldown_ms, 1000);
        assert_eq!(config.recording.filename_prefix, "ar-recording");
        assert_eq!(config.layout.zones.len(), 2);
        assert_eq!(config.config_path().unwrap(), path);

        // Saved defaults load back unchanged
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.layout.zones, config.layout.zones);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[gesture]
profile = "compact"

[overlay]
face_filter = "bunny"

[loop]
target_fps = 30

[[layout.zones]]
name = "rec"
action = "toggle"
rect = { left = 10.0, top = 20.0, width = 30.0, height = 40.0 }
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.gesture.profile, GestureProfile::Compact);
        assert!(config.gesture.scale_with_resolution);
        assert_eq!(config.overlay.face_filter, FaceFilter::Bunny);
        assert!(config.overlay.draw_skeleton);
        assert_eq!(config.frame_loop.target_fps, 30);
        assert_eq!(config.layout.canvas_rect, ScreenRect::new(0.0, 0.0, 1280.0, 720.0));

        let zones = config.zone_registry();
        assert_eq!(zones.len(), 1);
        assert_eq!(zones.get("rec").map(|z| z.action()), Some(ZoneAction::Toggle));
    }

    #[test]
    fn test_thresholds_scale_with_resolution() {
        let mut config = Config::default();
        let full_hd = config.thresholds_for(FrameSize::new(1920, 1080));
        assert!((full_hd.pinch - 60.0).abs() < 1e-3);
        assert!((full_hd.open_palm - 180.0).abs() < 1e-3);

        config.gesture.scale_with_resolution = false;
        config.interaction.pinch_threshold_px = 30.0;
        let fixed = config.thresholds_for(FrameSize::new(1920, 1080));
        assert_eq!(fixed.pinch, 30.0);
        assert_eq!(fixed.open_palm, 120.0);
    }

    #[test]
    fn test_tick_interval_clamps() {
        let mut config = Config::default();
        config.frame_loop.target_fps = 0;
        assert_eq!(config.tick_interval(), Duration::from_secs(1));
        config.frame_loop.target_fps = 50;
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }
}
