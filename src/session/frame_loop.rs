use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::{EngineCommand, EngineStatus};
use crate::audio::VoiceMeter;
use crate::capture::{CaptureBackend, MediaSink, Recorder, StreamInfo, Transition};
use crate::config::Config;
use crate::error::CaptureError;
use crate::geometry::{FrameSize, Point, ScreenRect};
use crate::gesture::{classify, Gesture, GestureThresholds};
use crate::interaction::{compute_pinch, InteractionEngine, PinchEvent, RectProvider, ZoneAction, ZoneRegistry};
use crate::landmarks::{detect_face_or_none, detect_hands_or_empty, FramePoll, Hand, LandmarkSource, VideoFrame};
use crate::render::{Canvas, OverlayRenderer};
use crate::ui::UiSink;

/// What the caller should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The landmark source is exhausted
    Ended,
}

/// Engine context: everything that carries over from one tick to the next
pub struct FrameLoop<S, B, M> {
    source: S,
    recorder: Recorder<B>,
    sink: M,
    ui: Box<dyn UiSink>,
    voice: Option<VoiceMeter>,

    renderer: OverlayRenderer,
    /// Sized once, when the first frame with a known resolution arrives
    canvas: Option<Canvas>,
    thresholds: GestureThresholds,
    interaction: InteractionEngine,
    zones: ZoneRegistry,
    canvas_rect: ScreenRect,
    hover: HashMap<String, bool>,

    config: Config,
    autostart_pending: bool,
    last_gesture: Gesture,

    cmd_rx: Option<mpsc::Receiver<EngineCommand>>,
    status_tx: broadcast::Sender<EngineStatus>,
}

impl<S, B, M> FrameLoop<S, B, M>
where
    S: LandmarkSource,
    B: CaptureBackend,
    M: MediaSink,
{
    pub fn new(config: Config, source: S, backend: B, sink: M, ui: Box<dyn UiSink>) -> Self {
        let (status_tx, _) = broadcast::channel(16);
        let recorder = Recorder::new(backend, config.recording.filename_prefix.clone());

        Self {
            source,
            recorder,
            sink,
            ui,
            voice: None,
            renderer: OverlayRenderer::new(
                config.overlay.face_filter,
                config.overlay.draw_skeleton,
                config.overlay.hand_marker,
            ),
            canvas: None,
            thresholds: config.thresholds_for(config.reference_resolution()),
            interaction: InteractionEngine::new(config.cooldown()),
            zones: config.zone_registry(),
            canvas_rect: config.layout.canvas_rect,
            hover: HashMap::new(),
            autostart_pending: config.recording.autostart_on_launch,
            last_gesture: Gesture::None,
            config,
            cmd_rx: None,
            status_tx,
        }
    }

    /// Attach the command and status channels used by [`FrameLoop::run`]
    pub fn with_channels(
        mut self,
        cmd_rx: mpsc::Receiver<EngineCommand>,
        status_tx: broadcast::Sender<EngineStatus>,
    ) -> Self {
        self.cmd_rx = Some(cmd_rx);
        self.status_tx = status_tx;
        self
    }

    pub fn with_voice_meter(mut self, meter: VoiceMeter) -> Self {
        self.voice = Some(meter);
        self
    }

    /// Register (or replace) an activation zone
    pub fn register_zone(&mut self, name: impl Into<String>, rect: impl RectProvider + 'static, action: ZoneAction) {
        self.zones.register_zone(name, rect, action);
    }

    /// Update the on-screen rectangle of the mirrored canvas
    pub fn set_canvas_rect(&mut self, rect: ScreenRect) {
        self.canvas_rect = rect;
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineStatus> {
        self.status_tx.subscribe()
    }

    pub fn recorder(&self) -> &Recorder<B> {
        &self.recorder
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    pub fn thresholds(&self) -> &GestureThresholds {
        &self.thresholds
    }

    pub fn interaction(&self) -> &InteractionEngine {
        &self.interaction
    }

    pub fn last_gesture(&self) -> Gesture {
        self.last_gesture
    }

    /// Run ticks at the configured rate until shutdown or end of input
    pub async fn run(&mut self) {
        let _ = self.status_tx.send(EngineStatus::Idle);

        let mut ticker = tokio::time::interval(self.config.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cmd_rx = self.cmd_rx.take();

        info!("Frame loop started ({:?} per tick)", self.config.tick_interval());

        loop {
            tokio::select! {
                Some(cmd) = recv_command(&mut cmd_rx) => {
                    if !self.handle_command(cmd, Instant::now()).await {
                        break;
                    }
                }

                _ = ticker.tick() => {
                    if self.tick(Instant::now()).await == TickOutcome::Ended {
                        info!("Landmark source ended");
                        self.finish().await;
                        break;
                    }
                }
            }
        }

        self.shutdown();
        self.cmd_rx = cmd_rx;
    }

    /// Apply one command. Returns false when the loop should stop.
    pub async fn handle_command(&mut self, cmd: EngineCommand, now: Instant) -> bool {
        match cmd {
            EngineCommand::ToggleRecording => self.apply_action(ZoneAction::Toggle, now).await,
            EngineCommand::StartRecording => self.apply_action(ZoneAction::Start, now).await,
            EngineCommand::StopRecording => self.apply_action(ZoneAction::Stop, now).await,
            EngineCommand::SetFaceFilter(filter) => self.renderer.set_face_filter(filter),
            EngineCommand::Shutdown => {
                info!("Shutdown command received");
                return false;
            }
        }
        true
    }

    /// One pass of the loop: detect, draw, classify, activate, report
    pub async fn tick(&mut self, now: Instant) -> TickOutcome {
        let frame = match self.source.next_frame().await {
            FramePoll::Frame(frame) => Some(frame),
            FramePoll::NoFrame => None,
            FramePoll::Ended => return TickOutcome::Ended,
        };

        if let Some(frame) = &frame {
            self.sync_canvas(frame.size, now).await;
        }

        // Both detections belong to this frame; nothing below looks elsewhere
        let hands = detect_hands_or_empty(&mut self.source, frame.as_ref()).await;
        let face = detect_face_or_none(&mut self.source, frame.as_ref()).await;

        if let Some(canvas) = self.canvas.as_mut() {
            self.renderer.render(canvas, &hands, face.as_ref());
        }

        // The last hand in detector order drives classification and pinch
        let primary = hands.last();
        let gesture = classify(primary, &self.thresholds);
        let pinch = compute_pinch(primary, self.thresholds.pinch);
        self.last_gesture = gesture;

        if let Some(size) = self.canvas_size() {
            let action = self
                .interaction
                .resolve_activation(&pinch, &self.zones, size, self.canvas_rect, now)
                .map(|zone| zone.action());
            if let Some(action) = action {
                self.apply_action(action, now).await;
            }
            self.update_hover(&pinch, size);
        }

        self.ui.set_gesture_label(&gesture.display_text());
        self.ui.set_coordinates_text(&coordinates_text(primary, &pinch));

        if let Some(frame) = &frame {
            self.record_frame(frame, now);
        }

        self.ui.set_recording_indicator(self.recorder.is_recording());
        if let Some(meter) = self.voice.as_mut() {
            let level = meter.sample();
            self.ui.set_voice_level(level);
        }

        TickOutcome::Continue
    }

    /// Size the canvas and derive thresholds the first time the resolution is known
    async fn sync_canvas(&mut self, size: FrameSize, now: Instant) {
        if self.canvas.is_some() || size.is_empty() {
            return;
        }

        self.thresholds = self.config.thresholds_for(size);
        self.canvas = Some(Canvas::new(size));
        info!(
            "Video resolution {}x{}, pinch threshold {:.1}px",
            size.width, size.height, self.thresholds.pinch
        );

        if self.autostart_pending {
            self.autostart_pending = false;
            info!("Auto-starting recording on launch");
            self.apply_action(ZoneAction::Start, now).await;
        }
    }

    fn canvas_size(&self) -> Option<FrameSize> {
        self.canvas.as_ref().map(Canvas::size)
    }

    fn stream_info(&self) -> StreamInfo {
        StreamInfo {
            size: self.canvas_size().unwrap_or(FrameSize::new(0, 0)),
            fps: self.config.frame_loop.target_fps,
        }
    }

    fn update_hover(&mut self, pinch: &PinchEvent, size: FrameSize) {
        let hovered: Vec<String> = self
            .interaction
            .hovered(pinch, &self.zones, size, self.canvas_rect)
            .into_iter()
            .map(|zone| zone.name().to_string())
            .collect();

        for zone in self.zones.iter() {
            let now_hovered = hovered.iter().any(|name| name == zone.name());
            let was_hovered = self.hover.insert(zone.name().to_string(), now_hovered).unwrap_or(false);
            if now_hovered != was_hovered {
                self.ui.set_zone_hover(zone.name(), now_hovered);
            }
        }
    }

    fn record_frame(&mut self, frame: &VideoFrame, now: Instant) {
        if !self.recorder.is_recording() {
            return;
        }
        let Some(canvas) = self.canvas.as_ref() else {
            return;
        };

        let composed = canvas.composite(frame.pixels.as_deref(), self.config.recording.mirror_output);
        if let Err(e) = self.recorder.push_frame(&composed, now) {
            self.report_capture_error("Recording failed", e);
            return;
        }

        let frames = self.recorder.session().map(|s| s.frame_count()).unwrap_or(0);
        let fps = self.config.frame_loop.target_fps.max(1) as usize;
        if frames % fps == 0 {
            let _ = self.status_tx.send(EngineStatus::Recording { frames });
        }
    }

    /// Drive the recorder for a zone activation or a direct command
    async fn apply_action(&mut self, action: ZoneAction, now: Instant) {
        let stream = self.stream_info();
        let result = match action {
            ZoneAction::Start => self.recorder.start(&stream, now).await,
            ZoneAction::Stop => self.recorder.stop().await,
            ZoneAction::Toggle => self.recorder.toggle(&stream, now).await,
        };

        match result {
            Ok(Transition::Unchanged) => {}
            Ok(Transition::Started) => {
                self.ui.set_recording_indicator(true);
                let _ = self.status_tx.send(EngineStatus::Recording { frames: 0 });
            }
            Ok(Transition::Stopped(finished)) => {
                self.ui.set_recording_indicator(false);
                match self.sink.save(&finished.media, &finished.suggested_filename).await {
                    Ok(path) => {
                        info!("Saved {} frames to {:?}", finished.frames, path);
                        let _ = self.status_tx.send(EngineStatus::Saved { path });
                    }
                    Err(e) => {
                        error!("Failed to save recording: {:#}", e);
                        let message = format!("Failed to save recording: {}", e);
                        self.ui.show_error(&message);
                        let _ = self.status_tx.send(EngineStatus::Error(message));
                    }
                }
            }
            Err(e) => {
                let context = match action {
                    ZoneAction::Start => "Failed to start recording",
                    ZoneAction::Stop => "Failed to stop recording",
                    ZoneAction::Toggle => "Failed to toggle recording",
                };
                self.report_capture_error(context, e);
            }
        }
    }

    fn report_capture_error(&mut self, context: &str, e: CaptureError) {
        error!("{}: {}", context, e);
        let message = format!("{}: {}", context, e);
        self.ui.set_recording_indicator(false);
        self.ui.show_error(&message);
        let _ = self.status_tx.send(EngineStatus::Error(message));
    }

    /// End of input: finalize whatever is being recorded
    async fn finish(&mut self) {
        if self.recorder.is_recording() {
            self.apply_action(ZoneAction::Stop, Instant::now()).await;
        }
    }

    /// Tear down: discard any in-flight recording and close audio
    pub fn shutdown(&mut self) {
        if self.recorder.is_recording() {
            warn!("Shutting down while recording, partial recording discarded");
        }
        self.recorder.abort();
        if let Some(meter) = self.voice.as_mut() {
            meter.close();
        }
        self.interaction.reset();
        self.ui.set_recording_indicator(false);
        let _ = self.status_tx.send(EngineStatus::Idle);
        debug!("Frame loop torn down");
    }
}

async fn recv_command(rx: &mut Option<mpsc::Receiver<EngineCommand>>) -> Option<EngineCommand> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// `Hand: (x, y)` for the wrist, plus `Pinch: (x, y)` while pinching
pub fn coordinates_text(hand: Option<&Hand>, pinch: &PinchEvent) -> String {
    let Some(wrist) = hand.and_then(Hand::wrist) else {
        return String::new();
    };

    let mut text = format!("Hand: {}", rounded(wrist));
    if let Some(p) = pinch.position() {
        text.push_str(&format!("\nPinch: {}", rounded(p)));
    }
    text
}

fn rounded(p: Point) -> String {
    format!("({}, {})", p.x.round() as i64, p.y.round() as i64)
}
