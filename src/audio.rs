//! Microphone level meter
//!
//! Level is the RMS of unsigned 8-bit time-domain samples centered at 128,
//! amplified three times and capped at 1.0.

use tracing::debug;

/// Samples read per meter update
pub const ANALYSER_BINS: usize = 128;

const LEVEL_GAIN: f32 = 3.0;

/// Source of time-domain audio samples
pub trait AudioInput: Send {
    /// Fill `buf` with the most recent samples; returns how many were written
    fn read_time_domain(&mut self, buf: &mut [u8]) -> usize;

    /// Release the device. Later reads return nothing.
    fn close(&mut self);

    fn is_closed(&self) -> bool;
}

/// Voice level in [0, 1] for a block of u8 samples
pub fn voice_level(samples: &[u8]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f32 = samples
        .iter()
        .map(|&s| {
            let v = (s as f32 - 128.0) / 128.0;
            v * v
        })
        .sum();
    let rms = (sum / samples.len() as f32).sqrt();
    (rms * LEVEL_GAIN).min(1.0)
}

/// Level as a whole percentage
pub fn level_percent(level: f32) -> u8 {
    (level.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Polls an [`AudioInput`] and reports its level
pub struct VoiceMeter {
    input: Box<dyn AudioInput>,
    buffer: Vec<u8>,
    level: f32,
}

impl VoiceMeter {
    pub fn new(input: Box<dyn AudioInput>) -> Self {
        Self {
            input,
            buffer: vec![128; ANALYSER_BINS],
            level: 0.0,
        }
    }

    /// Read the latest block and update the level
    pub fn sample(&mut self) -> f32 {
        if self.input.is_closed() {
            self.level = 0.0;
            return 0.0;
        }
        let n = self.input.read_time_domain(&mut self.buffer).min(self.buffer.len());
        self.level = voice_level(&self.buffer[..n]);
        self.level
    }

    pub fn level(&self) -> f32 {
        self.level
    }

    pub fn close(&mut self) {
        if !self.input.is_closed() {
            debug!("Closing audio input");
            self.input.close();
        }
        self.level = 0.0;
    }

    pub fn is_closed(&self) -> bool {
        self.input.is_closed()
    }
}

/// Synthetic microphone: a tone whose loudness swells and fades
pub struct SimulatedMicrophone {
    phase: f32,
    step: u64,
    closed: bool,
}

impl SimulatedMicrophone {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            step: 0,
            closed: false,
        }
    }
}

impl Default for SimulatedMicrophone {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioInput for SimulatedMicrophone {
    fn read_time_domain(&mut self, buf: &mut [u8]) -> usize {
        if self.closed {
            return 0;
        }
        self.step += 1;
        let amplitude = ((self.step as f32 * 0.05).sin() * 0.5 + 0.5) * 0.3;
        for sample in buf.iter_mut() {
            self.phase = (self.phase + 0.2) % std::f32::consts::TAU;
            *sample = (128.0 + self.phase.sin() * amplitude * 127.0).round() as u8;
        }
        buf.len()
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
