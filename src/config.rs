use crate::error::{Error, Result};

pub const WINDOW_SIZE: usize = 2048;
pub const SAMPLE_RATE: u32 = 48000;
pub const SILENCE_THRESHOLD: f32 = 0.0005;

pub const BANDS: usize = 31;
pub const EQ_MIN_GAIN: f32 = 0.1;
pub const EQ_MAX_GAIN: f32 = 1.0;

pub const PITCH_HISTORY: usize = 100;
pub const LEVEL_HISTORY: usize = 10;

pub const GAIN_INCREASE: f64 = 1.01;
pub const GAIN_DECREASE: f64 = 0.99;
pub const MULTIPLIER_MIN: f64 = 1e-3;
pub const MULTIPLIER_MAX: f64 = 1e9;
pub const INITIAL_MULTIPLIER: f64 = 2000.0;
pub const INITIAL_LEVEL: f64 = 50.0;

pub const REFERENCE_FREQUENCY: f64 = 220.0;
pub const REFERENCE_NOTE: f64 = 57.01;
pub const FREQUENCY_EPSILON: f64 = 1e-6;

pub const MIDI_MAX: u8 = 127;

// Samples buffered between the capture callback and the control loop.
pub const CAPTURE_BLOCKS_BUFFERED: usize = 4;

/// Every tunable of the analysis and control loop.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Number of spectrum bins kept per cycle. Blocks are `2 * window_size` samples.
    pub window_size: usize,
    pub sample_rate: u32,
    /// Blocks whose RMS does not exceed this are skipped entirely.
    pub silence_threshold: f32,
    pub bands: usize,
    pub eq_min_gain: f32,
    pub eq_max_gain: f32,
    pub pitch_history: usize,
    pub level_history: usize,
    pub gain_increase: f64,
    pub gain_decrease: f64,
    pub multiplier_min: f64,
    pub multiplier_max: f64,
    pub initial_multiplier: f64,
    pub initial_level: f64,
    pub reference_frequency: f64,
    pub reference_note: f64,
    pub frequency_epsilon: f64,
    pub channel: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window_size: WINDOW_SIZE,
            sample_rate: SAMPLE_RATE,
            silence_threshold: SILENCE_THRESHOLD,
            bands: BANDS,
            eq_min_gain: EQ_MIN_GAIN,
            eq_max_gain: EQ_MAX_GAIN,
            pitch_history: PITCH_HISTORY,
            level_history: LEVEL_HISTORY,
            gain_increase: GAIN_INCREASE,
            gain_decrease: GAIN_DECREASE,
            multiplier_min: MULTIPLIER_MIN,
            multiplier_max: MULTIPLIER_MAX,
            initial_multiplier: INITIAL_MULTIPLIER,
            initial_level: INITIAL_LEVEL,
            reference_frequency: REFERENCE_FREQUENCY,
            reference_note: REFERENCE_NOTE,
            frequency_epsilon: FREQUENCY_EPSILON,
            channel: 0,
        }
    }
}

impl EngineConfig {
    /// Length of the audio block consumed per cycle.
    pub fn block_len(&self) -> usize {
        2 * self.window_size
    }

    pub fn validate(&self) -> Result<()> {
        if self.window_size == 0 {
            return Err(Error::InvalidConfig("window size must be greater than 0".into()));
        }
        if self.sample_rate == 0 {
            return Err(Error::InvalidConfig("sample rate must be greater than 0".into()));
        }
        if self.bands == 0 || self.bands > self.window_size {
            return Err(Error::InvalidConfig(format!(
                "band count must be between 1 and the window size ({}), got {}",
                self.window_size, self.bands
            )));
        }
        if self.pitch_history == 0 || self.level_history == 0 {
            return Err(Error::InvalidConfig("history capacities must be greater than 0".into()));
        }
        if !(self.silence_threshold >= 0.0) {
            return Err(Error::InvalidConfig("silence threshold must be non-negative".into()));
        }
        if !(self.eq_min_gain > 0.0 && self.eq_min_gain <= self.eq_max_gain) {
            return Err(Error::InvalidConfig(format!(
                "equalizer gain range [{}, {}] is invalid",
                self.eq_min_gain, self.eq_max_gain
            )));
        }
        if !(self.gain_increase > 1.0) || !(self.gain_decrease > 0.0 && self.gain_decrease < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "gain factors must increase (>1) and decrease (0..1), got {} / {}",
                self.gain_increase, self.gain_decrease
            )));
        }
        if !(self.multiplier_min > 0.0 && self.multiplier_min <= self.multiplier_max)
            || !self.multiplier_max.is_finite()
        {
            return Err(Error::InvalidConfig("multiplier bounds are invalid".into()));
        }
        if !(self.reference_frequency > 0.0) {
            return Err(Error::InvalidConfig("reference frequency must be positive".into()));
        }
        if !(self.frequency_epsilon > 0.0) {
            return Err(Error::InvalidConfig("frequency epsilon must be positive".into()));
        }
        if self.channel > 15 {
            return Err(Error::InvalidConfig(format!(
                "MIDI channel must be 0-15, got {}",
                self.channel
            )));
        }
        Ok(())
    }
}
