use std::collections::VecDeque;

use crate::config::EngineConfig;

/// Bounded FIFO of recent values. Pushing past capacity evicts the oldest entry.
#[derive(Debug, Clone, PartialEq)]
pub struct History<T> {
    values: VecDeque<T>,
    capacity: usize,
}

impl<T: Copy> History<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn seeded(capacity: usize, seed: impl IntoIterator<Item = T>) -> Self {
        let mut history = Self::new(capacity);
        for value in seed {
            history.push(value);
        }
        history
    }

    pub fn push(&mut self, value: T) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.values.iter().copied().collect()
    }
}

/// Recently detected frequencies in Hz.
pub type PitchHistory = History<f32>;
/// Recent (pre-clamp) levels.
pub type LevelHistory = History<f64>;

impl PitchHistory {
    /// A spread of low frequencies (1, 101, 201, ... Hz) so the first
    /// equalizer pass has a well-defined histogram.
    pub fn with_seed(capacity: usize) -> Self {
        Self::seeded(capacity, (0..capacity).map(|i| (1 + 100 * i) as f32))
    }
}

impl LevelHistory {
    pub fn with_level(capacity: usize, level: f64) -> Self {
        Self::seeded(capacity, [level])
    }

    pub fn min(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.iter().copied().reduce(f64::max)
    }
}

/// Mutable state of the control loop, mutated at most once per active block.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub multiplier: f64,
    /// Always within [0, 127].
    pub level: f64,
    pub previous_rms: f32,
    pub current_note: Option<u8>,
    pub pitch_history: PitchHistory,
    pub level_history: LevelHistory,
}

impl ControllerState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            multiplier: config.initial_multiplier,
            level: config.initial_level.clamp(0.0, 127.0),
            previous_rms: 0.0,
            current_note: None,
            pitch_history: PitchHistory::with_seed(config.pitch_history),
            level_history: LevelHistory::with_level(config.level_history, config.initial_level),
        }
    }
}
