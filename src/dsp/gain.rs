use crate::audio::{ControllerState, LevelHistory};
use crate::config::{EngineConfig, MIDI_MAX};

/// Result of one loudness step, computed without touching the state so the
/// caller can commit it only after the note went out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelUpdate {
    pub rms: f32,
    pub multiplier: f64,
    pub delta: f64,
    /// Level before clamping; this is what the level history records.
    pub raw_level: f64,
    /// Level clamped into [0, 127].
    pub level: f64,
}

impl LevelUpdate {
    pub fn velocity(&self) -> u8 {
        self.level as u8
    }
}

/// Bang-bang gain adaptation plus RMS-delta velocity tracking.
#[derive(Debug, Clone)]
pub struct GainController {
    silence_threshold: f32,
    increase: f64,
    decrease: f64,
    multiplier_min: f64,
    multiplier_max: f64,
}

impl GainController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            silence_threshold: config.silence_threshold,
            increase: config.gain_increase,
            decrease: config.gain_decrease,
            multiplier_min: config.multiplier_min,
            multiplier_max: config.multiplier_max,
        }
    }

    /// Blocks whose RMS does not exceed the threshold are silence.
    pub fn is_active(&self, rms: f32) -> bool {
        rms > self.silence_threshold
    }

    /// Grows the multiplier while every recent level sits strictly inside
    /// (0, 127) and shrinks it as soon as one reaches or passes a bound.
    pub fn adapt_multiplier(&self, multiplier: f64, levels: &LevelHistory) -> f64 {
        let max = MIDI_MAX as f64;
        let saturated = levels.iter().any(|&level| !(level > 0.0 && level < max));
        let adapted = if saturated {
            multiplier * self.decrease
        } else {
            multiplier * self.increase
        };

        if adapted.is_finite() {
            adapted.clamp(self.multiplier_min, self.multiplier_max)
        } else {
            self.multiplier_max
        }
    }

    pub fn update(&self, state: &ControllerState, rms: f32) -> LevelUpdate {
        let multiplier = self.adapt_multiplier(state.multiplier, &state.level_history);

        let delta = (rms as f64 - state.previous_rms as f64) * multiplier;
        let delta = if delta.is_finite() { delta } else { 0.0 };

        let raw_level = state.level + delta;
        let level = raw_level.clamp(0.0, MIDI_MAX as f64);

        LevelUpdate {
            rms,
            multiplier,
            delta,
            raw_level,
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::state::History;

    fn controller() -> GainController {
        GainController::new(&EngineConfig::default())
    }

    #[test]
    fn silence_gate() {
        let gain = controller();
        assert!(!gain.is_active(0.0));
        assert!(!gain.is_active(0.0005));
        assert!(gain.is_active(0.0006));
    }

    #[test]
    fn grows_inside_bounds_and_shrinks_at_bounds() {
        let gain = controller();
        let inside = History::seeded(10, [1.0, 64.0, 126.0]);
        assert!((gain.adapt_multiplier(100.0, &inside) - 101.0).abs() < 1e-9);

        let at_bound = History::seeded(10, [64.0, 127.0]);
        assert!((gain.adapt_multiplier(100.0, &at_bound) - 99.0).abs() < 1e-9);

        let below = History::seeded(10, [-4.0, 64.0]);
        assert!((gain.adapt_multiplier(100.0, &below) - 99.0).abs() < 1e-9);

        let zero = History::seeded(10, [0.0]);
        assert!((gain.adapt_multiplier(100.0, &zero) - 99.0).abs() < 1e-9);
    }

    #[test]
    fn multiplier_stays_bounded() {
        let gain = controller();
        let inside = History::seeded(10, [64.0]);
        assert_eq!(gain.adapt_multiplier(1e9, &inside), 1e9);
        assert_eq!(gain.adapt_multiplier(f64::INFINITY, &inside), 1e9);

        let saturated = History::seeded(10, [127.0]);
        assert_eq!(gain.adapt_multiplier(1e-3, &saturated), 1e-3);
    }

    #[test]
    fn level_is_clamped_but_raw_level_is_kept() {
        let config = EngineConfig::default();
        let gain = GainController::new(&config);
        let state = ControllerState::new(&config);

        // 0.1 * 2020 = 202 above the starting level of 50.
        let update = gain.update(&state, 0.1);
        assert!((update.multiplier - 2020.0).abs() < 1e-6);
        assert!((update.delta - 202.0).abs() < 1e-3);
        assert!((update.raw_level - 252.0).abs() < 1e-3);
        assert_eq!(update.level, 127.0);
        assert_eq!(update.velocity(), 127);
    }

    #[test]
    fn falling_rms_lowers_level() {
        let config = EngineConfig::default();
        let gain = GainController::new(&config);
        let mut state = ControllerState::new(&config);
        state.previous_rms = 0.02;

        let update = gain.update(&state, 0.01);
        assert!(update.delta < 0.0);
        assert!(update.level < 50.0);
        assert!(update.level >= 0.0);
    }
}
