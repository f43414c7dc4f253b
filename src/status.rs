use std::fmt;

use crate::audio::ControllerState;
use crate::engine::CycleReport;

pub const STATUS_HEADER: &str =
    "note   vel_delta      velocity  signal_rms     multiplier      min_vel    max_vel";

const BAR_WIDTH: f32 = 20.0;

/// One line of the terminal readout printed per emitted note.
pub struct StatusLine<'a> {
    pub report: &'a CycleReport,
    pub state: &'a ControllerState,
}

impl fmt::Display for StatusLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = &self.report.level;
        write!(
            f,
            "{:<6} {:<14.5} {:<9} {:<14.5} {:<15.3} {:<10.2} {:<10.2}",
            self.report.note,
            level.delta,
            self.report.velocity,
            level.rms,
            level.multiplier,
            self.state.level_history.min().unwrap_or(0.0),
            self.state.level_history.max().unwrap_or(0.0),
        )
    }
}

/// Equalizer band gains drawn as one `#` bar per band, lowest band first.
pub struct EqualizerBars<'a>(pub &'a [f32]);

impl fmt::Display for EqualizerBars<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (band, &gain) in self.0.iter().enumerate() {
            let width = (gain.max(0.0) * BAR_WIDTH) as usize;
            if band > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>3} {:<5.2} {}", band, gain, "#".repeat(width))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::dsp::{LevelUpdate, PitchEstimate};

    #[test]
    fn status_line_lists_fields() {
        let state = ControllerState::new(&EngineConfig::default());
        let pitch = PitchEstimate {
            bin: 38,
            frequency: 445.3,
            note: 69.2,
        };
        let report = CycleReport {
            raw_pitch: pitch,
            pitch,
            note: 69,
            velocity: 64,
            level: LevelUpdate {
                rms: 0.01,
                multiplier: 2020.0,
                delta: 14.0,
                raw_level: 64.0,
                level: 64.0,
            },
        };

        let line = StatusLine {
            report: &report,
            state: &state,
        }
        .to_string();
        assert!(line.starts_with("69 "));
        assert!(line.contains("2020.000"));
        assert!(line.contains("50.00"));
    }

    #[test]
    fn equalizer_bars_scale_with_gain() {
        let text = EqualizerBars(&[1.0, 0.1, 0.55]).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with(&"#".repeat(20)));
        assert!(lines[1].ends_with(" ##"));
        assert_eq!(lines[2].matches('#').count(), 11);
    }
}
