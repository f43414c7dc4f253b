use crate::audio::{PitchHistory, Spectrum};

/// Reweights spectrum bands so frequency regions that dominated recent
/// detections are attenuated.
#[derive(Debug, Clone)]
pub struct AdaptiveEqualizer {
    bands: usize,
    min_gain: f32,
    max_gain: f32,
}

impl AdaptiveEqualizer {
    pub fn new(bands: usize, min_gain: f32, max_gain: f32) -> Self {
        Self {
            bands: bands.max(1),
            min_gain,
            max_gain,
        }
    }

    /// One gain per band. The band with the most hits gets `min_gain`, the one
    /// with the fewest `max_gain`. Falls back to a flat `max_gain` curve when the
    /// history is empty, has zero variance, or every band has the same count.
    pub fn band_gains(&self, history: &PitchHistory) -> Vec<f32> {
        let flat = vec![self.max_gain; self.bands];

        let counts = match histogram(history.iter().copied(), self.bands) {
            Some(counts) => counts,
            None => return flat,
        };

        let lowest = counts.iter().copied().min().unwrap_or(0);
        let highest = counts.iter().copied().max().unwrap_or(0);
        if highest == lowest {
            return flat;
        }

        let spread = (highest - lowest) as f32;
        counts
            .iter()
            .map(|&count| {
                let t = (count - lowest) as f32 / spread;
                self.max_gain + (self.min_gain - self.max_gain) * t
            })
            .collect()
    }

    /// Splits `spectrum` into `gains.len()` contiguous ranges and scales each by
    /// its gain. The last range absorbs the remainder.
    pub fn apply(&self, spectrum: &[f32], gains: &[f32]) -> Spectrum {
        let mut result = spectrum.to_vec();
        if gains.is_empty() {
            return result;
        }

        let band_len = (spectrum.len() / gains.len()).max(1);
        for (i, value) in result.iter_mut().enumerate() {
            let band = (i / band_len).min(gains.len() - 1);
            *value *= gains[band];
        }
        result
    }

    pub fn process(&self, spectrum: &[f32], history: &PitchHistory) -> Spectrum {
        let gains = self.band_gains(history);
        self.apply(spectrum, &gains)
    }
}

/// Counts values into `bins` equal-width bins spanning [min, max], the last
/// bin closed on the right. `None` if there are no values or no spread.
fn histogram(values: impl Iterator<Item = f32>, bins: usize) -> Option<Vec<usize>> {
    let values: Vec<f32> = values.filter(|v| v.is_finite()).collect();
    let low = values.iter().copied().reduce(f32::min)?;
    let high = values.iter().copied().reduce(f32::max)?;
    if high <= low {
        return None;
    }

    let width = (high - low) / bins as f32;
    let mut counts = vec![0usize; bins];
    for value in values {
        let bin = (((value - low) / width) as usize).min(bins - 1);
        counts[bin] += 1;
    }
    Some(counts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::state::History;

    fn history(values: &[f32]) -> PitchHistory {
        History::seeded(values.len().max(1), values.iter().copied())
    }

    #[test]
    fn most_hits_get_lowest_gain() {
        let eq = AdaptiveEqualizer::new(4, 0.1, 1.0);
        // Spans [0, 100]: bins of width 25.
        let gains = eq.band_gains(&history(&[0.0, 10.0, 20.0, 30.0, 60.0, 100.0]));
        // counts: [3, 1, 1, 1]
        assert!((gains[0] - 0.1).abs() < 1e-6);
        assert!(gains[1..].iter().all(|g| (g - 1.0).abs() < 1e-6));
    }

    #[test]
    fn gains_interpolate_linearly() {
        let eq = AdaptiveEqualizer::new(3, 0.1, 1.0);
        // Spans [0, 3]: counts [1, 2, 3] (last bin includes 3.0).
        let gains = eq.band_gains(&history(&[0.0, 1.5, 1.6, 2.5, 2.6, 3.0]));
        assert!((gains[0] - 1.0).abs() < 1e-6);
        assert!((gains[1] - 0.55).abs() < 1e-6);
        assert!((gains[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn zero_variance_history_is_flat() {
        let eq = AdaptiveEqualizer::new(31, 0.1, 1.0);
        let gains = eq.band_gains(&history(&[440.0; 20]));
        assert_eq!(gains, vec![1.0; 31]);
    }

    #[test]
    fn empty_history_is_flat() {
        let eq = AdaptiveEqualizer::new(5, 0.1, 1.0);
        assert_eq!(eq.band_gains(&History::new(10)), vec![1.0; 5]);
    }

    #[test]
    fn equal_counts_are_flat() {
        let eq = AdaptiveEqualizer::new(2, 0.1, 1.0);
        assert_eq!(eq.band_gains(&history(&[0.0, 1.0])), vec![1.0, 1.0]);
    }

    #[test]
    fn seeded_history_gains_in_range() {
        let eq = AdaptiveEqualizer::new(31, 0.1, 1.0);
        let gains = eq.band_gains(&PitchHistory::with_seed(100));
        assert_eq!(gains.len(), 31);
        assert!(gains.iter().all(|&g| (0.1..=1.0).contains(&g)));
    }

    #[test]
    fn last_band_absorbs_remainder() {
        let eq = AdaptiveEqualizer::new(3, 0.1, 1.0);
        let spectrum = vec![1.0; 10];
        let result = eq.apply(&spectrum, &[1.0, 0.5, 0.25]);
        assert_eq!(result.len(), 10);
        assert_eq!(&result[..3], &[1.0; 3]);
        assert_eq!(&result[3..6], &[0.5; 3]);
        assert_eq!(&result[6..], &[0.25; 4]);
        // Input is untouched.
        assert_eq!(spectrum, vec![1.0; 10]);
    }
}
