use crate::audio::processor::bin_frequency;
use crate::config::MIDI_MAX;

/// Dominant bin of a spectrum and the note it maps to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchEstimate {
    pub bin: usize,
    pub frequency: f32,
    /// Fractional MIDI note number, unclamped.
    pub note: f64,
}

impl PitchEstimate {
    /// Rounded (half to even) and clamped into 0..=127. 0 means rest.
    pub fn midi_note(&self) -> u8 {
        resolve_note(self.note)
    }
}

#[derive(Debug, Clone)]
pub struct PitchExtractor {
    window_size: usize,
    reference_frequency: f64,
    reference_note: f64,
    epsilon: f64,
}

impl PitchExtractor {
    pub fn new(
        window_size: usize,
        reference_frequency: f64,
        reference_note: f64,
        epsilon: f64,
    ) -> Self {
        Self {
            window_size,
            reference_frequency,
            reference_note,
            epsilon,
        }
    }

    /// `None` only for an empty spectrum.
    pub fn extract(&self, spectrum: &[f32], sample_rate: u32) -> Option<PitchEstimate> {
        let bin = peak_bin(spectrum)?;
        let frequency = bin_frequency(bin, sample_rate, self.window_size);
        Some(PitchEstimate {
            bin,
            frequency,
            note: self.frequency_to_note(frequency),
        })
    }

    pub fn frequency_to_note(&self, frequency: f32) -> f64 {
        frequency_to_note(
            frequency,
            self.reference_frequency,
            self.reference_note,
            self.epsilon,
        )
    }
}

/// Index of the largest magnitude; the lowest bin wins ties. NaN bins never win.
pub fn peak_bin(spectrum: &[f32]) -> Option<usize> {
    if spectrum.is_empty() {
        return None;
    }

    let mut max_magnitude = f32::NEG_INFINITY;
    let mut max_index = 0;
    for (i, &magnitude) in spectrum.iter().enumerate() {
        if magnitude > max_magnitude {
            max_magnitude = magnitude;
            max_index = i;
        }
    }
    Some(max_index)
}

/// `12 * log2(f / reference) + reference_note`, with `epsilon` added to `f`
/// and the argument kept positive so zero or negative input stays finite.
/// Computed in f64 so `epsilon` still shifts audible frequencies.
pub fn frequency_to_note(
    frequency: f32,
    reference: f64,
    reference_note: f64,
    epsilon: f64,
) -> f64 {
    let ratio = ((frequency as f64 + epsilon) / reference).max(f64::MIN_POSITIVE);
    12.0 * ratio.log2() + reference_note
}

pub fn resolve_note(note: f64) -> u8 {
    if note.is_nan() {
        return 0;
    }
    note.round_ties_even().clamp(0.0, MIDI_MAX as f64) as u8
}
