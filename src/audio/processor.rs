use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex32};

use crate::audio::AudioBlock;
use crate::error::{Error, Result};

/// Magnitude spectrum, one value per bin, `window_size` bins long.
pub type Spectrum = Vec<f32>;

/// Turns `2 * window_size` sample blocks into the first `window_size`
/// magnitude bins. No window function or zero padding is applied.
pub struct SpectrumAnalyzer {
    fft: Arc<dyn Fft<f32>>,
    fft_buffer: Vec<Complex32>,
    scratch: Vec<Complex32>,
    window_size: usize,
}

impl SpectrumAnalyzer {
    pub fn new(window_size: usize) -> Self {
        let fft_size = 2 * window_size;
        let fft = FftPlanner::new().plan_fft_forward(fft_size);
        let scratch = vec![Complex32::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft,
            fft_buffer: vec![Complex32::new(0.0, 0.0); fft_size],
            scratch,
            window_size,
        }
    }

    pub fn block_len(&self) -> usize {
        2 * self.window_size
    }

    pub fn process(&mut self, block: &AudioBlock) -> Result<Spectrum> {
        if block.len() != self.block_len() {
            return Err(Error::BlockSize {
                expected: self.block_len(),
                actual: block.len(),
            });
        }

        for (slot, &sample) in self.fft_buffer.iter_mut().zip(&block.samples) {
            *slot = Complex32::new(sample, 0.0);
        }
        self.fft.process_with_scratch(&mut self.fft_buffer, &mut self.scratch);

        Ok(self.fft_buffer[..self.window_size]
            .iter()
            .map(|bin| bin.norm())
            .collect())
    }
}

/// Frequency of bin `bin` for blocks of `2 * window_size` samples.
pub fn bin_frequency(bin: usize, sample_rate: u32, window_size: usize) -> f32 {
    bin as f32 * sample_rate as f32 / (2 * window_size) as f32
}
