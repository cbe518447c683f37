//! FFT processing with windowing

use std::sync::Arc;

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use super::windows::{create_window, WindowType};

/// Windowed forward FFT of a fixed size.
///
/// The plan is built once; transforms take `&self` so a processor can be
/// shared across threads.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    fft_size: usize,
}

impl FftProcessor {
    pub fn new(fft_size: usize, window_type: WindowType) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            fft: planner.plan_fft_forward(fft_size),
            window: create_window(fft_size, window_type),
            fft_size,
        }
    }

    /// Complex spectrum of the non-negative frequencies (`fft_size / 2 + 1` bins)
    pub fn complex_spectrum(&self, samples: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer: Vec<Complex<f32>> = samples
            .iter()
            .take(self.fft_size)
            .zip(&self.window)
            .map(|(&s, &w)| Complex::new(s * w, 0.0))
            .collect();

        // Zero-pad if necessary
        buffer.resize(self.fft_size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);
        buffer.truncate(self.fft_size / 2 + 1);
        buffer
    }

    /// Power spectrum (|X|²)
    pub fn power_spectrum(&self, samples: &[f32]) -> Vec<f32> {
        self.complex_spectrum(samples)
            .iter()
            .map(|c| c.norm_sqr())
            .collect()
    }

    /// Magnitude spectrum (|X|)
    pub fn magnitude_spectrum(&self, samples: &[f32]) -> Vec<f32> {
        self.complex_spectrum(samples)
            .iter()
            .map(|c| c.norm())
            .collect()
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_sine_peak_bin() {
        let processor = FftProcessor::new(512, WindowType::Hann);
        // 1000 Hz at 16 kHz lands exactly on bin 32
        let samples: Vec<f32> = (0..512)
            .map(|i| (2.0 * PI * 1000.0 * i as f32 / 16_000.0).sin())
            .collect();

        let power = processor.power_spectrum(&samples);
        assert_eq!(power.len(), 257);

        let peak = power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i);
        assert_eq!(peak, Some(32));
    }

    #[test]
    fn test_zero_padding_short_frame() {
        let processor = FftProcessor::new(256, WindowType::Hann);
        let spectrum = processor.magnitude_spectrum(&[0.5; 100]);
        assert_eq!(spectrum.len(), 129);
        assert!(spectrum.iter().all(|m| m.is_finite()));
    }
}
