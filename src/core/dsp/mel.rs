//! Mel filterbank and cepstral coefficients
//!
//! Triangular filters evenly spaced on the HTK mel scale, log compression
//! with a floor relative to the loudest band, then an orthonormal DCT-II.

use std::f32::consts::PI;

/// Convert frequency in Hz to mel scale
#[inline]
pub fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Convert mel scale to frequency in Hz
#[inline]
pub fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10.0_f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular mel filterbank over a power spectrum
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    /// `num_bands` rows of `num_bins` weights
    filters: Vec<Vec<f32>>,
}

impl MelFilterbank {
    pub fn new(num_bands: usize, fft_size: usize, sample_rate: u32, min_hz: f32, max_hz: f32) -> Self {
        let num_bins = fft_size / 2 + 1;
        let bin_hz = sample_rate as f32 / fft_size as f32;

        let mel_min = hz_to_mel(min_hz);
        let mel_max = hz_to_mel(max_hz);
        let edges: Vec<f32> = (0..num_bands + 2)
            .map(|i| mel_to_hz(mel_min + (mel_max - mel_min) * i as f32 / (num_bands + 1) as f32))
            .collect();

        let filters = (0..num_bands)
            .map(|band| {
                let (left, center, right) = (edges[band], edges[band + 1], edges[band + 2]);
                (0..num_bins)
                    .map(|bin| {
                        let f = bin as f32 * bin_hz;
                        if f > left && f <= center {
                            (f - left) / (center - left)
                        } else if f > center && f < right {
                            (right - f) / (right - center)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        Self { filters }
    }

    pub fn num_bands(&self) -> usize {
        self.filters.len()
    }

    /// Band energies of one power spectrum
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.filters
            .iter()
            .map(|weights| weights.iter().zip(power).map(|(w, p)| w * p).sum())
            .collect()
    }

    /// Mel-frequency cepstral coefficients of one power spectrum.
    ///
    /// Band energies are floored `floor_db` below the loudest band so that
    /// near-empty bands cannot produce log(0). Returns `None` for a frame
    /// with no energy at all.
    pub fn mfcc(&self, power: &[f32], num_coefficients: usize, floor_db: f32) -> Option<Vec<f32>> {
        let energies = self.apply(power);
        let peak = energies.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 || !peak.is_finite() {
            return None;
        }
        let floor = peak * 10.0_f32.powf(-floor_db / 10.0);
        let log_energies: Vec<f32> = energies.iter().map(|&e| e.max(floor).ln()).collect();
        Some(dct_ii(&log_energies, num_coefficients))
    }
}

/// Orthonormal DCT-II, first `num_out` coefficients
pub fn dct_ii(input: &[f32], num_out: usize) -> Vec<f32> {
    let n = input.len();
    if n == 0 {
        return vec![0.0; num_out];
    }
    let scale_0 = (1.0 / n as f32).sqrt();
    let scale_k = (2.0 / n as f32).sqrt();

    (0..num_out)
        .map(|k| {
            let sum: f32 = input
                .iter()
                .enumerate()
                .map(|(i, &x)| x * (PI * k as f32 * (2 * i + 1) as f32 / (2 * n) as f32).cos())
                .sum();
            sum * if k == 0 { scale_0 } else { scale_k }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hz_to_mel_1000hz() {
        // 1000 Hz is ~1000 mel by construction of the scale
        assert!((hz_to_mel(1000.0) - 1000.0).abs() < 1.0);
        assert!((mel_to_hz(hz_to_mel(440.0)) - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_every_band_covers_a_bin() {
        let bank = MelFilterbank::new(26, 512, 16_000, 20.0, 8_000.0);
        assert_eq!(bank.num_bands(), 26);
        for (band, weights) in bank.filters.iter().enumerate() {
            assert!(weights.iter().any(|&w| w > 0.0), "band {band} is empty");
            assert!(weights.iter().all(|&w| (0.0..=1.0).contains(&w)));
        }
    }

    #[test]
    fn test_dct_of_constant_has_only_dc() {
        let coeffs = dct_ii(&[2.0; 26], 13);
        assert!((coeffs[0] - 2.0 * 26.0_f32.sqrt()).abs() < 1e-4);
        assert!(coeffs[1..].iter().all(|c| c.abs() < 1e-4));
    }

    #[test]
    fn test_mfcc_silent_frame_is_none() {
        let bank = MelFilterbank::new(26, 512, 16_000, 20.0, 8_000.0);
        assert!(bank.mfcc(&vec![0.0; 257], 13, 60.0).is_none());

        let coeffs = bank.mfcc(&vec![1.0; 257], 13, 60.0).unwrap();
        assert_eq!(coeffs.len(), 13);
        assert!(coeffs.iter().all(|c| c.is_finite()));
    }
}
