//! Spectral consistency analysis
//!
//! Vocoders tend to produce spectra that are too uniform from frame to
//! frame and that stop dead above a fixed frequency. Three measures:
//! - variance of per-frame spectral flatness
//! - spread of the effective bandwidth (95% energy rolloff)
//! - share of energy above the high-frequency cutoff

use crate::config::{FrameConfig, SpectralConfig};
use crate::core::dsp::{stats, Stft, WindowType};
use crate::core::waveform::Waveform;

use super::flags::{FIXED_BANDWIDTH_SIGNATURE, HF_CUTOFF_DETECTED, UNNATURAL_SPECTRAL_FLATNESS};
use super::{weighted_score, AnalyzerFinding, ForensicAnalyzer};

/// Fewest non-silent frames that give a meaningful variance
const MIN_ACTIVE_FRAMES: usize = 2;

pub struct SpectralAnalyzer {
    frames: FrameConfig,
    config: SpectralConfig,
}

impl SpectralAnalyzer {
    pub fn new(frames: FrameConfig, config: SpectralConfig) -> Self {
        Self { frames, config }
    }
}

impl Default for SpectralAnalyzer {
    fn default() -> Self {
        Self::new(FrameConfig::default(), SpectralConfig::default())
    }
}

/// Per-frame measurements over the non-silent part of the signal
#[derive(Debug, Default)]
struct FrameMeasures {
    flatness: Vec<f32>,
    bandwidth: Vec<f32>,
    hf_ratio: Vec<f32>,
    centroid: Vec<f32>,
}

impl SpectralAnalyzer {
    fn measure(&self, waveform: &Waveform) -> FrameMeasures {
        let stft = Stft::compute(
            waveform.samples(),
            waveform.sample_rate(),
            self.frames.frame_length,
            self.frames.hop_length,
            WindowType::Hann,
        );
        let bin_hz = stft.bin_hz();

        let mut measures = FrameMeasures::default();
        for frame in stft.active_frames(self.config.min_frame_rms) {
            let power = frame.power();
            let total: f32 = power.iter().sum();
            if total <= 0.0 || !total.is_finite() {
                continue;
            }
            measures.flatness.push(stats::spectral_flatness(&frame.magnitudes()));
            measures
                .bandwidth
                .push(stats::spectral_rolloff(&power, bin_hz, self.config.rolloff_fraction));
            measures
                .hf_ratio
                .push(stats::high_band_ratio(&power, bin_hz, self.config.hf_cutoff_hz));
            measures.centroid.push(stats::spectral_centroid(&power, bin_hz));
        }
        measures
    }
}

impl ForensicAnalyzer for SpectralAnalyzer {
    fn name(&self) -> &'static str {
        "spectral_analysis"
    }

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding {
        let measures = self.measure(waveform);
        if measures.flatness.len() < MIN_ACTIVE_FRAMES {
            return AnalyzerFinding::degenerate(self.name(), "fewer than two non-silent frames");
        }

        let cfg = &self.config;
        let flatness_variance = stats::variance(&measures.flatness);
        let bandwidth_std = stats::std_dev(&measures.bandwidth);
        let hf_ratio = stats::mean(&measures.hf_ratio);

        let mut finding = AnalyzerFinding::new(self.name());
        finding.set_metric("active_frames", measures.flatness.len() as f32);
        finding.set_metric("spectral_flatness_mean", stats::mean(&measures.flatness));
        finding.set_metric("spectral_flatness_variance", flatness_variance);
        finding.set_metric("bandwidth_std_hz", bandwidth_std);
        finding.set_metric("hf_energy_ratio", hf_ratio);
        finding.set_metric(
            "spectral_centroid_cv",
            stats::coefficient_of_variation(&measures.centroid),
        );

        finding.set_flag(
            UNNATURAL_SPECTRAL_FLATNESS,
            cfg.flatness_variance.is_flagged(flatness_variance),
            || {
                format!(
                    "Spectral flatness barely changes between frames (variance {flatness_variance:.2e})"
                )
            },
        );
        finding.set_flag(
            FIXED_BANDWIDTH_SIGNATURE,
            cfg.bandwidth_std_hz.is_flagged(bandwidth_std),
            || {
                format!(
                    "Effective bandwidth is nearly constant (std {bandwidth_std:.1} Hz), typical of vocoder output"
                )
            },
        );
        finding.set_flag(HF_CUTOFF_DETECTED, cfg.hf_energy_ratio.is_flagged(hf_ratio), || {
            format!(
                "Almost no energy above {:.0} Hz ({:.2e} of total), suggesting a synthesis band limit",
                cfg.hf_cutoff_hz, hf_ratio
            )
        });

        finding.set_score(weighted_score(&[
            (cfg.flatness_variance.score(flatness_variance), cfg.flatness_weight),
            (cfg.bandwidth_std_hz.score(bandwidth_std), cfg.bandwidth_weight),
            (cfg.hf_energy_ratio.score(hf_ratio), cfg.hf_weight),
        ]));

        log::debug!(
            "spectral: flatness_var={:.2e} bandwidth_std={:.1}Hz hf_ratio={:.2e} score={:.3}",
            flatness_variance,
            bandwidth_std,
            hf_ratio,
            finding.sub_score
        );
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::analysis::{NEUTRAL_SCORE, INSUFFICIENT_SIGNAL};
    use std::f32::consts::PI;

    fn sine(freq: f32, secs: f32) -> Waveform {
        let n = (secs * 16_000.0) as usize;
        let samples = (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 16_000.0).sin())
            .collect();
        Waveform::mono(samples).unwrap()
    }

    #[test]
    fn test_pure_tone_is_flagged() {
        let finding = SpectralAnalyzer::default().analyze(&sine(440.0, 1.0));
        assert!(!finding.degenerate);
        assert!(finding.is_flagged(UNNATURAL_SPECTRAL_FLATNESS));
        assert!(finding.is_flagged(FIXED_BANDWIDTH_SIGNATURE));
        assert!(finding.is_flagged(HF_CUTOFF_DETECTED));
        assert!(finding.sub_score > 0.9, "score {}", finding.sub_score);
        assert_eq!(finding.explanations.len(), 3);
    }

    #[test]
    fn test_silence_is_neutral() {
        let waveform = Waveform::mono(vec![0.0; 16_000]).unwrap();
        let finding = SpectralAnalyzer::default().analyze(&waveform);
        assert!(finding.degenerate);
        assert_eq!(finding.sub_score, NEUTRAL_SCORE);
        assert!(finding.is_flagged(INSUFFICIENT_SIGNAL));
    }

    #[test]
    fn test_alternating_tone_and_noise_is_natural() {
        // 100 ms blocks alternating between a tone and broadband noise
        let mut seed: u32 = 12_345;
        let samples: Vec<f32> = (0..32_000)
            .map(|i| {
                if (i / 1600) % 2 == 0 {
                    0.4 * (2.0 * PI * 300.0 * i as f32 / 16_000.0).sin()
                } else {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    ((seed >> 8) as f32 / (1u32 << 24) as f32 - 0.5) * 0.6
                }
            })
            .collect();
        let finding = SpectralAnalyzer::default().analyze(&Waveform::mono(samples).unwrap());
        assert!(!finding.is_flagged(UNNATURAL_SPECTRAL_FLATNESS));
        assert!(!finding.is_flagged(FIXED_BANDWIDTH_SIGNATURE));
        assert!(!finding.is_flagged(HF_CUTOFF_DETECTED));
        assert!(finding.sub_score < 0.1, "score {}", finding.sub_score);
    }
}
