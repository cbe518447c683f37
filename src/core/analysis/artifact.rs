//! Synthesis artifact detection
//!
//! Two scored checks:
//! - phase discontinuities: a vocoder that resets or re-synthesizes phase
//!   per frame leaves sudden jumps in the phase advance of a strong bin
//! - digital silence: exact zeros, which recorded audio with a noise floor
//!   essentially never contains
//!
//! Click rate and half-wave symmetry are reported as metrics only.

use std::f32::consts::PI;

use crate::config::{ArtifactConfig, FrameConfig};
use crate::core::dsp::{stats, Stft, WindowType};
use crate::core::waveform::Waveform;

use super::flags::{DIGITAL_SILENCE_DETECTED, PHASE_DISCONTINUITY_DETECTED};
use super::{weighted_score, AnalyzerFinding, ForensicAnalyzer};

/// A run of consecutive samples that are exactly 0.0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroRun {
    pub start: usize,
    pub len: usize,
}

impl ZeroRun {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// All runs of exact zeros in `samples`
pub fn zero_runs(samples: &[f32]) -> Vec<ZeroRun> {
    let mut runs = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &s) in samples.iter().enumerate() {
        match (s == 0.0, start) {
            (true, None) => start = Some(i),
            (false, Some(st)) => {
                runs.push(ZeroRun { start: st, len: i - st });
                start = None;
            }
            _ => {}
        }
    }
    if let Some(st) = start {
        runs.push(ZeroRun { start: st, len: samples.len() - st });
    }
    runs
}

/// Sample-to-sample steps larger than this many standard deviations of the
/// waveform count as clicks
const CLICK_SIGMA: f32 = 6.0;

/// Clicks per second: sample-to-sample steps above `CLICK_SIGMA` times the
/// waveform's standard deviation
pub fn click_rate(samples: &[f32], sample_rate: u32) -> f32 {
    if samples.len() < 2 || sample_rate == 0 {
        return 0.0;
    }
    let threshold = CLICK_SIGMA * stats::std_dev(samples);
    let clicks = samples
        .windows(2)
        .filter(|w| (w[1] - w[0]).abs() > threshold)
        .count();
    clicks as f32 * sample_rate as f32 / samples.len() as f32
}

/// RMS of the positive half-waves over RMS of the negative half-waves.
/// `None` unless both polarities are present.
pub fn waveform_symmetry(samples: &[f32]) -> Option<f32> {
    let positive: Vec<f32> = samples.iter().copied().filter(|&s| s > 0.0).collect();
    let negative: Vec<f32> = samples.iter().copied().filter(|&s| s < 0.0).collect();
    if positive.is_empty() || negative.is_empty() {
        return None;
    }
    Some(stats::rms(&positive) / stats::rms(&negative))
}

/// Phase tracking result for the reference bin
#[derive(Debug, Clone, Copy, Default)]
struct PhaseTrack {
    reference_hz: f32,
    jumps: usize,
    inspected: usize,
}

pub struct ArtifactAnalyzer {
    frames: FrameConfig,
    config: ArtifactConfig,
}

impl ArtifactAnalyzer {
    pub fn new(frames: FrameConfig, config: ArtifactConfig) -> Self {
        Self { frames, config }
    }

    /// Count second-difference jumps in the phase of the strongest bin of
    /// the reference band
    fn track_phase(&self, waveform: &Waveform) -> Option<PhaseTrack> {
        let cfg = &self.config;
        let stft = Stft::compute(
            waveform.samples(),
            waveform.sample_rate(),
            self.frames.frame_length,
            self.frames.hop_length,
            WindowType::Hamming,
        );
        if stft.frames.len() < 3 {
            return None;
        }

        let bin_hz = stft.bin_hz();
        let low = ((cfg.ref_band_low_hz / bin_hz).ceil() as usize).max(1);
        let high = ((cfg.ref_band_high_hz / bin_hz).floor() as usize).min(stft.num_bins() - 1);
        if low > high {
            return None;
        }

        let mut mean_magnitude = vec![0.0f32; high - low + 1];
        for frame in &stft.frames {
            for (acc, c) in mean_magnitude.iter_mut().zip(&frame.spectrum[low..=high]) {
                *acc += c.norm();
            }
        }
        let ref_bin = low
            + mean_magnitude
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)?;

        let magnitudes: Vec<f32> = stft.frames.iter().map(|f| f.spectrum[ref_bin].norm()).collect();
        let peak = magnitudes.iter().copied().fold(0.0f32, f32::max);
        if peak <= 0.0 || !peak.is_finite() {
            return None;
        }
        let strong: Vec<bool> = magnitudes
            .iter()
            .map(|&m| m >= cfg.min_ref_magnitude_ratio * peak)
            .collect();

        // Expected phase advance of a stationary sinusoid centred on the bin
        let expected = 2.0 * PI * ref_bin as f32 * stft.hop_length as f32 / stft.fft_size as f32;

        let mut track = PhaseTrack {
            reference_hz: ref_bin as f32 * bin_hz,
            ..PhaseTrack::default()
        };
        let mut prev_deviation: Option<f32> = None;
        for t in 1..stft.frames.len() {
            if !(strong[t] && strong[t - 1]) {
                prev_deviation = None;
                continue;
            }
            let advance = stft.frames[t].spectrum[ref_bin].arg()
                - stft.frames[t - 1].spectrum[ref_bin].arg();
            let deviation = stats::principal_angle(advance - expected);
            if let Some(prev) = prev_deviation {
                track.inspected += 1;
                if stats::principal_angle(deviation - prev).abs() > cfg.phase_jump_radians {
                    track.jumps += 1;
                }
            }
            prev_deviation = Some(deviation);
        }
        Some(track)
    }

    /// Whether the zero runs amount to digital silence
    fn has_digital_silence(&self, runs: &[ZeroRun], len: usize, sample_rate: u32) -> bool {
        let cfg = &self.config;
        let interior_min = cfg.interior_zero_run.max(1);
        let margin = (cfg.edge_margin_secs.max(0.0) * sample_rate as f32) as usize;
        runs.iter().any(|run| {
            let interior = run.start >= margin && run.end() + margin <= len;
            run.len >= cfg.min_zero_run || (interior && run.len >= interior_min)
        })
    }
}

impl Default for ArtifactAnalyzer {
    fn default() -> Self {
        Self::new(FrameConfig::default(), ArtifactConfig::default())
    }
}

impl ForensicAnalyzer for ArtifactAnalyzer {
    fn name(&self) -> &'static str {
        "artifact_detection"
    }

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding {
        let cfg = &self.config;
        let mut finding = AnalyzerFinding::new(self.name());

        let track = self.track_phase(waveform).unwrap_or_default();
        finding.set_metric("phase_jump_count", track.jumps as f32);
        finding.set_metric("phase_pairs_inspected", track.inspected as f32);
        if track.reference_hz > 0.0 {
            finding.set_metric("reference_frequency_hz", track.reference_hz);
        }
        let phase_flag = track.jumps >= cfg.min_phase_jumps.max(1);
        finding.set_flag(PHASE_DISCONTINUITY_DETECTED, phase_flag, || {
            format!(
                "{} phase discontinuities near {:.0} Hz, consistent with frame-wise vocoding",
                track.jumps, track.reference_hz
            )
        });

        let samples = waveform.samples();
        let runs = zero_runs(samples);
        let longest = runs.iter().map(|r| r.len).max().unwrap_or(0);
        let zeros: usize = runs.iter().map(|r| r.len).sum();
        finding.set_metric("longest_zero_run", longest as f32);
        finding.set_metric("zero_sample_ratio", zeros as f32 / samples.len().max(1) as f32);
        finding.set_metric("click_rate_per_sec", click_rate(samples, waveform.sample_rate()));
        if let Some(symmetry) = waveform_symmetry(samples) {
            finding.set_metric("waveform_symmetry", symmetry);
        }
        let silence_flag = self.has_digital_silence(&runs, samples.len(), waveform.sample_rate());
        finding.set_flag(DIGITAL_SILENCE_DETECTED, silence_flag, || {
            format!("Digital silence: {zeros} samples of exact zero (longest run {longest})")
        });

        let as_score = |flag: bool| if flag { 1.0 } else { 0.0 };
        finding.set_score(weighted_score(&[
            (as_score(phase_flag), cfg.phase_weight),
            (as_score(silence_flag), cfg.silence_weight),
        ]));

        log::debug!(
            "artifact: phase_jumps={} longest_zero_run={} score={:.3}",
            track.jumps,
            longest,
            finding.sub_score
        );
        finding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| 0.5 * (2.0 * PI * freq * i as f32 / 16_000.0).sin())
            .collect()
    }

    #[test]
    fn test_zero_runs() {
        let runs = zero_runs(&[0.0, 0.0, 0.5, 0.0, 0.3, 0.0, 0.0, 0.0]);
        assert_eq!(
            runs,
            vec![
                ZeroRun { start: 0, len: 2 },
                ZeroRun { start: 3, len: 1 },
                ZeroRun { start: 5, len: 3 },
            ]
        );
    }

    #[test]
    fn test_all_zero_is_digital_silence() {
        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(vec![0.0; 16_000]).unwrap());
        assert!(finding.is_flagged(DIGITAL_SILENCE_DETECTED));
        assert!(!finding.is_flagged(PHASE_DISCONTINUITY_DETECTED));
        assert!((finding.sub_score - 0.6).abs() < 1e-6);
        assert!(finding.explanations[0].contains("16000"));
    }

    #[test]
    fn test_steady_tone_is_clean() {
        // Offset the phase so no sample lands on an exact zero
        let samples: Vec<f32> = (0..16_000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 16_000.0 + 0.3).sin())
            .collect();
        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(samples).unwrap());
        assert_eq!(finding.metric("phase_jump_count"), Some(0.0));
        assert!(!finding.is_flagged(DIGITAL_SILENCE_DETECTED));
        assert_eq!(finding.sub_score, 0.0);
    }

    #[test]
    fn test_interior_zeros_flagged_but_edge_zeros_tolerated() {
        let analyzer = ArtifactAnalyzer::default();
        let mut samples: Vec<f32> = sine(440.0, 16_000).iter().map(|s| s * 0.9 + 0.05).collect();

        samples[..20].iter_mut().for_each(|s| *s = 0.0);
        let finding = analyzer.analyze(&Waveform::mono(samples.clone()).unwrap());
        assert!(!finding.is_flagged(DIGITAL_SILENCE_DETECTED));

        samples[8_000..8_010].iter_mut().for_each(|s| *s = 0.0);
        let finding = analyzer.analyze(&Waveform::mono(samples).unwrap());
        assert!(finding.is_flagged(DIGITAL_SILENCE_DETECTED));
        assert_eq!(finding.metric("longest_zero_run"), Some(20.0));
    }

    #[test]
    fn test_single_interior_zero_is_digital_silence() {
        let mut samples: Vec<f32> = (0..16_000)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 16_000.0 + 0.3).sin())
            .collect();
        samples[8_000] = 0.0;
        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(samples.clone()).unwrap());
        assert!(finding.is_flagged(DIGITAL_SILENCE_DETECTED));
        assert_eq!(finding.metric("longest_zero_run"), Some(1.0));

        samples[8_001] = 0.0;
        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(samples).unwrap());
        assert!(finding.is_flagged(DIGITAL_SILENCE_DETECTED));
        assert_eq!(finding.metric("longest_zero_run"), Some(2.0));
    }

    #[test]
    fn test_click_rate() {
        let tone = sine(440.0, 16_000);
        assert_eq!(click_rate(&tone, 16_000), 0.0);

        // Quiet bed with a full-scale spike every 1000 samples
        let clicky: Vec<f32> = (0..16_000)
            .map(|i| if i % 1_000 == 500 { 1.0 } else if i % 2 == 0 { 1e-3 } else { -1e-3 })
            .collect();
        let rate = click_rate(&clicky, 16_000);
        assert!((rate - 32.0).abs() < 1e-3, "rate {rate}");

        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(clicky).unwrap());
        assert_eq!(finding.metric("click_rate_per_sec"), Some(rate));
    }

    #[test]
    fn test_waveform_symmetry() {
        let tone = sine(440.0, 16_000);
        let balanced = waveform_symmetry(&tone).unwrap();
        assert!((balanced - 1.0).abs() < 0.05, "symmetry {balanced}");

        // Negative half-waves squashed to a fifth
        let lopsided: Vec<f32> = tone.iter().map(|&s| if s < 0.0 { s * 0.2 } else { s }).collect();
        let ratio = waveform_symmetry(&lopsided).unwrap();
        assert!((ratio - 5.0).abs() < 0.1, "symmetry {ratio}");

        assert_eq!(waveform_symmetry(&[0.0, 0.5, 0.25]), None);
    }

    #[test]
    fn test_phase_resets_are_detected() {
        // Re-draw the oscillator phase every hop, like a frame-wise vocoder
        let mut seed: u32 = 7;
        let mut phase = 0.0f32;
        let samples: Vec<f32> = (0..16_000)
            .map(|i| {
                if i % 160 == 0 {
                    seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                    phase = (seed >> 8) as f32 / (1u32 << 24) as f32 * 2.0 * PI;
                }
                0.5 * (2.0 * PI * 500.0 * i as f32 / 16_000.0 + phase).sin()
            })
            .collect();
        let finding = ArtifactAnalyzer::default().analyze(&Waveform::mono(samples).unwrap());
        assert!(finding.is_flagged(PHASE_DISCONTINUITY_DETECTED), "{:?}", finding.flags);
        assert!(finding.metric("phase_jump_count").unwrap() >= 3.0);
    }
}
