//! Temporal dynamics analysis
//!
//! Human speech has a jittery energy envelope and pauses at irregular
//! intervals. Synthesized speech often has a smooth envelope and pauses
//! that recur like a metronome. Zero-crossing spread and the phrase-level
//! energy spread are reported as metrics only.

use crate::config::TemporalConfig;
use crate::core::dsp::{frames, rms_envelope, stats};
use crate::core::waveform::Waveform;

use super::flags::{METRONOMIC_PAUSE_TIMING, UNNATURALLY_SMOOTH_ENVELOPE};
use super::{weighted_score, AnalyzerFinding, ForensicAnalyzer};

/// Fewest envelope frames the jitter statistic is computed over
const MIN_ENVELOPE_FRAMES: usize = 3;

/// Mean envelope below this is treated as silence
const MIN_MEAN_ENVELOPE: f32 = 1e-6;

/// Block length for the coarse energy profile
const ENERGY_CHUNK_SECS: f32 = 0.1;

/// Fewest blocks the coarse energy spread is reported for
const MIN_ENERGY_CHUNKS: usize = 5;

/// Standard deviation of RMS over consecutive 100 ms blocks. A near-zero
/// spread means the loudness never moves at the phrase level.
pub fn chunk_energy_std(samples: &[f32], sample_rate: u32) -> Option<f32> {
    let chunk = (ENERGY_CHUNK_SECS * sample_rate as f32) as usize;
    let energies = rms_envelope(samples, chunk, chunk);
    (energies.len() >= MIN_ENERGY_CHUNKS).then(|| stats::std_dev(&energies))
}

/// A run of silent envelope frames strictly inside the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pause {
    /// Index of the first silent envelope frame
    pub start_frame: usize,
    /// Number of consecutive silent frames
    pub frames: usize,
}

/// Locate pauses in an RMS envelope.
///
/// A frame is silent when its RMS is at or below an adaptive threshold:
/// a multiple of the envelope's low percentile, capped at a fraction of the
/// loudest frame. Leading and trailing silence is not a pause.
pub fn detect_pauses(envelope: &[f32], config: &TemporalConfig) -> Vec<Pause> {
    let peak = envelope.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 || !peak.is_finite() {
        return Vec::new();
    }
    let noise_floor = stats::percentile(envelope, config.noise_floor_percentile);
    let threshold = (noise_floor * config.noise_floor_factor).min(peak * config.max_relative_silence);

    let mut pauses = Vec::new();
    let mut run_start: Option<usize> = None;
    for (i, &level) in envelope.iter().enumerate() {
        match (level <= threshold, run_start) {
            (true, None) => run_start = Some(i),
            (false, Some(start)) => {
                let frames = i - start;
                if start > 0 && frames >= config.min_pause_frames {
                    pauses.push(Pause { start_frame: start, frames });
                }
                run_start = None;
            }
            _ => {}
        }
    }
    // A run still open at the end touches the last frame and is dropped
    pauses
}

pub struct TemporalAnalyzer {
    config: TemporalConfig,
}

impl TemporalAnalyzer {
    pub fn new(config: TemporalConfig) -> Self {
        Self { config }
    }
}

impl Default for TemporalAnalyzer {
    fn default() -> Self {
        Self::new(TemporalConfig::default())
    }
}

impl ForensicAnalyzer for TemporalAnalyzer {
    fn name(&self) -> &'static str {
        "temporal_analysis"
    }

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding {
        let cfg = &self.config;
        let envelope = rms_envelope(waveform.samples(), cfg.envelope_frame, cfg.envelope_hop);
        if envelope.len() < MIN_ENVELOPE_FRAMES {
            return AnalyzerFinding::degenerate(self.name(), "envelope too short");
        }
        let mean_level = stats::mean(&envelope);
        if mean_level < MIN_MEAN_ENVELOPE {
            return AnalyzerFinding::degenerate(self.name(), "silent envelope");
        }

        let mut finding = AnalyzerFinding::new(self.name());

        // Envelope jitter
        let jitter = stats::std_dev(&stats::diff(&envelope)) / mean_level;
        finding.set_metric("envelope_jitter", jitter);
        finding.set_flag(UNNATURALLY_SMOOTH_ENVELOPE, cfg.jitter.is_flagged(jitter), || {
            format!("Energy envelope is unnaturally smooth (jitter {jitter:.3})")
        });

        let zcr: Vec<f32> = frames(waveform.samples(), cfg.envelope_frame, cfg.envelope_hop)
            .map(stats::zero_crossing_rate)
            .collect();
        finding.set_metric("zcr_cv", stats::coefficient_of_variation(&zcr));
        if let Some(spread) = chunk_energy_std(waveform.samples(), waveform.sample_rate()) {
            finding.set_metric("chunk_energy_std", spread);
        }

        // Pause regularity
        let hop_secs = cfg.envelope_hop as f32 / waveform.sample_rate() as f32;
        let pauses = detect_pauses(&envelope, cfg);
        finding.set_metric("pause_count", pauses.len() as f32);
        if !pauses.is_empty() {
            let total_frames: usize = pauses.iter().map(|p| p.frames).sum();
            finding.set_metric(
                "mean_pause_secs",
                total_frames as f32 * hop_secs / pauses.len() as f32,
            );
        }

        let (pause_score, metronomic) = if pauses.len() >= cfg.min_pause_count.max(2) {
            let onsets: Vec<f32> = pauses.iter().map(|p| p.start_frame as f32 * hop_secs).collect();
            let spacing_std = stats::std_dev(&stats::diff(&onsets));
            finding.set_metric("pause_spacing_std_secs", spacing_std);
            (
                cfg.pause_spacing_std_secs.score(spacing_std),
                cfg.pause_spacing_std_secs.is_flagged(spacing_std),
            )
        } else {
            (0.0, false)
        };
        finding.set_flag(METRONOMIC_PAUSE_TIMING, metronomic, || {
            format!(
                "{} pauses recur at near-constant intervals, suggesting machine timing",
                pauses.len()
            )
        });

        finding.set_score(weighted_score(&[
            (cfg.jitter.score(jitter), cfg.jitter_weight),
            (pause_score, cfg.pause_weight),
        ]));

        log::debug!(
            "temporal: jitter={:.3} pauses={} score={:.3}",
            jitter,
            pauses.len(),
            finding.sub_score
        );
        finding
    }
}
