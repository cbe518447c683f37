//! Formant transition analysis over MFCC trajectories

use crate::config::{FormantConfig, FrameConfig};
use crate::core::dsp::{stats, MelFilterbank, Stft, WindowType};
use crate::core::waveform::Waveform;

use super::flags::OVERLY_SMOOTH_FORMANT_TRANSITIONS;
use super::{AnalyzerFinding, ForensicAnalyzer};

/// Fewest consecutive-frame deltas needed for a stable mean
const MIN_DELTAS: usize = 2;

/// Measures how fast the spectral envelope moves between frames.
///
/// Real articulators move continuously but unevenly, so cepstral
/// coefficients jump around. Many synthesizers interpolate formants and
/// produce trajectories that are too smooth.
pub struct FormantAnalyzer {
    frames: FrameConfig,
    config: FormantConfig,
}

impl FormantAnalyzer {
    pub fn new(frames: FrameConfig, config: FormantConfig) -> Self {
        Self { frames, config }
    }

    /// MFCC vector per STFT frame, `None` where the frame is silent
    fn cepstra(&self, waveform: &Waveform) -> Vec<Option<Vec<f32>>> {
        let cfg = &self.config;
        let stft = Stft::compute(
            waveform.samples(),
            waveform.sample_rate(),
            self.frames.frame_length,
            self.frames.hop_length,
            WindowType::Hann,
        );
        let bank = MelFilterbank::new(
            cfg.num_mel_bands,
            stft.fft_size,
            waveform.sample_rate(),
            cfg.min_freq_hz,
            cfg.max_freq_hz,
        );

        stft.frames
            .iter()
            .map(|frame| {
                if frame.rms < cfg.min_frame_rms {
                    return None;
                }
                bank.mfcc(&frame.power(), cfg.num_coefficients, cfg.log_floor_db)
            })
            .collect()
    }
}

impl Default for FormantAnalyzer {
    fn default() -> Self {
        Self::new(FrameConfig::default(), FormantConfig::default())
    }
}

/// Euclidean distance between two cepstra, ignoring the energy term c0
fn delta_magnitude(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .skip(1)
        .map(|(x, y)| (y - x) * (y - x))
        .sum::<f32>()
        .sqrt()
}

/// Spread of each cepstral coefficient over the voiced frames, ignoring c0.
///
/// Returns the mean coefficient of variation and the range (max - min) of
/// the per-coefficient standard deviations. Both are small when the
/// spectral envelope barely moves and every mel band changes alike.
fn coefficient_stability(voiced: &[&[f32]]) -> Option<(f32, f32)> {
    let width = voiced.iter().map(|c| c.len()).min()?;
    if voiced.len() < 2 || width < 2 {
        return None;
    }
    let (cvs, stds): (Vec<f32>, Vec<f32>) = (1..width)
        .map(|k| {
            let track: Vec<f32> = voiced.iter().map(|c| c[k]).collect();
            (stats::coefficient_of_variation(&track), stats::std_dev(&track))
        })
        .unzip();
    let max = stds.iter().copied().fold(f32::MIN, f32::max);
    let min = stds.iter().copied().fold(f32::MAX, f32::min);
    Some((stats::mean(&cvs), max - min))
}

impl ForensicAnalyzer for FormantAnalyzer {
    fn name(&self) -> &'static str {
        "formant_analysis"
    }

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding {
        let cepstra = self.cepstra(waveform);

        // Only pair frames that are adjacent in time and both voiced
        let (deltas, correlations): (Vec<f32>, Vec<f32>) = cepstra
            .windows(2)
            .filter_map(|pair| match (&pair[0], &pair[1]) {
                (Some(a), Some(b)) => Some((
                    delta_magnitude(a, b),
                    stats::correlation(&a[1..], &b[1..]),
                )),
                _ => None,
            })
            .unzip();

        if deltas.len() < MIN_DELTAS {
            return AnalyzerFinding::degenerate(self.name(), "too few consecutive non-silent frames");
        }

        let delta_cfg = &self.config.delta_magnitude;
        let mean_delta = stats::mean(&deltas);

        let mut finding = AnalyzerFinding::new(self.name());
        finding.set_metric("mfcc_delta_mean", mean_delta);
        finding.set_metric("mfcc_delta_std", stats::std_dev(&deltas));
        finding.set_metric("mfcc_frame_correlation", stats::mean(&correlations));
        let voiced: Vec<&[f32]> = cepstra.iter().flatten().map(Vec::as_slice).collect();
        if let Some((cv, std_range)) = coefficient_stability(&voiced) {
            finding.set_metric("mfcc_cv_mean", cv);
            finding.set_metric("mel_band_std_range", std_range);
        }
        finding.set_flag(
            OVERLY_SMOOTH_FORMANT_TRANSITIONS,
            delta_cfg.is_flagged(mean_delta),
            || format!("Formant transitions are overly smooth (mean MFCC delta {mean_delta:.3})"),
        );
        finding.set_score(delta_cfg.score(mean_delta));

        log::debug!(
            "formant: mean_delta={:.3} pairs={} score={:.3}",
            mean_delta,
            deltas.len(),
            finding.sub_score
        );
        finding
    }
}
