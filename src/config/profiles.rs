// src/config/profiles.rs
//
// Threshold configuration and tuning presets for the forensic engine

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::dsp::stats::ramp_score;
use crate::error::{ForensicError, Result};

/// Analysis sample rate expected from the preprocessing front-end
pub const SAMPLE_RATE: u32 = 16_000;

/// Fused probability at or above which audio is labelled AI-generated
pub const DECISION_THRESHOLD: f32 = 0.5;

/// Calibration for one continuous metric.
///
/// `natural` and `synthetic` are the ends of the linear ramp that maps the
/// metric to a [0, 1] sub-score. `flag` is the value past which the named
/// flag is raised; it must lie between the two ends. The direction is
/// implied by their order: when `synthetic < natural`, low values are
/// suspicious.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub natural: f32,
    pub flag: f32,
    pub synthetic: f32,
}

impl MetricThreshold {
    pub const fn new(natural: f32, flag: f32, synthetic: f32) -> Self {
        Self { natural, flag, synthetic }
    }

    /// Map a metric value to a [0, 1] syntheticness score
    pub fn score(&self, value: f32) -> f32 {
        ramp_score(value, self.natural, self.synthetic)
    }

    /// Whether the value is past the flag threshold on the synthetic side
    pub fn is_flagged(&self, value: f32) -> bool {
        if !value.is_finite() {
            return false;
        }
        if self.synthetic < self.natural {
            value < self.flag
        } else {
            value > self.flag
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        let values = [self.natural, self.flag, self.synthetic];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForensicError::InvalidConfig(format!("{name}: thresholds must be finite")));
        }
        if self.natural == self.synthetic {
            return Err(ForensicError::InvalidConfig(format!(
                "{name}: natural and synthetic ends must differ"
            )));
        }
        let (lo, hi) = if self.natural < self.synthetic {
            (self.natural, self.synthetic)
        } else {
            (self.synthetic, self.natural)
        };
        if self.flag < lo || self.flag > hi {
            return Err(ForensicError::InvalidConfig(format!(
                "{name}: flag threshold {} outside [{lo}, {hi}]",
                self.flag
            )));
        }
        Ok(())
    }
}

/// STFT framing shared by the spectral, formant and artifact analyzers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub frame_length: usize,
    pub hop_length: usize,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_length: 512,
            hop_length: 160,
        }
    }
}

/// Spectral analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// Frames quieter than this RMS are left out of every statistic
    pub min_frame_rms: f32,
    /// Variance of per-frame spectral flatness
    pub flatness_variance: MetricThreshold,
    /// Fraction of energy that defines the effective bandwidth
    pub rolloff_fraction: f32,
    /// Std-dev of effective bandwidth across frames, in Hz
    pub bandwidth_std_hz: MetricThreshold,
    pub hf_cutoff_hz: f32,
    /// Mean share of energy above `hf_cutoff_hz`
    pub hf_energy_ratio: MetricThreshold,
    pub flatness_weight: f32,
    pub bandwidth_weight: f32,
    pub hf_weight: f32,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            min_frame_rms: 1e-4,
            flatness_variance: MetricThreshold::new(5e-3, 1e-3, 1e-4),
            rolloff_fraction: 0.95,
            bandwidth_std_hz: MetricThreshold::new(400.0, 100.0, 20.0),
            hf_cutoff_hz: 7_000.0,
            hf_energy_ratio: MetricThreshold::new(1e-4, 1e-5, 1e-6),
            flatness_weight: 0.40,
            bandwidth_weight: 0.35,
            hf_weight: 0.25,
        }
    }
}

/// Temporal analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemporalConfig {
    /// Envelope RMS window (25 ms at 16 kHz)
    pub envelope_frame: usize,
    /// Envelope hop (10 ms at 16 kHz)
    pub envelope_hop: usize,
    /// std(diff(envelope)) / mean(envelope)
    pub jitter: MetricThreshold,
    /// Percentile of the envelope taken as the noise floor
    pub noise_floor_percentile: f32,
    pub noise_floor_factor: f32,
    /// Silence threshold never exceeds this fraction of the loudest frame
    pub max_relative_silence: f32,
    pub min_pause_frames: usize,
    pub min_pause_count: usize,
    /// Std-dev of the spacing between pause onsets, in seconds
    pub pause_spacing_std_secs: MetricThreshold,
    pub jitter_weight: f32,
    pub pause_weight: f32,
}

impl Default for TemporalConfig {
    fn default() -> Self {
        Self {
            envelope_frame: 400,
            envelope_hop: 160,
            jitter: MetricThreshold::new(0.12, 0.06, 0.02),
            noise_floor_percentile: 0.10,
            noise_floor_factor: 3.0,
            max_relative_silence: 0.25,
            min_pause_frames: 3,
            min_pause_count: 4,
            pause_spacing_std_secs: MetricThreshold::new(0.15, 0.05, 0.01),
            jitter_weight: 0.5,
            pause_weight: 0.5,
        }
    }
}

/// Formant (MFCC) analyzer thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormantConfig {
    pub num_coefficients: usize,
    pub num_mel_bands: usize,
    pub min_freq_hz: f32,
    pub max_freq_hz: f32,
    /// Mel energies are floored this many dB below the frame's loudest band
    pub log_floor_db: f32,
    pub min_frame_rms: f32,
    /// Mean magnitude of frame-to-frame cepstral deltas
    pub delta_magnitude: MetricThreshold,
}

impl Default for FormantConfig {
    fn default() -> Self {
        Self {
            num_coefficients: 13,
            num_mel_bands: 26,
            min_freq_hz: 20.0,
            max_freq_hz: 8_000.0,
            log_floor_db: 60.0,
            min_frame_rms: 1e-4,
            delta_magnitude: MetricThreshold::new(1.0, 0.4, 0.15),
        }
    }
}

/// Artifact detector thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub ref_band_low_hz: f32,
    pub ref_band_high_hz: f32,
    /// Reference bin must reach this fraction of its peak magnitude for a
    /// frame pair to be inspected
    pub min_ref_magnitude_ratio: f32,
    pub phase_jump_radians: f32,
    pub min_phase_jumps: usize,
    /// Zero run length (samples) that flags digital silence anywhere
    pub min_zero_run: usize,
    /// Zero run length (samples) that flags digital silence inside the
    /// clip; 1 flags any interior exact zero
    pub interior_zero_run: usize,
    /// Lead/trail margin where shorter zero runs are tolerated
    pub edge_margin_secs: f32,
    pub phase_weight: f32,
    pub silence_weight: f32,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            ref_band_low_hz: 80.0,
            ref_band_high_hz: 4_000.0,
            min_ref_magnitude_ratio: 0.1,
            phase_jump_radians: 2.0,
            min_phase_jumps: 3,
            min_zero_run: 160,
            interior_zero_run: 1,
            edge_margin_secs: 0.1,
            phase_weight: 0.4,
            silence_weight: 0.6,
        }
    }
}

/// Weights of each analyzer in the forensic score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    pub spectral_weight: f32,
    pub temporal_weight: f32,
    pub formant_weight: f32,
    pub artifact_weight: f32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            spectral_weight: 0.30,
            temporal_weight: 0.30,
            formant_weight: 0.20,
            artifact_weight: 0.20,
        }
    }
}

/// Neural/forensic fusion policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub neural_weight: f32,
    pub forensic_weight: f32,
    /// Push toward the agreed side; at most 0.5 so extremes are not overshot
    pub agreement_boost: f32,
    /// Shrink toward the midpoint when the verdicts differ
    pub disagreement_penalty: f32,
    /// Neural confidence above this is reported as "high confidence"
    pub high_confidence_tier: f32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            neural_weight: 0.75,
            forensic_weight: 0.25,
            agreement_boost: 0.2,
            disagreement_penalty: 0.3,
            high_confidence_tier: 0.85,
        }
    }
}

/// Preset configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfilePreset {
    /// Balanced defaults
    Standard,
    /// Leans harder on forensic evidence
    Strict,
    /// Requires more evidence before flagging
    Lenient,
    /// User-defined settings
    Custom,
}

impl ProfilePreset {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Strict => "strict",
            Self::Lenient => "lenient",
            Self::Custom => "custom",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Standard => "Balanced defaults (75% neural / 25% forensic)",
            Self::Strict => "Heavier forensic weight, milder disagreement penalty",
            Self::Lenient => "More evidence required before flagging artifacts",
            Self::Custom => "User-defined settings",
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::Standard, Self::Strict, Self::Lenient]
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForensicConfig {
    pub preset: ProfilePreset,
    /// Shortest accepted clip
    pub min_duration_secs: f32,
    pub frames: FrameConfig,
    pub spectral: SpectralConfig,
    pub temporal: TemporalConfig,
    pub formant: FormantConfig,
    pub artifact: ArtifactConfig,
    pub aggregation: AggregationConfig,
    pub fusion: FusionConfig,
}

impl Default for ForensicConfig {
    fn default() -> Self {
        Self::from_preset(ProfilePreset::Standard)
    }
}

impl ForensicConfig {
    /// Create configuration from preset
    pub fn from_preset(preset: ProfilePreset) -> Self {
        match preset {
            ProfilePreset::Standard | ProfilePreset::Custom => Self::standard(preset),
            ProfilePreset::Strict => Self::strict(),
            ProfilePreset::Lenient => Self::lenient(),
        }
    }

    fn standard(preset: ProfilePreset) -> Self {
        Self {
            preset,
            min_duration_secs: 0.5,
            frames: FrameConfig::default(),
            spectral: SpectralConfig::default(),
            temporal: TemporalConfig::default(),
            formant: FormantConfig::default(),
            artifact: ArtifactConfig::default(),
            aggregation: AggregationConfig::default(),
            fusion: FusionConfig::default(),
        }
    }

    fn strict() -> Self {
        let mut config = Self::standard(ProfilePreset::Strict);
        config.fusion.neural_weight = 0.65;
        config.fusion.forensic_weight = 0.35;
        config.fusion.disagreement_penalty = 0.2;
        config.artifact.min_phase_jumps = 2;
        config
    }

    fn lenient() -> Self {
        let mut config = Self::standard(ProfilePreset::Lenient);
        config.fusion.agreement_boost = 0.1;
        config.fusion.disagreement_penalty = 0.4;
        config.artifact.min_phase_jumps = 5;
        config.temporal.min_pause_count = 6;
        config
    }

    /// Minimum waveform length in samples: long enough for the configured
    /// duration and at least one full frame of every analyzer
    pub fn min_samples(&self) -> usize {
        let by_duration = (self.min_duration_secs.max(0.0) * SAMPLE_RATE as f32).ceil() as usize;
        by_duration
            .max(self.frames.frame_length)
            .max(self.temporal.envelope_frame)
    }

    /// Reject configurations the analyzers cannot run with
    pub fn validate(&self) -> Result<()> {
        let nyquist = SAMPLE_RATE as f32 / 2.0;
        let invalid = |msg: String| Err(ForensicError::InvalidConfig(msg));

        if self.frames.frame_length < 64 {
            return invalid(format!("frame_length {} is below 64", self.frames.frame_length));
        }
        if self.frames.hop_length == 0 || self.frames.hop_length > self.frames.frame_length {
            return invalid(format!("hop_length {} must be in 1..=frame_length", self.frames.hop_length));
        }
        if self.temporal.envelope_hop == 0 || self.temporal.envelope_hop > self.temporal.envelope_frame {
            return invalid("envelope_hop must be in 1..=envelope_frame".to_string());
        }
        if !(0.0..1.0).contains(&self.spectral.rolloff_fraction) || self.spectral.rolloff_fraction == 0.0 {
            return invalid("rolloff_fraction must be in (0, 1)".to_string());
        }
        if self.spectral.hf_cutoff_hz <= 0.0 || self.spectral.hf_cutoff_hz >= nyquist {
            return invalid(format!(
                "hf_cutoff_hz {} must lie below the {nyquist} Hz Nyquist frequency",
                self.spectral.hf_cutoff_hz
            ));
        }
        if self.artifact.ref_band_low_hz >= self.artifact.ref_band_high_hz
            || self.artifact.ref_band_high_hz > nyquist
        {
            return invalid("reference band must be a non-empty range below Nyquist".to_string());
        }
        if self.formant.num_coefficients == 0
            || self.formant.num_coefficients > self.formant.num_mel_bands
        {
            return invalid("num_coefficients must be in 1..=num_mel_bands".to_string());
        }
        if self.formant.min_freq_hz >= self.formant.max_freq_hz || self.formant.max_freq_hz > nyquist {
            return invalid("mel range must be a non-empty range below Nyquist".to_string());
        }
        if !(0.0..=1.0).contains(&self.temporal.noise_floor_percentile) {
            return invalid("noise_floor_percentile must be in [0, 1]".to_string());
        }
        if !(0.0..=0.5).contains(&self.fusion.agreement_boost) {
            return invalid("agreement_boost must be in [0, 0.5]".to_string());
        }
        if !(0.0..=1.0).contains(&self.fusion.high_confidence_tier) {
            return invalid("high_confidence_tier must be in [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.fusion.disagreement_penalty) {
            return invalid("disagreement_penalty must be in [0, 1]".to_string());
        }

        check_weights(
            "spectral weights",
            &[self.spectral.flatness_weight, self.spectral.bandwidth_weight, self.spectral.hf_weight],
        )?;
        check_weights("temporal weights", &[self.temporal.jitter_weight, self.temporal.pause_weight])?;
        check_weights("artifact weights", &[self.artifact.phase_weight, self.artifact.silence_weight])?;
        check_weights(
            "analyzer weights",
            &[
                self.aggregation.spectral_weight,
                self.aggregation.temporal_weight,
                self.aggregation.formant_weight,
                self.aggregation.artifact_weight,
            ],
        )?;
        check_weights("fusion weights", &[self.fusion.neural_weight, self.fusion.forensic_weight])?;

        self.spectral.flatness_variance.validate("spectral.flatness_variance")?;
        self.spectral.bandwidth_std_hz.validate("spectral.bandwidth_std_hz")?;
        self.spectral.hf_energy_ratio.validate("spectral.hf_energy_ratio")?;
        self.temporal.jitter.validate("temporal.jitter")?;
        self.temporal.pause_spacing_std_secs.validate("temporal.pause_spacing_std_secs")?;
        self.formant.delta_magnitude.validate("formant.delta_magnitude")?;
        Ok(())
    }

    /// Load configuration from a JSON file. Missing fields take defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            ForensicError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        let mut config: Self = serde_json::from_str(&text).map_err(|e| {
            ForensicError::InvalidConfig(format!("cannot parse {}: {e}", path.display()))
        })?;
        config.preset = ProfilePreset::Custom;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ForensicError::InvalidConfig(format!("cannot serialize config: {e}")))
    }

    /// Per-user configuration location, if the platform has one
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("voicecheckr").join("config.json"))
    }
}

fn check_weights(name: &str, weights: &[f32]) -> Result<()> {
    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(ForensicError::InvalidConfig(format!("{name} must be non-negative")));
    }
    if weights.iter().sum::<f32>() <= 0.0 {
        return Err(ForensicError::InvalidConfig(format!("{name} must not all be zero")));
    }
    Ok(())
}

/// Builder for custom configurations
pub struct ProfileBuilder {
    config: ForensicConfig,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Self {
            config: ForensicConfig::default(),
        }
    }

    pub fn from_preset(preset: ProfilePreset) -> Self {
        Self {
            config: ForensicConfig::from_preset(preset),
        }
    }

    pub fn fusion_weights(mut self, neural: f32, forensic: f32) -> Self {
        self.config.fusion.neural_weight = neural;
        self.config.fusion.forensic_weight = forensic;
        self
    }

    pub fn agreement_boost(mut self, boost: f32) -> Self {
        self.config.fusion.agreement_boost = boost;
        self
    }

    pub fn disagreement_penalty(mut self, penalty: f32) -> Self {
        self.config.fusion.disagreement_penalty = penalty;
        self
    }

    pub fn analyzer_weights(mut self, spectral: f32, temporal: f32, formant: f32, artifact: f32) -> Self {
        self.config.aggregation = AggregationConfig {
            spectral_weight: spectral,
            temporal_weight: temporal,
            formant_weight: formant,
            artifact_weight: artifact,
        };
        self
    }

    pub fn min_duration_secs(mut self, secs: f32) -> Self {
        self.config.min_duration_secs = secs;
        self
    }

    pub fn frames(mut self, frame_length: usize, hop_length: usize) -> Self {
        self.config.frames = FrameConfig { frame_length, hop_length };
        self
    }

    /// Finish the configuration, rejecting inconsistent values
    pub fn build(mut self) -> Result<ForensicConfig> {
        self.config.preset = ProfilePreset::Custom;
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
