//! Forensic analyzers
//!
//! Each analyzer inspects one family of synthesis artifacts and turns it
//! into a sub-score in [0, 1] (0 = natural, 1 = synthetic), named flags and
//! human-readable explanations:
//! - Spectral consistency (flatness, bandwidth, high-frequency energy)
//! - Temporal dynamics (envelope jitter, pause regularity)
//! - Formant transitions (MFCC frame-to-frame deltas)
//! - Artifacts (phase discontinuities, digital silence)
//!
//! Analyzers never fail: a signal they cannot measure yields a neutral,
//! degenerate finding instead of an error.

mod artifact;
mod formant;
mod spectral;
mod temporal;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::DECISION_THRESHOLD;
use crate::core::dsp::stats::finite_or;
use crate::core::waveform::Waveform;
use crate::detection::Classification;

pub use artifact::{click_rate, waveform_symmetry, zero_runs, ArtifactAnalyzer, ZeroRun};
pub use formant::FormantAnalyzer;
pub use spectral::SpectralAnalyzer;
pub use temporal::{chunk_energy_std, detect_pauses, Pause, TemporalAnalyzer};

/// Sub-score reported when an analyzer has nothing to go on
pub const NEUTRAL_SCORE: f32 = 0.5;

/// Diagnostic flag raised on degenerate findings
pub const INSUFFICIENT_SIGNAL: &str = "insufficient_signal";

/// Flag names raised by the built-in analyzers
pub mod flags {
    pub const UNNATURAL_SPECTRAL_FLATNESS: &str = "unnatural_spectral_flatness";
    pub const FIXED_BANDWIDTH_SIGNATURE: &str = "fixed_bandwidth_signature";
    pub const HF_CUTOFF_DETECTED: &str = "hf_cutoff_detected";
    pub const UNNATURALLY_SMOOTH_ENVELOPE: &str = "unnaturally_smooth_envelope";
    pub const METRONOMIC_PAUSE_TIMING: &str = "metronomic_pause_timing";
    pub const OVERLY_SMOOTH_FORMANT_TRANSITIONS: &str = "overly_smooth_formant_transitions";
    pub const PHASE_DISCONTINUITY_DETECTED: &str = "phase_discontinuity_detected";
    pub const DIGITAL_SILENCE_DETECTED: &str = "digital_silence_detected";
}

/// One forensic check over a waveform.
///
/// Implementations are pure functions of the waveform and their own
/// configuration, so the aggregator may run them on any thread.
pub trait ForensicAnalyzer: Send + Sync {
    /// Stable identifier, e.g. `"spectral_analysis"`
    fn name(&self) -> &'static str;

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding;
}

/// Value attached to a flag name: a raised/clear bit or a measured metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Metric(f32),
}

impl FlagValue {
    pub fn is_raised(&self) -> bool {
        matches!(self, FlagValue::Bool(true))
    }

    pub fn as_metric(&self) -> Option<f32> {
        match self {
            FlagValue::Metric(v) => Some(*v),
            FlagValue::Bool(_) => None,
        }
    }
}

/// Output of a single analyzer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzerFinding {
    pub analyzer: &'static str,
    /// 0 = natural, 1 = synthetic
    pub sub_score: f32,
    pub flags: BTreeMap<String, FlagValue>,
    /// One entry per raised flag, in the order the checks ran
    pub explanations: Vec<String>,
    /// Set when the signal was too short, silent or otherwise unmeasurable
    pub degenerate: bool,
}

impl AnalyzerFinding {
    pub fn new(analyzer: &'static str) -> Self {
        Self {
            analyzer,
            sub_score: NEUTRAL_SCORE,
            flags: BTreeMap::new(),
            explanations: Vec::new(),
            degenerate: false,
        }
    }

    /// Neutral finding for a signal the analyzer could not measure
    pub fn degenerate(analyzer: &'static str, reason: &str) -> Self {
        log::debug!("{analyzer}: degenerate input ({reason})");
        let mut finding = Self::new(analyzer);
        finding.degenerate = true;
        finding.flags.insert(INSUFFICIENT_SIGNAL.to_string(), FlagValue::Bool(true));
        finding
    }

    /// Store the sub-score, mapping non-finite values to neutral
    pub fn set_score(&mut self, score: f32) {
        self.sub_score = finite_or(score, NEUTRAL_SCORE).clamp(0.0, 1.0);
    }

    pub fn set_metric(&mut self, name: &str, value: f32) {
        self.flags.insert(name.to_string(), FlagValue::Metric(finite_or(value, 0.0)));
    }

    /// Record a boolean flag; `explanation` is kept only when it is raised
    pub fn set_flag(&mut self, name: &str, raised: bool, explanation: impl FnOnce() -> String) {
        self.flags.insert(name.to_string(), FlagValue::Bool(raised));
        if raised {
            self.explanations.push(explanation());
        }
    }

    pub fn is_flagged(&self, name: &str) -> bool {
        self.flags.get(name).is_some_and(FlagValue::is_raised)
    }

    pub fn metric(&self, name: &str) -> Option<f32> {
        self.flags.get(name).and_then(FlagValue::as_metric)
    }

    /// Names of raised boolean flags, excluding the diagnostic one
    pub fn raised_flags(&self) -> impl Iterator<Item = &str> {
        self.flags
            .iter()
            .filter(|(name, value)| value.is_raised() && name.as_str() != INSUFFICIENT_SIGNAL)
            .map(|(name, _)| name.as_str())
    }

    /// Verdict this analyzer would give on its own
    pub fn verdict(&self) -> Classification {
        Classification::from_probability(self.sub_score, DECISION_THRESHOLD)
    }
}

/// Weighted mean of `(score, weight)` parts, neutral when all weights are zero
pub(crate) fn weighted_score(parts: &[(f32, f32)]) -> f32 {
    let total: f32 = parts.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let sum: f32 = parts
        .iter()
        .map(|(s, w)| finite_or(*s, NEUTRAL_SCORE) * w.max(0.0))
        .sum();
    (sum / total).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_finding_is_neutral() {
        let finding = AnalyzerFinding::degenerate("spectral_analysis", "silent");
        assert_eq!(finding.sub_score, NEUTRAL_SCORE);
        assert!(finding.degenerate);
        assert!(finding.is_flagged(INSUFFICIENT_SIGNAL));
        assert_eq!(finding.raised_flags().count(), 0);
        assert!(finding.explanations.is_empty());
    }

    #[test]
    fn test_set_flag_only_explains_raised() {
        let mut finding = AnalyzerFinding::new("temporal_analysis");
        finding.set_flag("a", false, || "not shown".to_string());
        finding.set_flag("b", true, || "shown".to_string());
        finding.set_metric("m", 0.25);
        assert_eq!(finding.explanations, vec!["shown".to_string()]);
        assert_eq!(finding.raised_flags().collect::<Vec<_>>(), vec!["b"]);
        assert_eq!(finding.metric("m"), Some(0.25));
        assert_eq!(finding.metric("b"), None);
    }

    #[test]
    fn test_set_score_guards_nan() {
        let mut finding = AnalyzerFinding::new("x");
        finding.set_score(f32::NAN);
        assert_eq!(finding.sub_score, NEUTRAL_SCORE);
        finding.set_score(3.0);
        assert_eq!(finding.sub_score, 1.0);
        assert_eq!(finding.verdict(), Classification::AiGenerated);
    }

    #[test]
    fn test_weighted_score() {
        assert!((weighted_score(&[(1.0, 0.4), (0.0, 0.6)]) - 0.4).abs() < 1e-6);
        assert_eq!(weighted_score(&[(1.0, 0.0)]), NEUTRAL_SCORE);
        assert!((weighted_score(&[(f32::NAN, 1.0), (1.0, 1.0)]) - 0.75).abs() < 1e-6);
    }
}
