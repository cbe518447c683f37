// src/core/fusion.rs
//
// Fuses the neural classifier's probability with the forensic score.

use crate::config::{FusionConfig, DECISION_THRESHOLD};
use crate::core::aggregator::ForensicReport;
use crate::core::analysis::NEUTRAL_SCORE;
use crate::core::dsp::stats::finite_or;
use crate::detection::{Classification, ConfidenceTier, FusionResult};
use crate::error::{ForensicError, Result};

/// Reported when no analyzer raised a flag
const NO_ARTIFACTS: &str = "No forensic synthesis artifacts detected";

/// Intermediate fusion values, exposed for reporting and tests
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusedScore {
    /// Weighted neural/forensic combination before boost or penalty
    pub baseline: f32,
    /// Final probability of synthesis
    pub probability: f32,
    pub agree: bool,
}

impl FusedScore {
    pub fn classification(&self) -> Classification {
        Classification::from_probability(self.probability, DECISION_THRESHOLD)
    }

    /// Confidence in the chosen label
    pub fn confidence(&self) -> f32 {
        match self.classification() {
            Classification::AiGenerated => self.probability,
            Classification::Human => 1.0 - self.probability,
        }
    }
}

/// Reject anything that is not a finite probability
pub fn validate_neural_score(score: f32) -> Result<f32> {
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ForensicError::InvalidNeuralScore(score))
    }
}

#[derive(Debug, Clone)]
pub struct FusionEngine {
    config: FusionConfig,
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

impl FusionEngine {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// Combine a validated neural score with a forensic score.
    ///
    /// When both sides reach the same verdict the baseline is pushed away
    /// from 0.5, scaled by its remaining headroom so it never leaves [0, 1].
    /// When they differ it is pulled toward 0.5; the pull never crosses the
    /// midpoint, so the baseline verdict stands.
    pub fn fuse_scores(&self, neural: f32, forensic: f32) -> FusedScore {
        let cfg = &self.config;
        let forensic = finite_or(forensic, NEUTRAL_SCORE).clamp(0.0, 1.0);

        let total = cfg.neural_weight + cfg.forensic_weight;
        let baseline = if total > 0.0 {
            (cfg.neural_weight * neural + cfg.forensic_weight * forensic) / total
        } else {
            neural
        };

        let neural_verdict = Classification::from_probability(neural, DECISION_THRESHOLD);
        let forensic_verdict = Classification::from_probability(forensic, DECISION_THRESHOLD);
        let agree = neural_verdict == forensic_verdict;

        let offset = baseline - 0.5;
        let probability = if agree {
            let boost = cfg.agreement_boost.clamp(0.0, 0.5);
            let headroom = 1.0 - 2.0 * offset.abs();
            // Agreeing verdicts put the baseline on their side of 0.5
            let direction = if offset > 0.0 {
                1.0
            } else if offset < 0.0 {
                -1.0
            } else {
                0.0
            };
            baseline + direction * boost * headroom
        } else {
            0.5 + offset * (1.0 - cfg.disagreement_penalty.clamp(0.0, 1.0))
        };

        FusedScore {
            baseline,
            probability: finite_or(probability, baseline).clamp(0.0, 1.0),
            agree,
        }
    }

    /// Fuse a neural probability with a forensic report into the final verdict
    pub fn fuse(&self, report: &ForensicReport, neural_score: f32) -> Result<FusionResult> {
        let neural = validate_neural_score(neural_score)?;
        let fused = self.fuse_scores(neural, report.forensic_score);
        let classification = fused.classification();

        let explanation = self.explain(neural, report, fused.agree);
        log::debug!(
            "fusion: neural={:.3} forensic={:.3} baseline={:.3} final={:.3} agree={}",
            neural,
            report.forensic_score,
            fused.baseline,
            fused.probability,
            fused.agree
        );

        Ok(FusionResult {
            classification,
            confidence_score: fused.confidence(),
            explanation,
            analyzers_agree: fused.agree,
        })
    }

    /// Neural phrase, then forensic evidence, then a disagreement note
    fn explain(&self, neural: f32, report: &ForensicReport, agree: bool) -> Vec<String> {
        let neural_verdict = Classification::from_probability(neural, DECISION_THRESHOLD);
        let neural_confidence = neural.max(1.0 - neural);
        let tier = ConfidenceTier::from_confidence(neural_confidence, self.config.high_confidence_tier);
        let subject = match neural_verdict {
            Classification::AiGenerated => "synthetic speech",
            Classification::Human => "human speech",
        };

        let mut parts = vec![format!(
            "Neural classifier indicates {} with {} ({:.0}%)",
            subject,
            tier.phrase(),
            neural_confidence * 100.0
        )];

        if report.explanations.is_empty() {
            parts.push(NO_ARTIFACTS.to_string());
        } else {
            parts.extend(report.explanations.iter().cloned());
        }

        if !agree {
            parts.push(format!(
                "Neural and forensic verdicts disagree (forensic score {:.2}); flagged for manual review",
                report.forensic_score
            ));
        }

        parts
    }
}
