// src/core/aggregator.rs
//
// Runs the forensic analyzers concurrently and folds their findings into a
// single weighted forensic score.

use rayon::prelude::*;
use serde::Serialize;

use crate::config::{ForensicConfig, DECISION_THRESHOLD};
use crate::core::analysis::{
    AnalyzerFinding, ArtifactAnalyzer, ForensicAnalyzer, FormantAnalyzer, SpectralAnalyzer,
    TemporalAnalyzer, NEUTRAL_SCORE,
};
use crate::core::dsp::stats::finite_or;
use crate::core::waveform::Waveform;
use crate::detection::Classification;

/// Combined forensic evidence for one waveform
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForensicReport {
    /// Weighted mean of the analyzer sub-scores, in [0, 1]
    pub forensic_score: f32,
    /// One finding per analyzer, in registration order
    pub findings: Vec<AnalyzerFinding>,
    /// Raised flag names across all analyzers, deduplicated
    pub flags: Vec<String>,
    /// Explanations across all analyzers, in analyzer order
    pub explanations: Vec<String>,
}

impl ForensicReport {
    pub fn verdict(&self) -> Classification {
        Classification::from_probability(self.forensic_score, DECISION_THRESHOLD)
    }

    pub fn finding(&self, analyzer: &str) -> Option<&AnalyzerFinding> {
        self.findings.iter().find(|f| f.analyzer == analyzer)
    }

    pub fn is_flagged(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

struct WeightedAnalyzer {
    analyzer: Box<dyn ForensicAnalyzer>,
    weight: f32,
}

/// Ordered, weighted set of analyzers
pub struct ForensicAggregator {
    analyzers: Vec<WeightedAnalyzer>,
}

impl ForensicAggregator {
    /// Aggregator with no analyzers; see [`with_analyzer`](Self::with_analyzer)
    pub fn empty() -> Self {
        Self { analyzers: Vec::new() }
    }

    /// The four built-in analyzers, weighted and tuned by `config`
    pub fn from_config(config: &ForensicConfig) -> Self {
        let weights = &config.aggregation;
        Self::empty()
            .with_analyzer(
                SpectralAnalyzer::new(config.frames.clone(), config.spectral.clone()),
                weights.spectral_weight,
            )
            .with_analyzer(TemporalAnalyzer::new(config.temporal.clone()), weights.temporal_weight)
            .with_analyzer(
                FormantAnalyzer::new(config.frames.clone(), config.formant.clone()),
                weights.formant_weight,
            )
            .with_analyzer(
                ArtifactAnalyzer::new(config.frames.clone(), config.artifact.clone()),
                weights.artifact_weight,
            )
    }

    /// Register an additional analyzer; it runs after those already added
    pub fn with_analyzer(mut self, analyzer: impl ForensicAnalyzer + 'static, weight: f32) -> Self {
        self.push(Box::new(analyzer), weight);
        self
    }

    pub fn push(&mut self, analyzer: Box<dyn ForensicAnalyzer>, weight: f32) {
        self.analyzers.push(WeightedAnalyzer {
            analyzer,
            weight: finite_or(weight, 0.0).max(0.0),
        });
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(|w| w.analyzer.name()).collect()
    }

    /// Run every analyzer on the waveform and combine the findings
    pub fn run(&self, waveform: &Waveform) -> ForensicReport {
        // collect() keeps registration order regardless of completion order
        let findings: Vec<AnalyzerFinding> = self
            .analyzers
            .par_iter()
            .map(|w| w.analyzer.analyze(waveform))
            .collect();
        self.combine(findings)
    }

    /// Fold findings (in registration order) into a report
    pub fn combine(&self, findings: Vec<AnalyzerFinding>) -> ForensicReport {
        let mut weighted_sum = 0.0f32;
        let mut total_weight = 0.0f32;
        let mut flags: Vec<String> = Vec::new();
        let mut explanations = Vec::new();

        for (finding, entry) in findings.iter().zip(&self.analyzers) {
            let score = finite_or(finding.sub_score, NEUTRAL_SCORE).clamp(0.0, 1.0);
            weighted_sum += score * entry.weight;
            total_weight += entry.weight;

            for flag in finding.raised_flags() {
                if !flags.iter().any(|f| f == flag) {
                    flags.push(flag.to_string());
                }
            }
            explanations.extend(finding.explanations.iter().cloned());
        }

        let forensic_score = if total_weight > 0.0 {
            (weighted_sum / total_weight).clamp(0.0, 1.0)
        } else {
            NEUTRAL_SCORE
        };

        log::debug!(
            "aggregate: score={:.3} flags=[{}]",
            forensic_score,
            flags.join(", ")
        );

        ForensicReport {
            forensic_score,
            findings,
            flags,
            explanations,
        }
    }
}
