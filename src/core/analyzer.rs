// src/core/analyzer.rs
//
// High-level forensic engine API with builder pattern.

use serde::Serialize;

use super::aggregator::{ForensicAggregator, ForensicReport};
use super::analysis::ForensicAnalyzer;
use super::fusion::{validate_neural_score, FusionEngine};
use super::waveform::Waveform;
use crate::config::{ForensicConfig, SAMPLE_RATE};
use crate::detection::FusionResult;
use crate::error::{ForensicError, Result};

/// Source of the neural probability that a clip is synthetic.
///
/// The engine treats the classifier as opaque: it is asked once per clip,
/// before any forensic analyzer runs.
pub trait NeuralClassifier: Send + Sync {
    fn synthetic_probability(&self, waveform: &Waveform) -> Result<f32>;
}

/// Classifier that always returns the same probability
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedScore(pub f32);

impl NeuralClassifier for FixedScore {
    fn synthetic_probability(&self, _waveform: &Waveform) -> Result<f32> {
        Ok(self.0)
    }
}

/// Fusion result plus the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionReport {
    pub result: FusionResult,
    pub neural_score: f32,
    pub forensic: ForensicReport,
}

/// Builder for ForensicEngine configuration
pub struct EngineBuilder {
    config: ForensicConfig,
    extra: Vec<(Box<dyn ForensicAnalyzer>, f32)>,
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            config: ForensicConfig::default(),
            extra: Vec::new(),
        }
    }

    pub fn config(mut self, config: ForensicConfig) -> Self {
        self.config = config;
        self
    }

    /// Add an analyzer after the four built-in ones
    pub fn analyzer(mut self, analyzer: impl ForensicAnalyzer + 'static, weight: f32) -> Self {
        self.extra.push((Box::new(analyzer), weight));
        self
    }

    pub fn build(self) -> Result<ForensicEngine> {
        self.config.validate()?;
        let mut aggregator = ForensicAggregator::from_config(&self.config);
        for (analyzer, weight) in self.extra {
            aggregator.push(analyzer, weight);
        }
        Ok(ForensicEngine {
            fusion: FusionEngine::new(self.config.fusion.clone()),
            aggregator,
            config: self.config,
        })
    }
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Main forensic engine
pub struct ForensicEngine {
    config: ForensicConfig,
    aggregator: ForensicAggregator,
    fusion: FusionEngine,
}

impl Default for ForensicEngine {
    fn default() -> Self {
        let config = ForensicConfig::default();
        Self {
            aggregator: ForensicAggregator::from_config(&config),
            fusion: FusionEngine::new(config.fusion.clone()),
            config,
        }
    }
}

impl ForensicEngine {
    /// Engine with the standard preset
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with a validated custom configuration
    pub fn with_config(config: ForensicConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> EngineBuilder {
        EngineBuilder::new()
    }

    pub fn config(&self) -> &ForensicConfig {
        &self.config
    }

    /// Validate raw mono 16 kHz samples against this engine's minimum length
    pub fn waveform(&self, samples: Vec<f32>) -> Result<Waveform> {
        Waveform::new(samples, SAMPLE_RATE, 1, self.config.min_samples())
    }

    /// Classify a waveform given the neural classifier's probability
    pub fn analyze(&self, waveform: &Waveform, neural_score: f32) -> Result<FusionResult> {
        Ok(self.analyze_detailed(waveform, neural_score)?.result)
    }

    /// Like [`analyze`](Self::analyze), keeping every analyzer finding
    pub fn analyze_detailed(&self, waveform: &Waveform, neural_score: f32) -> Result<DetectionReport> {
        let neural = validate_neural_score(neural_score)?;
        self.check_length(waveform)?;

        let forensic = self.aggregator.run(waveform);
        let result = self.fusion.fuse(&forensic, neural)?;
        log::info!(
            "{} ({:.0}% confidence), forensic score {:.3}",
            result.classification,
            result.confidence_score * 100.0,
            forensic.forensic_score
        );

        Ok(DetectionReport {
            result,
            neural_score: neural,
            forensic,
        })
    }

    /// Ask `classifier` for the neural score, then analyze
    pub fn analyze_with(&self, waveform: &Waveform, classifier: &dyn NeuralClassifier) -> Result<DetectionReport> {
        self.check_length(waveform)?;
        let score = classifier.synthetic_probability(waveform)?;
        self.analyze_detailed(waveform, score)
    }

    /// Run only the forensic analyzers
    pub fn forensic_report(&self, waveform: &Waveform) -> Result<ForensicReport> {
        self.check_length(waveform)?;
        Ok(self.aggregator.run(waveform))
    }

    fn check_length(&self, waveform: &Waveform) -> Result<()> {
        let required = self.config.min_samples();
        if waveform.len() < required {
            return Err(ForensicError::TooShort {
                samples: waveform.len(),
                required,
            });
        }
        Ok(())
    }
}

/// Classify `waveform` with the standard preset
pub fn analyze(waveform: &Waveform, neural_score: f32) -> Result<FusionResult> {
    ForensicEngine::new().analyze(waveform, neural_score)
}
