//! Final verdict types returned by the fusion engine

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary verdict on a clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    #[serde(rename = "AI_GENERATED")]
    AiGenerated,
    #[serde(rename = "HUMAN")]
    Human,
}

impl Classification {
    /// Label a probability of synthesis against a decision threshold
    pub fn from_probability(probability: f32, threshold: f32) -> Self {
        if probability >= threshold {
            Classification::AiGenerated
        } else {
            Classification::Human
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "AI_GENERATED",
            Classification::Human => "HUMAN",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "✗",
            Classification::Human => "✓",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Classification::AiGenerated => "Likely synthetic speech",
            Classification::Human => "Likely human speech",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse wording for how sure a score is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceTier {
    Moderate,
    High,
}

impl ConfidenceTier {
    /// `High` only when `confidence` is strictly above `high_threshold`
    pub fn from_confidence(confidence: f32, high_threshold: f32) -> Self {
        if confidence > high_threshold {
            ConfidenceTier::High
        } else {
            ConfidenceTier::Moderate
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high confidence",
            ConfidenceTier::Moderate => "moderate confidence",
        }
    }
}

/// Outcome of fusing the neural score with the forensic evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusionResult {
    pub classification: Classification,
    /// Confidence in `classification`, in [0.5, 1]
    pub confidence_score: f32,
    /// Neural phrase, forensic findings, then a disagreement note if any
    pub explanation: Vec<String>,
    /// Whether the neural and forensic verdicts matched
    pub analyzers_agree: bool,
}

impl FusionResult {
    /// Probability of synthesis implied by the verdict and its confidence
    pub fn synthetic_probability(&self) -> f32 {
        match self.classification {
            Classification::AiGenerated => self.confidence_score,
            Classification::Human => 1.0 - self.confidence_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_threshold_is_inclusive() {
        assert_eq!(Classification::from_probability(0.5, 0.5), Classification::AiGenerated);
        assert_eq!(Classification::from_probability(0.4999, 0.5), Classification::Human);
    }

    #[test]
    fn test_tier_is_strict() {
        assert_eq!(ConfidenceTier::from_confidence(0.85, 0.85), ConfidenceTier::Moderate);
        assert_eq!(ConfidenceTier::from_confidence(0.86, 0.85), ConfidenceTier::High);
    }

    #[test]
    fn test_result_json_shape() {
        let result = FusionResult {
            classification: Classification::Human,
            confidence_score: 0.8,
            explanation: vec!["ok".to_string()],
            analyzers_agree: true,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["classification"], "HUMAN");
        assert_eq!(json["analyzersAgree"], true);
        assert!(json.get("confidenceScore").is_some());
        assert_eq!(json["explanation"], serde_json::json!(["ok"]));
        assert!((result.synthetic_probability() - 0.2).abs() < 1e-6);
    }
}
