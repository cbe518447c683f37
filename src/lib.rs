//! VoiceCheckr - Detect synthetic (AI-generated) speech
//!
//! Combines the probability from an external neural classifier with
//! signal-processing evidence of synthesis and returns a `HUMAN` or
//! `AI_GENERATED` verdict, a confidence score and a readable explanation.
//!
//! ## Features
//!
//! - **Four forensic analyzers**: spectral statistics, temporal envelope and
//!   pause rhythm, MFCC trajectory smoothness, phase and digital-silence
//!   artifacts
//! - **Weighted aggregation**: analyzers run in parallel; their sub-scores
//!   fold into a single forensic score
//! - **Neural/forensic fusion**: agreement sharpens the verdict,
//!   disagreement pulls it toward uncertainty
//! - **Profiles**: standard, strict and lenient presets, JSON config files
//! - **Front-end**: decode any common container, mix to mono, resample to
//!   16 kHz
//!
//! ## Module Structure
//!
//! - `core` - Analyzers, aggregation, fusion, decoding and DSP utilities
//! - `cli` - Command-line interface
//! - `config` - Thresholds, weights and presets
//! - `detection` - Verdict types
//! - `testgen` - Deterministic test signals
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use voicecheckr::{ForensicEngine, Waveform};
//!
//! # fn main() -> Result<(), voicecheckr::ForensicError> {
//! let samples = vec![0.0f32; 16_000];
//! let waveform = Waveform::mono(samples)?;
//!
//! let engine = ForensicEngine::new();
//! let result = engine.analyze(&waveform, 0.92)?;
//!
//! println!("{} ({:.0}%)", result.classification, result.confidence_score * 100.0);
//! for line in &result.explanation {
//!     println!("  {line}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Forensic Analyzers
//!
//! | Analyzer             | Weight | Flags                                                   |
//! |----------------------|--------|---------------------------------------------------------|
//! | `spectral_analysis`  | 0.30   | flatness, fixed bandwidth, high-frequency cutoff        |
//! | `temporal_analysis`  | 0.30   | smooth envelope, metronomic pauses                      |
//! | `formant_analysis`   | 0.20   | overly smooth formant transitions                       |
//! | `artifact_detection` | 0.20   | phase discontinuities, digital silence                  |

// Core analysis functionality
pub mod core;

// Command-line interface
pub mod cli;

// Configuration and profiles
pub mod config;

// Detection result types
pub mod detection;

pub mod error;

// Test signal generation
pub mod testgen;

// Re-export commonly used types at crate root for convenience
pub use crate::config::{ForensicConfig, ProfileBuilder, ProfilePreset, SAMPLE_RATE};
pub use crate::detection::{Classification, ConfidenceTier, FusionResult};
pub use crate::error::{ForensicError, Result};
pub use crate::core::{
    analyze, AnalyzerFinding, DetectionReport, EngineBuilder, FixedScore, FlagValue,
    ForensicAnalyzer, ForensicEngine, ForensicReport, NeuralClassifier, Waveform,
};
