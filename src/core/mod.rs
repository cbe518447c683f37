//! Core analysis and detection modules

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod decoder;
pub mod dsp;
pub mod fusion;
pub mod waveform;

pub use aggregator::{ForensicAggregator, ForensicReport};
pub use analysis::{AnalyzerFinding, FlagValue, ForensicAnalyzer};
pub use analyzer::{analyze, DetectionReport, EngineBuilder, FixedScore, ForensicEngine, NeuralClassifier};
pub use decoder::{load_audio, AudioData, AudioProfile, PreparedAudio};
pub use fusion::{FusedScore, FusionEngine};
pub use waveform::Waveform;
