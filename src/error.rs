//! Error types for voicecheckr.
//!
//! Only input validation failures are surfaced to callers. Degenerate
//! signals inside an analyzer are recovered locally and never show up here.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, ForensicError>;

/// Errors raised before (or instead of) running the forensic pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForensicError {
    /// Waveform is not at the fixed analysis rate.
    #[error("Waveform must be sampled at {expected} Hz, got {actual} Hz")]
    WrongSampleRate { expected: u32, actual: u32 },

    /// Waveform must be mono.
    #[error("Waveform must be mono (single channel), got {0} channels")]
    NotMono(u16),

    /// Waveform shorter than the minimum analysis length.
    #[error("Waveform too short: {samples} samples, need at least {required}")]
    TooShort { samples: usize, required: usize },

    /// NaN or infinite sample value.
    #[error("Non-finite sample at index {index}")]
    NonFiniteSample { index: usize },

    /// Sample outside the normalized [-1, 1] range.
    #[error("Sample {value} at index {index} is outside [-1, 1]")]
    SampleOutOfRange { index: usize, value: f32 },

    /// Neural score outside [0, 1] or not finite.
    #[error("Neural score must be a probability in [0, 1], got {0}")]
    InvalidNeuralScore(f32),

    /// Configuration failed validation.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The neural classifier collaborator failed.
    #[error("Neural classifier failed: {0}")]
    Classifier(String),
}

impl ForensicError {
    /// True for errors caused by the caller's input rather than configuration
    /// or a collaborator.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ForensicError::WrongSampleRate { .. }
                | ForensicError::NotMono(_)
                | ForensicError::TooShort { .. }
                | ForensicError::NonFiniteSample { .. }
                | ForensicError::SampleOutOfRange { .. }
                | ForensicError::InvalidNeuralScore(_)
        )
    }
}
