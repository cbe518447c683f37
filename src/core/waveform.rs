// src/core/waveform.rs
//
// Validated, immutable analysis input.

use std::sync::Arc;

use crate::config::SAMPLE_RATE;
use crate::error::{ForensicError, Result};

/// Normalized mono waveform at the fixed analysis rate.
///
/// Samples are shared behind an `Arc` so analyzers on different threads
/// read the same buffer without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Arc<[f32]>,
    sample_rate: u32,
}

impl Waveform {
    /// Validate and wrap samples produced by the preprocessing front-end.
    ///
    /// `min_samples` is the shortest clip the configured analyzers accept
    /// (see `ForensicConfig::min_samples`).
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16, min_samples: usize) -> Result<Self> {
        if channels != 1 {
            return Err(ForensicError::NotMono(channels));
        }
        if sample_rate != SAMPLE_RATE {
            return Err(ForensicError::WrongSampleRate {
                expected: SAMPLE_RATE,
                actual: sample_rate,
            });
        }
        if samples.len() < min_samples {
            return Err(ForensicError::TooShort {
                samples: samples.len(),
                required: min_samples,
            });
        }
        for (index, &value) in samples.iter().enumerate() {
            if !value.is_finite() {
                return Err(ForensicError::NonFiniteSample { index });
            }
            if value.abs() > 1.0 {
                return Err(ForensicError::SampleOutOfRange { index, value });
            }
        }

        Ok(Self {
            samples: samples.into(),
            sample_rate,
        })
    }

    /// Mono 16 kHz waveform with the default minimum length
    pub fn mono(samples: Vec<f32>) -> Result<Self> {
        let min_samples = crate::config::ForensicConfig::default().min_samples();
        Self::new(samples, SAMPLE_RATE, 1, min_samples)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
