//! Detection result types for voicecheckr

mod result;

pub use result::{Classification, ConfidenceTier, FusionResult};
