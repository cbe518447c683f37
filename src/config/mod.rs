//! Configuration module for voicecheckr

mod profiles;

pub use profiles::{
    AggregationConfig, ArtifactConfig, FormantConfig, ForensicConfig, FrameConfig, FusionConfig,
    MetricThreshold, ProfileBuilder, ProfilePreset, SpectralConfig, TemporalConfig, DECISION_THRESHOLD,
    SAMPLE_RATE,
};
