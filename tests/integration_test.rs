// tests/integration_test.rs
//
// End-to-end properties of the forensic engine, driven through the public
// API with the deterministic signals from `voicecheckr::testgen`.

mod test_utils;

use test_utils::{forensic_report, waveform};
use voicecheckr::core::analysis::flags::{
    DIGITAL_SILENCE_DETECTED, METRONOMIC_PAUSE_TIMING, UNNATURALLY_SMOOTH_ENVELOPE,
};
use voicecheckr::core::FusionEngine;
use voicecheckr::testgen::{self, TestSignal};
use voicecheckr::{
    AnalyzerFinding, Classification, ForensicAnalyzer, ForensicConfig, ForensicEngine, ForensicError,
    ProfilePreset, Waveform,
};

#[test]
fn test_scores_always_in_range() {
    let engine = ForensicEngine::new();
    for signal in TestSignal::all() {
        let wf = waveform(signal.render(3.0));
        for neural in [0.0, 0.05, 0.5, 0.95, 1.0] {
            let report = engine.analyze_detailed(&wf, neural).unwrap();
            let forensic = &report.forensic;
            assert!((0.0..=1.0).contains(&forensic.forensic_score), "{:?}", signal);
            for finding in &forensic.findings {
                assert!((0.0..=1.0).contains(&finding.sub_score), "{:?} {}", signal, finding.analyzer);
            }
            let confidence = report.result.confidence_score;
            assert!((0.5..=1.0).contains(&confidence), "{:?} neural {} -> {}", signal, neural, confidence);
        }
    }
}

#[test]
fn test_all_zero_clip_flags_digital_silence() {
    let report = forensic_report(testgen::digital_silence(1.0));
    assert!(report.is_flagged(DIGITAL_SILENCE_DETECTED));
    let artifact = report.finding("artifact_detection").unwrap();
    assert!(artifact.explanations.iter().any(|e| e.contains("16000")));
}

#[test]
fn test_constant_sine_flags_smooth_envelope() {
    let report = forensic_report(testgen::sine(440.0, 2.0, 0.5));
    assert!(report.is_flagged(UNNATURALLY_SMOOTH_ENVELOPE));
    assert!(!report.is_flagged(DIGITAL_SILENCE_DETECTED));
}

#[test]
fn test_pause_rhythm() {
    let metronomic = forensic_report(testgen::metronomic_pauses(4.0));
    assert!(metronomic.is_flagged(METRONOMIC_PAUSE_TIMING));

    let irregular = forensic_report(testgen::irregular_pauses(4.0));
    assert!(!irregular.is_flagged(METRONOMIC_PAUSE_TIMING));

    let temporal = |r: &voicecheckr::ForensicReport| r.finding("temporal_analysis").unwrap().sub_score;
    assert!(temporal(&metronomic) > temporal(&irregular));
}

#[test]
fn test_analysis_is_deterministic() {
    let engine = ForensicEngine::new();
    let wf = waveform(testgen::speech_like(3.0, 11));
    let first = engine.analyze_detailed(&wf, 0.3).unwrap();
    let second = engine.analyze_detailed(&wf, 0.3).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_natural_speech_with_low_neural_score_is_human() {
    let engine = ForensicEngine::new();
    let report = engine
        .analyze_detailed(&waveform(testgen::speech_like(4.0, 42)), 0.05)
        .unwrap();

    assert!(report.forensic.forensic_score < 0.5, "forensic {}", report.forensic.forensic_score);
    assert!(!report.forensic.is_flagged(DIGITAL_SILENCE_DETECTED));
    assert!(!report.forensic.is_flagged(UNNATURALLY_SMOOTH_ENVELOPE));
    assert_eq!(report.result.classification, Classification::Human);
    assert!(report.result.analyzers_agree);
    assert!(report.result.confidence_score > 0.9);
    assert!(report.result.explanation[0].starts_with("Neural classifier indicates human speech with high confidence"));
    assert!(!report.result.explanation.iter().any(|e| e.contains("manual review")));
}

#[test]
fn test_vocoder_like_signal_is_synthetic() {
    let engine = ForensicEngine::new();
    let natural = engine
        .forensic_report(&waveform(testgen::speech_like(4.0, 42)))
        .unwrap();
    let report = engine
        .analyze_detailed(&waveform(testgen::vocoder_like(4.0)), 0.95)
        .unwrap();

    assert!(report.forensic.is_flagged(DIGITAL_SILENCE_DETECTED));
    assert!(report.forensic.is_flagged(METRONOMIC_PAUSE_TIMING));
    assert!(report.forensic.forensic_score > natural.forensic_score);
    assert_eq!(report.result.classification, Classification::AiGenerated);
    let explanation = &report.result.explanation;
    assert!(explanation[0].starts_with("Neural classifier indicates synthetic speech"));
    assert!(explanation[1..].iter().any(|e| e.starts_with("Digital silence")));
}

#[test]
fn test_fusion_is_monotonic() {
    let engine = FusionEngine::default();
    for forensic in [0.0, 0.1, 0.3, 0.49, 0.5, 0.7, 0.9, 1.0] {
        let mut previous = 0.0f32;
        for step in 0..=100 {
            let neural = step as f32 / 100.0;
            let p = engine.fuse_scores(neural, forensic).probability;
            assert!(p + 1e-6 >= previous, "forensic {forensic}: neural {neural} -> {p} < {previous}");
            previous = p;
        }
    }
    for neural in [0.0, 0.2, 0.5, 0.8, 1.0] {
        let mut previous = 0.0f32;
        for step in 0..=100 {
            let forensic = step as f32 / 100.0;
            let p = engine.fuse_scores(neural, forensic).probability;
            assert!(p + 1e-6 >= previous, "neural {neural}: forensic {forensic} -> {p} < {previous}");
            previous = p;
        }
    }
}

#[test]
fn test_agreement_boost_and_disagreement_penalty() {
    let engine = FusionEngine::default();
    for (neural, forensic) in [(0.9, 0.8), (0.6, 0.7), (0.1, 0.2), (0.3, 0.05)] {
        let fused = engine.fuse_scores(neural, forensic);
        assert!(fused.agree);
        assert!((fused.probability - 0.5).abs() >= (fused.baseline - 0.5).abs());
        assert_eq!(fused.probability >= 0.5, fused.baseline >= 0.5);
    }
    for (neural, forensic) in [(0.9, 0.1), (0.6, 0.2), (0.2, 0.9), (0.45, 0.55)] {
        let fused = engine.fuse_scores(neural, forensic);
        assert!(!fused.agree);
        assert!((fused.probability - 0.5).abs() <= (fused.baseline - 0.5).abs());
        assert_eq!(fused.probability >= 0.5, fused.baseline >= 0.5);
    }
}

#[test]
fn test_input_validation() {
    let engine = ForensicEngine::new();
    assert!(matches!(
        Waveform::new(vec![0.0; 16_000], 44_100, 1, 8_000),
        Err(ForensicError::WrongSampleRate { expected: 16_000, actual: 44_100 })
    ));
    assert!(matches!(
        Waveform::new(vec![0.0; 32_000], 16_000, 2, 8_000),
        Err(ForensicError::NotMono(2))
    ));
    assert!(matches!(
        engine.waveform(vec![0.0; 100]),
        Err(ForensicError::TooShort { samples: 100, .. })
    ));

    let mut samples = vec![0.0; 16_000];
    samples[42] = f32::NAN;
    assert!(matches!(Waveform::mono(samples), Err(ForensicError::NonFiniteSample { index: 42 })));

    let mut samples = vec![0.0; 16_000];
    samples[7] = 1.5;
    assert!(matches!(Waveform::mono(samples), Err(ForensicError::SampleOutOfRange { index: 7, .. })));

    let wf = waveform(testgen::sine(440.0, 1.0, 0.5));
    assert!(matches!(engine.analyze(&wf, -0.01), Err(ForensicError::InvalidNeuralScore(_))));
    assert!(matches!(engine.analyze(&wf, f32::NAN), Err(ForensicError::InvalidNeuralScore(_))));
}

struct LoudnessAnalyzer;

impl ForensicAnalyzer for LoudnessAnalyzer {
    fn name(&self) -> &'static str {
        "loudness"
    }

    fn analyze(&self, waveform: &Waveform) -> AnalyzerFinding {
        let mut finding = AnalyzerFinding::new(self.name());
        let peak = waveform.samples().iter().fold(0.0f32, |m, s| m.max(s.abs()));
        finding.set_metric("peak", peak);
        finding.set_flag("hot_master", peak > 0.99, || format!("Peak level {peak:.2} is at full scale"));
        finding.set_score(if peak > 0.99 { 1.0 } else { 0.0 });
        finding
    }
}

#[test]
fn test_custom_analyzer_joins_aggregation() {
    let engine = ForensicEngine::builder()
        .analyzer(LoudnessAnalyzer, 0.5)
        .build()
        .unwrap();
    let report = engine
        .forensic_report(&waveform(testgen::sine(300.0, 1.0, 1.0)))
        .unwrap();

    assert_eq!(report.findings.len(), 5);
    assert_eq!(report.findings.last().unwrap().analyzer, "loudness");
    assert!(report.is_flagged("hot_master"));
    assert!(report.explanations.last().unwrap().contains("full scale"));
}

#[test]
fn test_presets_change_fusion_only_through_config() {
    let wf = waveform(testgen::speech_like(3.0, 5));
    let standard = ForensicEngine::new().analyze_detailed(&wf, 0.7).unwrap();
    let strict = ForensicEngine::with_config(ForensicConfig::from_preset(ProfilePreset::Strict))
        .unwrap()
        .analyze_detailed(&wf, 0.7)
        .unwrap();

    // Same analyzers and frames, so identical spectral and formant evidence
    for name in ["spectral_analysis", "formant_analysis"] {
        assert_eq!(standard.forensic.finding(name), strict.forensic.finding(name));
    }
}
