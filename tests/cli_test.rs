// tests/cli_test.rs
//
// Drives the voicecheckr binary against generated WAV files.

mod test_utils;

use test_utils::{run_voicecheckr, scratch_dir};

fn json_results(stdout: &[u8]) -> serde_json::Value {
    serde_json::from_slice(stdout).expect("stdout should be JSON")
}

#[test]
fn test_generate_then_analyze() {
    let dir = scratch_dir("cli_generate");
    let dir_str = dir.to_string_lossy().to_string();

    let output = run_voicecheckr(&["generate", &dir_str, "--duration", "3"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    for stem in ["speech_like", "vocoder_like", "sine_440hz", "metronomic_pauses", "irregular_pauses", "digital_silence"] {
        assert!(dir.join(format!("{stem}.wav")).is_file(), "{stem}.wav missing");
    }

    let speech = dir.join("speech_like.wav").to_string_lossy().to_string();
    let output = run_voicecheckr(&["analyze", &speech, "--neural-score", "0.05", "--json"]);
    assert_eq!(output.status.code(), Some(0), "{}", String::from_utf8_lossy(&output.stderr));
    let results = json_results(&output.stdout);
    assert_eq!(results[0]["classification"], "HUMAN");
    assert_eq!(results[0]["analyzersAgree"], true);
    assert_eq!(results[0]["audio"]["originalSampleRate"], 16_000);

    let silence = dir.join("digital_silence.wav").to_string_lossy().to_string();
    let output = run_voicecheckr(&["analyze", &silence, "-n", "0.9", "--json"]);
    assert_eq!(output.status.code(), Some(2));
    let results = json_results(&output.stdout);
    assert_eq!(results[0]["classification"], "AI_GENERATED");
    let flags = results[0]["flags"].as_array().unwrap();
    assert!(flags.iter().any(|f| f == "digital_silence_detected"));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_directory_with_report_file() {
    let dir = scratch_dir("cli_directory");
    let audio = dir.join("audio");
    voicecheckr::testgen::generate_suite(&audio, 2.0).unwrap();
    std::fs::write(audio.join("README.txt"), "not audio").unwrap();

    let report = dir.join("report.json");
    let audio_str = audio.to_string_lossy().to_string();
    let report_str = report.to_string_lossy().to_string();
    let output = run_voicecheckr(&["analyze", &audio_str, "-n", "0.5", "--output", &report_str]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("6 files analyzed"), "{stdout}");

    let saved: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report).unwrap()).unwrap();
    assert_eq!(saved.as_array().unwrap().len(), 6);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_unreadable_file_reports_failure() {
    let dir = scratch_dir("cli_failure");
    let bogus = dir.join("bogus.wav");
    std::fs::write(&bogus, b"RIFF but not really").unwrap();

    let bogus_str = bogus.to_string_lossy().to_string();
    let output = run_voicecheckr(&["analyze", &bogus_str, "-n", "0.5", "--json"]);
    assert_eq!(output.status.code(), Some(1));
    let results = json_results(&output.stdout);
    assert!(results[0]["error"].is_string());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_rejects_out_of_range_neural_score() {
    let output = run_voicecheckr(&["analyze", "clip.wav", "-n", "1.2"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("[0, 1]"));
}

#[test]
fn test_profiles_and_config_commands() {
    let output = run_voicecheckr(&["profiles"]);
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for name in ["standard", "strict", "lenient"] {
        assert!(text.contains(name));
    }

    let output = run_voicecheckr(&["config", "--profile", "strict"]);
    assert!(output.status.success());
    let config: voicecheckr::ForensicConfig = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(config.preset, voicecheckr::ProfilePreset::Strict);
}
