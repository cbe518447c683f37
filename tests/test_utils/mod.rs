#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

use voicecheckr::{ForensicEngine, ForensicReport, Waveform};

pub fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_voicecheckr"))
}

pub fn run_voicecheckr(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("VOICECHECKR_NEURAL_SCORE")
        .output()
        .expect("Failed to execute voicecheckr")
}

/// Fresh scratch directory under the system temp dir
pub fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("voicecheckr_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).expect("Failed to create scratch dir");
    dir
}

pub fn waveform(samples: Vec<f32>) -> Waveform {
    Waveform::mono(samples).expect("test signal should be a valid waveform")
}

pub fn forensic_report(samples: Vec<f32>) -> ForensicReport {
    ForensicEngine::new()
        .forensic_report(&waveform(samples))
        .expect("forensic analysis failed")
}
