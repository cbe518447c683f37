//! Output formatting for CLI results

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use colorful::Colorful;
use serde::Serialize;

use crate::config::{ForensicConfig, ProfilePreset};
use crate::core::{AnalyzerFinding, AudioProfile, DetectionReport};
use crate::detection::{Classification, FusionResult};

/// Everything reported for one analyzed file
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file: String,
    pub analyzed_at: DateTime<Local>,
    #[serde(flatten)]
    pub result: FusionResult,
    pub neural_score: f32,
    pub forensic_score: f32,
    pub flags: Vec<String>,
    pub findings: Vec<AnalyzerFinding>,
    pub audio: AudioProfile,
}

impl FileReport {
    pub fn new(path: &Path, detection: DetectionReport, audio: AudioProfile) -> Self {
        Self {
            file: path.display().to_string(),
            analyzed_at: Local::now(),
            result: detection.result,
            neural_score: detection.neural_score,
            forensic_score: detection.forensic.forensic_score,
            flags: detection.forensic.flags,
            findings: detection.forensic.findings,
            audio,
        }
    }
}

/// Result of processing one input path
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum FileOutcome {
    Analyzed(FileReport),
    Failed { file: String, error: String },
}

impl FileOutcome {
    pub fn classification(&self) -> Option<Classification> {
        match self {
            FileOutcome::Analyzed(report) => Some(report.result.classification),
            FileOutcome::Failed { .. } => None,
        }
    }
}

/// Format one outcome for terminal output
pub fn format_outcome(outcome: &FileOutcome, verbose: bool) -> String {
    match outcome {
        FileOutcome::Analyzed(report) => format_report(report, verbose),
        FileOutcome::Failed { file, error } => {
            format!("{} {}\n  {}\n", "!".yellow(), file.as_str().bold(), error.as_str().yellow())
        }
    }
}

fn format_report(report: &FileReport, verbose: bool) -> String {
    let classification = report.result.classification;
    let symbol = match classification {
        Classification::AiGenerated => classification.symbol().red(),
        Classification::Human => classification.symbol().green(),
    };

    let mut output = format!("{} {}\n", symbol, report.file.as_str().bold());
    output.push_str(&format!(
        "  {} {} (confidence: {:.0}%)\n",
        classification.label(),
        classification.description(),
        report.result.confidence_score * 100.0
    ));
    if !report.result.analyzers_agree {
        output.push_str(&format!("  {}\n", "Neural and forensic verdicts disagree".yellow()));
    }
    for line in &report.result.explanation {
        output.push_str(&format!("  {line}\n"));
    }

    if verbose {
        output.push_str(&format!(
            "\n  Neural: {:.3} | Forensic: {:.3} | Duration: {:.2}s | SNR: {:.1} dB\n",
            report.neural_score, report.forensic_score, report.audio.duration_secs, report.audio.snr_db
        ));
        for finding in &report.findings {
            let note = if finding.degenerate { " (insufficient signal)" } else { "" };
            output.push_str(&format!(
                "    {:<20} {:.3} {}{}\n",
                finding.analyzer,
                finding.sub_score,
                finding.verdict(),
                note
            ));
            for flag in finding.raised_flags() {
                output.push_str(&format!("      {} {}\n", "•".yellow(), flag));
            }
        }
    }

    output
}

/// Format every outcome as a JSON array
pub fn format_json(outcomes: &[FileOutcome]) -> Result<String> {
    serde_json::to_string_pretty(outcomes).context("Failed to serialize results")
}

/// Write the JSON results to `path`
pub fn write_json(path: &Path, outcomes: &[FileOutcome]) -> Result<()> {
    let json = format_json(outcomes)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Format a summary for multiple files
pub fn format_summary(outcomes: &[FileOutcome]) -> String {
    let count = |c: Classification| {
        outcomes
            .iter()
            .filter(|o| o.classification() == Some(c))
            .count()
    };
    let human = count(Classification::Human);
    let synthetic = count(Classification::AiGenerated);
    let failed = outcomes.len() - human - synthetic;

    let mut output = format!("\n{}\n", "Summary:".bold());
    output.push_str(&format!("  {} files analyzed\n", outcomes.len()));
    output.push_str(&format!("  {}\n", format!("✓ {human} human").as_str().green()));
    output.push_str(&format!("  {}\n", format!("✗ {synthetic} synthetic").as_str().red()));
    if failed > 0 {
        output.push_str(&format!("  {}\n", format!("! {failed} failed").as_str().yellow()));
    }
    output
}

/// Describe the available presets
pub fn format_profiles() -> String {
    let mut output = String::from("Available detection profiles:\n\n");
    for preset in ProfilePreset::all() {
        let config = ForensicConfig::from_preset(preset);
        output.push_str(&format!("  {} - {}\n", preset.name(), preset.description()));
        output.push_str(&format!(
            "    Fusion: {:.0}% neural / {:.0}% forensic, boost {:.2}, penalty {:.2}\n",
            config.fusion.neural_weight * 100.0,
            config.fusion.forensic_weight * 100.0,
            config.fusion.agreement_boost,
            config.fusion.disagreement_penalty
        ));
        output.push_str(&format!(
            "    Minimum phase jumps: {} | Minimum pauses: {}\n\n",
            config.artifact.min_phase_jumps, config.temporal.min_pause_count
        ));
    }
    output
}
