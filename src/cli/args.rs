//! CLI argument parsing with profile support

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::config::{ForensicConfig, ProfilePreset};

#[derive(Parser, Debug)]
#[command(name = "voicecheckr")]
#[command(author, version, about = "Detect synthetic (AI-generated) speech")]
#[command(after_help = "Exit status: 0 all clips human, 1 some files failed, 2 synthetic speech found")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze audio files or directories
    Analyze(AnalyzeArgs),

    /// Write the deterministic test signals as WAV files
    Generate(GenerateArgs),

    /// List the available detection profiles
    Profiles,

    /// Print a profile as JSON, as a starting point for --config
    Config {
        /// Profile to print
        #[arg(short, long, default_value = "standard", value_parser = parse_preset)]
        profile: ProfilePreset,
    },
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Files or directories to analyze
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Neural classifier's probability that the speech is synthetic
    #[arg(short, long, env = "VOICECHECKR_NEURAL_SCORE", value_parser = parse_probability)]
    pub neural_score: f32,

    /// Detection profile (standard, strict, lenient)
    #[arg(short, long, value_parser = parse_preset)]
    pub profile: Option<ProfilePreset>,

    /// JSON configuration file; overrides --profile
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON results to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory to write the signals into
    pub output_dir: PathBuf,

    /// Length of each signal in seconds
    #[arg(short, long, default_value_t = 4.0)]
    pub duration: f32,
}

impl AnalyzeArgs {
    /// Resolve the engine configuration: `--config`, then `--profile`,
    /// then the per-user config file, then the standard preset
    pub fn resolve_config(&self) -> Result<ForensicConfig> {
        self.resolve_config_with(ForensicConfig::default_path().as_deref())
    }

    fn resolve_config_with(&self, user_config: Option<&Path>) -> Result<ForensicConfig> {
        if let Some(path) = &self.config {
            return ForensicConfig::from_json_file(path)
                .with_context(|| format!("Invalid configuration file {}", path.display()));
        }
        if let Some(preset) = self.profile {
            return Ok(ForensicConfig::from_preset(preset));
        }
        match user_config {
            Some(path) if path.is_file() => {
                log::info!("using configuration from {}", path.display());
                ForensicConfig::from_json_file(path)
                    .with_context(|| format!("Invalid configuration file {}", path.display()))
            }
            _ => Ok(ForensicConfig::default()),
        }
    }
}

fn parse_preset(name: &str) -> Result<ProfilePreset, String> {
    ProfilePreset::from_name(name)
        .filter(|p| *p != ProfilePreset::Custom)
        .ok_or_else(|| format!("unknown profile '{name}' (expected standard, strict or lenient)"))
}

fn parse_probability(value: &str) -> Result<f32, String> {
    let score: f32 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number"))?;
    if score.is_finite() && (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(format!("neural score {value} must be within [0, 1]"))
    }
}
