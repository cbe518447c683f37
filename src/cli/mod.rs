// src/cli/mod.rs
//
// Command-line interface module

mod args;
mod output;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::ForensicConfig;
use crate::core::{load_audio, FixedScore, ForensicEngine};
use crate::detection::Classification;
use crate::testgen;

pub use args::{AnalyzeArgs, Cli, Command, GenerateArgs};
pub use output::{format_json, format_outcome, format_profiles, format_summary, FileOutcome, FileReport};

/// Extensions picked up when walking directories
const AUDIO_EXTENSIONS: [&str; 10] = ["wav", "wave", "flac", "mp3", "ogg", "opus", "m4a", "aac", "aiff", "aif"];

/// Exit status when any file failed to analyze
pub const EXIT_FAILED: i32 = 1;
/// Exit status when synthetic speech was found
pub const EXIT_SYNTHETIC: i32 = 2;

/// Run a parsed command line and return the process exit status
pub fn run(cli: Cli) -> Result<i32> {
    let verbose = cli.verbose > 0;
    match cli.command {
        Command::Analyze(args) => analyze(&args, verbose),
        Command::Generate(args) => {
            let written = testgen::generate_suite(&args.output_dir, args.duration)?;
            println!("Wrote {} test signals to {}", written.len(), args.output_dir.display());
            Ok(0)
        }
        Command::Profiles => {
            print!("{}", format_profiles());
            Ok(0)
        }
        Command::Config { profile } => {
            println!("{}", ForensicConfig::from_preset(profile).to_json_pretty()?);
            Ok(0)
        }
    }
}

fn analyze(args: &AnalyzeArgs, verbose: bool) -> Result<i32> {
    let config = args.resolve_config()?;
    let engine = ForensicEngine::with_config(config).context("Invalid configuration")?;

    if let Some(jobs) = args.jobs {
        configure_thread_pool(jobs);
    }

    let files = collect_audio_files(&args.paths);
    if files.is_empty() {
        bail!("No audio files found (supported: {})", AUDIO_EXTENSIONS.join(", "));
    }
    if !args.json {
        eprintln!("Found {} audio file(s)\n", files.len());
    }

    let pb = if !args.json && files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|path| {
            let outcome = analyze_file(&engine, path, args.neural_score);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(path.display().to_string());
            }
            outcome
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    if args.json {
        println!("{}", format_json(&outcomes)?);
    } else {
        for outcome in &outcomes {
            println!("{}", format_outcome(outcome, verbose));
        }
        if outcomes.len() > 1 {
            println!("{}", format_summary(&outcomes));
        }
    }

    if let Some(path) = &args.output {
        output::write_json(path, &outcomes)?;
        if !args.json {
            eprintln!("Report saved: {}", path.display());
        }
    }

    Ok(exit_status(&outcomes))
}

fn analyze_file(engine: &ForensicEngine, path: &Path, neural_score: f32) -> FileOutcome {
    match try_analyze_file(engine, path, neural_score) {
        Ok(report) => FileOutcome::Analyzed(report),
        Err(e) => {
            log::warn!("{}: {:#}", path.display(), e);
            FileOutcome::Failed {
                file: path.display().to_string(),
                error: format!("{e:#}"),
            }
        }
    }
}

fn try_analyze_file(engine: &ForensicEngine, path: &Path, neural_score: f32) -> Result<FileReport> {
    let audio = load_audio(path)?;
    let waveform = engine
        .waveform(audio.samples)
        .with_context(|| format!("{} cannot be analyzed", path.display()))?;
    let detection = engine.analyze_with(&waveform, &FixedScore(neural_score))?;
    log::info!(
        "{}: {} ({:.0}%), forensic {:.3}",
        path.display(),
        detection.result.classification,
        detection.result.confidence_score * 100.0,
        detection.forensic.forensic_score
    );
    Ok(FileReport::new(path, detection, audio.profile))
}

/// Size the global rayon pool. It can only be built once per process, so a
/// later call logs a warning and keeps the existing pool.
fn configure_thread_pool(jobs: usize) -> bool {
    match rayon::ThreadPoolBuilder::new().num_threads(jobs).build_global() {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not configure {} worker threads: {}", jobs, e);
            false
        }
    }
}

fn exit_status(outcomes: &[FileOutcome]) -> i32 {
    if outcomes
        .iter()
        .any(|o| o.classification() == Some(Classification::AiGenerated))
    {
        EXIT_SYNTHETIC
    } else if outcomes.iter().any(|o| o.classification().is_none()) {
        EXIT_FAILED
    } else {
        0
    }
}

fn has_audio_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand directories into the audio files below them. Files named
/// explicitly are kept whatever their extension; duplicates are dropped.
pub fn collect_audio_files(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && has_audio_extension(e.path()))
                .map(|e| e.path().to_path_buf())
                .collect();
            found.sort();
            files.extend(found.into_iter().filter(|p| seen.insert(p.clone())));
        } else if seen.insert(path.clone()) {
            files.push(path.clone());
        }
    }

    files
}
