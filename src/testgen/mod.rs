// src/testgen/mod.rs
//
// Deterministic test signals for exercising the forensic analyzers, and a
// WAV writer so the same signals can be fed through the CLI.

use std::f32::consts::PI;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};

use crate::config::SAMPLE_RATE;

const SR: f32 = SAMPLE_RATE as f32;

/// Small linear congruential generator so signals are reproducible
#[derive(Debug, Clone)]
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    /// Uniform in [0, 1)
    pub fn next_unit(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (self.0 >> 8) as f32 / (1u32 << 24) as f32
    }

    /// Uniform in [-1, 1)
    pub fn next_signed(&mut self) -> f32 {
        self.next_unit() * 2.0 - 1.0
    }

    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }
}

/// Named signals written by `voicecheckr generate`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestSignal {
    /// Harmonic syllables with varied pitch, irregular gaps and a noise floor
    SpeechLike,
    /// Steady harmonic phrases separated by exact digital silence
    VocoderLike,
    /// Constant 440 Hz sine
    Sine,
    /// Tone with quiet pauses every 0.5 s
    MetronomicPauses,
    /// Tone with quiet pauses at irregular spacing
    IrregularPauses,
    /// All samples exactly zero
    DigitalSilence,
}

impl TestSignal {
    pub fn all() -> [Self; 6] {
        [
            Self::SpeechLike,
            Self::VocoderLike,
            Self::Sine,
            Self::MetronomicPauses,
            Self::IrregularPauses,
            Self::DigitalSilence,
        ]
    }

    pub fn file_stem(&self) -> &'static str {
        match self {
            Self::SpeechLike => "speech_like",
            Self::VocoderLike => "vocoder_like",
            Self::Sine => "sine_440hz",
            Self::MetronomicPauses => "metronomic_pauses",
            Self::IrregularPauses => "irregular_pauses",
            Self::DigitalSilence => "digital_silence",
        }
    }

    pub fn render(&self, duration_secs: f32) -> Vec<f32> {
        match self {
            Self::SpeechLike => speech_like(duration_secs, 42),
            Self::VocoderLike => vocoder_like(duration_secs),
            Self::Sine => sine(440.0, duration_secs, 0.5),
            Self::MetronomicPauses => metronomic_pauses(duration_secs),
            Self::IrregularPauses => irregular_pauses(duration_secs),
            Self::DigitalSilence => digital_silence(duration_secs),
        }
    }
}

fn num_samples(duration_secs: f32) -> usize {
    (duration_secs.max(0.0) * SR).round() as usize
}

/// Raised-cosine ramp: 0 at `pos == 0`, 1 at `pos >= len`
fn ramp(pos: usize, len: usize) -> f32 {
    if len == 0 || pos >= len {
        return 1.0;
    }
    0.5 - 0.5 * (PI * pos as f32 / len as f32).cos()
}

fn normalize(samples: &mut [f32], peak: f32) {
    let max = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if max > 0.0 {
        let gain = peak / max;
        samples.iter_mut().for_each(|s| *s *= gain);
    }
}

pub fn sine(freq: f32, duration_secs: f32, amplitude: f32) -> Vec<f32> {
    (0..num_samples(duration_secs))
        .map(|i| amplitude * (2.0 * PI * freq * i as f32 / SR).sin())
        .collect()
}

pub fn digital_silence(duration_secs: f32) -> Vec<f32> {
    vec![0.0; num_samples(duration_secs)]
}

/// Speech-like signal: voiced syllables with gliding pitch and vibrato,
/// occasional fricative bursts, irregular gaps and a constant noise floor
pub fn speech_like(duration_secs: f32, seed: u32) -> Vec<f32> {
    let n = num_samples(duration_secs);
    let mut rng = Lcg::new(seed);
    let mut out: Vec<f32> = (0..n).map(|_| 0.03 * rng.next_signed()).collect();

    let attack = (0.015 * SR) as usize;
    let release = (0.030 * SR) as usize;
    let mut t = 0.15f32;
    while t < duration_secs - 0.25 {
        let start = (t * SR) as usize;
        if rng.next_unit() < 0.25 {
            // fricative
            let len = (rng.range(0.06, 0.12) * SR) as usize;
            let amp = rng.range(0.15, 0.3);
            for k in 0..len.min(n.saturating_sub(start)) {
                let env = ramp(k, attack).min(ramp(len - k, attack));
                out[start + k] += amp * env * rng.next_signed();
            }
            t += len as f32 / SR;
        } else {
            let len = (rng.range(0.09, 0.28) * SR) as usize;
            let amp = rng.range(0.3, 0.8);
            let f0_start = rng.range(110.0, 220.0);
            let f0_end = f0_start * rng.range(0.8, 1.2);
            let mut phase = rng.range(0.0, 2.0 * PI);
            for k in 0..len.min(n.saturating_sub(start)) {
                let progress = k as f32 / len as f32;
                let vibrato = 3.0 * (2.0 * PI * 5.0 * (start + k) as f32 / SR).sin();
                let f0 = f0_start + (f0_end - f0_start) * progress + vibrato;
                phase += 2.0 * PI * f0 / SR;

                let mut voiced = 0.0f32;
                let mut h = 1;
                while h <= 10 && h as f32 * f0 < 7_000.0 {
                    voiced += (h as f32 * phase).sin() / h as f32;
                    h += 1;
                }
                let env = ramp(k, attack).min(ramp(len - k, release));
                out[start + k] += amp * env * voiced * 0.5;
            }
            t += len as f32 / SR;
        }
        t += rng.range(0.08, 0.35);
    }

    // A recorded noise floor never lands on exact zero
    for s in out.iter_mut().filter(|s| **s == 0.0) {
        *s = 1e-5;
    }
    normalize(&mut out, 0.9);
    out
}

/// Machine-like signal: identical harmonic phrases, clean 5 ms fades and
/// exact-zero gaps on a fixed 0.5 s grid
pub fn vocoder_like(duration_secs: f32) -> Vec<f32> {
    let n = num_samples(duration_secs);
    let period = (0.5 * SR) as usize;
    let phrase = (0.4 * SR) as usize;
    let fade = (0.005 * SR) as usize;
    let f0 = 180.0;

    let mut out: Vec<f32> = (0..n)
        .map(|i| {
            let pos = i % period;
            if pos >= phrase {
                return 0.0;
            }
            let env = ramp(pos, fade).min(ramp(phrase - pos, fade));
            let voiced: f32 = (1..10)
                .map(|h| (2.0 * PI * f0 * h as f32 * i as f32 / SR).sin() / (1.2 * h as f32))
                .sum();
            env * voiced
        })
        .collect();
    normalize(&mut out, 0.8);
    out
}

/// 220 Hz tone with 100 ms near-silent pauses starting at `pause_starts`
/// (seconds). Pauses keep a tiny noise floor so they are not digital silence.
pub fn tone_with_pauses(duration_secs: f32, pause_starts: &[f32]) -> Vec<f32> {
    let mut rng = Lcg::new(7);
    let pauses: Vec<(usize, usize)> = pause_starts
        .iter()
        .map(|&s| ((s * SR) as usize, ((s + 0.1) * SR) as usize))
        .collect();
    (0..num_samples(duration_secs))
        .map(|i| {
            let noise = 1e-3 * rng.next_signed();
            if pauses.iter().any(|&(a, b)| i >= a && i < b) {
                noise.abs().max(1e-5).copysign(noise)
            } else {
                0.5 * (2.0 * PI * 220.0 * i as f32 / SR).sin() + noise
            }
        })
        .collect()
}

/// Pauses every 0.500 s, starting at 0.4 s
pub fn metronomic_pauses(duration_secs: f32) -> Vec<f32> {
    let starts: Vec<f32> = (0..)
        .map(|k| 0.4 + 0.5 * k as f32)
        .take_while(|&s| s + 0.1 < duration_secs - 0.2)
        .collect();
    tone_with_pauses(duration_secs, &starts)
}

/// Pauses at irregular spacing
pub fn irregular_pauses(duration_secs: f32) -> Vec<f32> {
    const SPACING: [f32; 8] = [0.35, 0.8, 0.35, 1.1, 0.4, 0.7, 0.55, 0.9];
    let mut starts = Vec::new();
    let mut s = 0.3f32;
    for gap in SPACING.iter().cycle() {
        if s + 0.1 >= duration_secs - 0.2 {
            break;
        }
        starts.push(s);
        s += gap;
    }
    tone_with_pauses(duration_secs, &starts)
}

/// Write mono 32-bit float WAV at the analysis rate
pub fn write_wav(path: &Path, samples: &[f32]) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Write every [`TestSignal`] into `output_dir`
pub fn generate_suite(output_dir: &Path, duration_secs: f32) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    TestSignal::all()
        .iter()
        .map(|signal| {
            let path = output_dir.join(format!("{}.wav", signal.file_stem()));
            write_wav(&path, &signal.render(duration_secs))?;
            log::info!("wrote {}", path.display());
            Ok(path)
        })
        .collect()
}
