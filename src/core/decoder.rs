// src/core/decoder.rs
//
// Audio decoding and preprocessing front-end.
// Uses Symphonia for format-agnostic decoding and rubato for resampling to
// the fixed analysis rate.

use anyhow::{bail, Context, Result};
use rubato::{FftFixedIn, Resampler};
use serde::Serialize;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::config::SAMPLE_RATE;
use crate::core::dsp::{rms_envelope, stats};

/// Samples at or above this magnitude count as clipped
const CLIP_LEVEL: f32 = 0.999;
/// Share of clipped samples that marks a clip as clipping
const CLIP_RATIO: f32 = 1e-3;
/// Frames this far below the loudest frame count as silence
const SILENCE_DB: f32 = -40.0;
/// Peak level after normalization
const NORMALIZE_PEAK: f32 = 0.95;
const RESAMPLE_CHUNK: usize = 1024;

/// Container for decoded audio data and metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Interleaved samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_secs: f64,
    /// Original codec name
    pub codec_name: String,
}

/// Decode audio file to floating-point samples
pub fn decode_audio(path: &Path) -> Result<AudioData> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let mut probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Failed to probe file format - may be corrupted or unsupported")?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No supported audio track found in file")?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .context("File does not specify sample rate")?;
    let channels = track.codec_params.channels.map(|c| c.count()).unwrap_or(1);
    if channels == 0 {
        bail!("File reports 0 audio channels");
    }
    let codec_name = format!("{:?}", track.codec_params.codec);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .context("Failed to create decoder for audio codec")?;

    let mut samples: Vec<f32> = Vec::new();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        let packet = match probed.format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break
            }
            Err(symphonia::core::errors::Error::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(buf) => buf,
            Err(symphonia::core::errors::Error::DecodeError(msg)) => {
                log::warn!("{}: skipping undecodable packet ({msg})", path.display());
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        if sample_buf.is_none() {
            let spec = *decoded.spec();
            sample_buf = Some(SampleBuffer::new(decoded.capacity() as u64, spec));
        }

        if let Some(ref mut buf) = sample_buf {
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }
    }

    if samples.is_empty() {
        bail!("No audio samples decoded from file");
    }

    let duration_secs = samples.len() as f64 / (sample_rate as f64 * channels as f64);

    Ok(AudioData {
        samples,
        sample_rate,
        channels,
        duration_secs,
        codec_name,
    })
}

/// Average interleaved channels down to mono
pub fn extract_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Resample mono audio with an FFT resampler
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let new_length = (samples.len() as f64 * to_rate as f64 / from_rate as f64).round() as usize;
    let mut resampler = FftFixedIn::<f32>::new(
        from_rate as usize,
        to_rate as usize,
        RESAMPLE_CHUNK,
        2,
        1,
    )
    .with_context(|| format!("Cannot resample {from_rate} Hz to {to_rate} Hz"))?;

    let delay = resampler.output_delay();
    let mut output = Vec::with_capacity(new_length + delay);
    let mut pos = 0;

    // Feed zero-padded chunks until the delayed output covers the signal
    while output.len() < new_length + delay {
        let needed = resampler.input_frames_next();
        let mut chunk = vec![0.0f32; needed];
        if pos < samples.len() {
            let end = (pos + needed).min(samples.len());
            chunk[..end - pos].copy_from_slice(&samples[pos..end]);
        }
        pos += needed;

        let processed = resampler
            .process(&[chunk], None)
            .context("Resampling failed")?;
        match processed.into_iter().next() {
            Some(channel) if !channel.is_empty() => output.extend(channel),
            _ => bail!("Resampler produced no output"),
        }
    }

    Ok(output.into_iter().skip(delay).take(new_length).collect())
}

/// Slice with leading and trailing frames below `threshold_db` (relative
/// to the loudest frame) removed
pub fn trim_silence(samples: &[f32], sample_rate: u32, threshold_db: f32) -> &[f32] {
    let frame = (sample_rate as usize / 40).max(1);
    let hop = (sample_rate as usize / 100).max(1);
    let envelope = rms_envelope(samples, frame, hop);
    let peak = envelope.iter().copied().fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return samples;
    }
    let floor = peak * 10f32.powf(threshold_db / 20.0);

    let first = envelope.iter().position(|&e| e > floor);
    let last = envelope.iter().rposition(|&e| e > floor);
    match (first, last) {
        (Some(first), Some(last)) => {
            let start = first * hop;
            let end = (last * hop + frame).min(samples.len());
            &samples[start..end]
        }
        _ => samples,
    }
}

/// Scale so the largest magnitude equals `target`; silence is left alone
pub fn peak_normalize(samples: &mut [f32], target: f32) {
    let peak = samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
    if peak > 0.0 && peak.is_finite() {
        let gain = target / peak;
        samples.iter_mut().for_each(|s| *s = (*s * gain).clamp(-1.0, 1.0));
    }
}

/// Technical profile of the audio, measured before normalization
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProfile {
    pub duration_secs: f32,
    pub original_sample_rate: u32,
    pub channels: usize,
    pub rms_energy: f32,
    /// Loud-frame level over quiet-frame level, in dB
    pub snr_db: f32,
    pub clipping_detected: bool,
    /// Share of 25 ms frames more than 40 dB below the loudest
    pub silence_ratio: f32,
    /// Number of non-silent stretches
    pub num_segments: usize,
}

impl AudioProfile {
    pub fn measure(mono: &[f32], sample_rate: u32, original_sample_rate: u32, channels: usize) -> Self {
        let frame = (sample_rate as usize / 40).max(1);
        let hop = (sample_rate as usize / 100).max(1);
        let envelope = rms_envelope(mono, frame, hop);
        let peak = envelope.iter().copied().fold(0.0f32, f32::max);
        let floor = peak * 10f32.powf(SILENCE_DB / 20.0);

        let silent: Vec<bool> = envelope.iter().map(|&e| peak <= 0.0 || e <= floor).collect();
        let silence_ratio = if silent.is_empty() {
            1.0
        } else {
            silent.iter().filter(|&&s| s).count() as f32 / silent.len() as f32
        };
        let num_segments = silent
            .iter()
            .enumerate()
            .filter(|&(i, &s)| !s && (i == 0 || silent[i - 1]))
            .count();

        let loud = stats::percentile(&envelope, 0.9);
        let quiet = stats::percentile(&envelope, 0.1).max(1e-8);
        let snr_db = if loud > 0.0 {
            (20.0 * (loud / quiet).log10()).clamp(0.0, 120.0)
        } else {
            0.0
        };

        let clipped = mono.iter().filter(|s| s.abs() >= CLIP_LEVEL).count();
        let clipping_detected = !mono.is_empty() && clipped as f32 / mono.len() as f32 > CLIP_RATIO;

        Self {
            duration_secs: mono.len() as f32 / sample_rate.max(1) as f32,
            original_sample_rate,
            channels,
            rms_energy: stats::rms(mono),
            snr_db,
            clipping_detected,
            silence_ratio,
            num_segments,
        }
    }
}

/// Mono 16 kHz samples ready for the forensic engine
#[derive(Debug, Clone)]
pub struct PreparedAudio {
    pub samples: Vec<f32>,
    pub profile: AudioProfile,
    pub codec_name: String,
}

/// Mix to mono, resample to the analysis rate, trim edge silence and
/// peak-normalize
pub fn prepare(audio: &AudioData) -> Result<PreparedAudio> {
    let mono = extract_mono(&audio.samples, audio.channels);
    let resampled = resample(&mono, audio.sample_rate, SAMPLE_RATE)?;

    let profile = AudioProfile::measure(&resampled, SAMPLE_RATE, audio.sample_rate, audio.channels);
    if profile.clipping_detected {
        log::warn!("input appears clipped; spectral statistics may be skewed");
    }

    let mut samples = trim_silence(&resampled, SAMPLE_RATE, SILENCE_DB).to_vec();
    if samples.is_empty() {
        log::warn!("audio trimmed to nothing; keeping the untrimmed signal");
        samples = resampled;
    }
    // Resampling can overshoot slightly; normalization brings it back in range
    peak_normalize(&mut samples, NORMALIZE_PEAK);

    Ok(PreparedAudio {
        samples,
        profile,
        codec_name: audio.codec_name.clone(),
    })
}

/// Decode and prepare a file in one step
pub fn load_audio(path: &Path) -> Result<PreparedAudio> {
    let audio = decode_audio(path)?;
    log::debug!(
        "{}: {} Hz, {} ch, {:.2}s, {}",
        path.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration_secs,
        audio.codec_name
    );
    prepare(&audio).with_context(|| format!("Failed to preprocess {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_extract_mono() {
        let mono = extract_mono(&[0.5, -0.5, 0.3, -0.1], 2);
        assert_eq!(mono.len(), 2);
        assert!(mono[0].abs() < 1e-6);
        assert!((mono[1] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn test_resample_length_and_pitch() {
        let input: Vec<f32> = (0..44_100)
            .map(|i| 0.5 * (2.0 * PI * 440.0 * i as f32 / 44_100.0).sin())
            .collect();
        let output = resample(&input, 44_100, 16_000).unwrap();
        assert_eq!(output.len(), 16_000);
        // 440 Hz over one second crosses zero ~880 times
        let crossings = output.windows(2).filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0)).count();
        assert!((860..=900).contains(&crossings), "{crossings}");
    }

    #[test]
    fn test_trim_silence() {
        let mut samples = vec![0.0f32; 8_000];
        samples.extend((0..8_000).map(|i| 0.5 * (2.0 * PI * 300.0 * i as f32 / 16_000.0).sin()));
        samples.extend(vec![0.0f32; 8_000]);
        let trimmed = trim_silence(&samples, 16_000, -40.0);
        assert!(trimmed.len() < 9_000 && trimmed.len() >= 8_000, "{}", trimmed.len());
    }

    #[test]
    fn test_peak_normalize() {
        let mut samples = vec![0.1, -0.2, 0.05];
        peak_normalize(&mut samples, 0.95);
        assert!((samples[1] + 0.95).abs() < 1e-6);

        let mut silent = vec![0.0; 4];
        peak_normalize(&mut silent, 0.95);
        assert_eq!(silent, vec![0.0; 4]);
    }

    #[test]
    fn test_profile() {
        let mut samples: Vec<f32> = (0..16_000)
            .map(|i| if (i / 4_000) % 2 == 0 { 0.5 * (i as f32 * 0.1).sin() } else { 0.0 })
            .collect();
        samples[100] = 1.0;
        let profile = AudioProfile::measure(&samples, 16_000, 48_000, 2);
        assert_eq!(profile.num_segments, 2);
        assert!(profile.silence_ratio > 0.3 && profile.silence_ratio < 0.6);
        assert!(!profile.clipping_detected);
        assert_eq!(profile.original_sample_rate, 48_000);
        assert!((profile.duration_secs - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_prepare_stereo_44k() {
        let interleaved: Vec<f32> = (0..44_100)
            .flat_map(|i| {
                let s = 0.3 * (2.0 * PI * 200.0 * i as f32 / 44_100.0).sin();
                [s, s]
            })
            .collect();
        let audio = AudioData {
            samples: interleaved,
            sample_rate: 44_100,
            channels: 2,
            duration_secs: 1.0,
            codec_name: "Test".to_string(),
        };
        let prepared = prepare(&audio).unwrap();
        let peak = prepared.samples.iter().fold(0.0f32, |m, s| m.max(s.abs()));
        assert!((peak - NORMALIZE_PEAK).abs() < 1e-4);
        assert!(prepared.samples.len() > 15_000 && prepared.samples.len() <= 16_000);
        assert_eq!(prepared.profile.channels, 2);
    }
}
