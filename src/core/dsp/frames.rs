//! Overlapping frames and short-time spectra

use num_complex::Complex;

use super::fft::FftProcessor;
use super::stats;
use super::windows::WindowType;

/// Number of complete frames that fit in `len` samples
pub fn frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    if frame_length == 0 || hop_length == 0 || len < frame_length {
        return 0;
    }
    (len - frame_length) / hop_length + 1
}

/// Iterate over complete overlapping frames. Trailing samples that do not
/// fill a whole frame are dropped.
pub fn frames(
    samples: &[f32],
    frame_length: usize,
    hop_length: usize,
) -> impl Iterator<Item = &[f32]> + '_ {
    (0..frame_count(samples.len(), frame_length, hop_length))
        .map(move |i| &samples[i * hop_length..i * hop_length + frame_length])
}

/// Short-time RMS energy envelope
pub fn rms_envelope(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f32> {
    frames(samples, frame_length, hop_length)
        .map(stats::rms)
        .collect()
}

/// One analysis frame of an STFT
#[derive(Debug, Clone)]
pub struct SpectralFrame {
    /// First sample of the frame
    pub start: usize,
    /// RMS of the raw (unwindowed) samples
    pub rms: f32,
    pub spectrum: Vec<Complex<f32>>,
}

impl SpectralFrame {
    pub fn power(&self) -> Vec<f32> {
        self.spectrum.iter().map(|c| c.norm_sqr()).collect()
    }

    pub fn magnitudes(&self) -> Vec<f32> {
        self.spectrum.iter().map(|c| c.norm()).collect()
    }
}

/// Short-time Fourier transform of a whole signal
#[derive(Debug, Clone)]
pub struct Stft {
    pub frames: Vec<SpectralFrame>,
    pub fft_size: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Stft {
    pub fn compute(
        samples: &[f32],
        sample_rate: u32,
        frame_length: usize,
        hop_length: usize,
        window: WindowType,
    ) -> Self {
        let processor = FftProcessor::new(frame_length, window);
        let spectral_frames = frames(samples, frame_length, hop_length)
            .enumerate()
            .map(|(i, frame)| SpectralFrame {
                start: i * hop_length,
                rms: stats::rms(frame),
                spectrum: processor.complex_spectrum(frame),
            })
            .collect();

        Self {
            frames: spectral_frames,
            fft_size: frame_length,
            hop_length,
            sample_rate,
        }
    }

    /// Width of one frequency bin in Hz
    pub fn bin_hz(&self) -> f32 {
        self.sample_rate as f32 / self.fft_size as f32
    }

    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frames loud enough to carry spectral information
    pub fn active_frames(&self, min_rms: f32) -> impl Iterator<Item = &SpectralFrame> {
        self.frames.iter().filter(move |f| f.rms >= min_rms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_count() {
        assert_eq!(frame_count(100, 512, 160), 0);
        assert_eq!(frame_count(512, 512, 160), 1);
        assert_eq!(frame_count(16_000, 512, 160), 97);
        assert_eq!(frame_count(1000, 0, 160), 0);
    }

    #[test]
    fn test_envelope_of_constant_signal() {
        let envelope = rms_envelope(&[0.5; 4000], 400, 160);
        assert_eq!(envelope.len(), frame_count(4000, 400, 160));
        assert!(envelope.iter().all(|&e| (e - 0.5).abs() < 1e-5));
    }

    #[test]
    fn test_stft_skips_silent_frames() {
        let mut samples = vec![0.0f32; 2048];
        for (i, s) in samples.iter_mut().enumerate().skip(1024) {
            *s = if i % 2 == 0 { 0.3 } else { -0.3 };
        }
        let stft = Stft::compute(&samples, 16_000, 512, 256, WindowType::Hann);
        assert_eq!(stft.frames.len(), 7);
        assert_eq!(stft.num_bins(), 257);
        assert_eq!(stft.bin_hz(), 31.25);
        // Frames 0..=2 are entirely silent
        assert_eq!(stft.active_frames(1e-4).count(), 4);
    }
}
