//! Digital Signal Processing utilities shared by every analyzer

pub mod fft;
pub mod frames;
pub mod mel;
pub mod stats;
pub mod windows;

pub use fft::FftProcessor;
pub use frames::{frame_count, frames, rms_envelope, SpectralFrame, Stft};
pub use mel::MelFilterbank;
pub use windows::{create_window, WindowType};
