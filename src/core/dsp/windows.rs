//! Window function implementations

use std::f32::consts::PI;

/// Window function types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowType {
    #[default]
    Hann,
    Hamming,
}

/// Create a periodic window of the given size
pub fn create_window(size: usize, window_type: WindowType) -> Vec<f32> {
    let n = size as f32;
    (0..size)
        .map(|i| {
            let x = i as f32;
            match window_type {
                WindowType::Hann => 0.5 * (1.0 - (2.0 * PI * x / n).cos()),
                WindowType::Hamming => 0.54 - 0.46 * (2.0 * PI * x / n).cos(),
            }
        })
        .collect()
}
