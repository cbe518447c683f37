//! Statistical and spectral analysis functions
//!
//! Every function here returns a finite value for any finite input. Empty
//! or silent inputs produce 0.0 rather than NaN.

use std::f32::consts::PI;

/// Substitute `default` for NaN or infinite values
#[inline]
pub fn finite_or(value: f32, default: f32) -> f32 {
    if value.is_finite() {
        value
    } else {
        default
    }
}

/// Linear ramp from `natural` (score 0) to `synthetic` (score 1), clamped.
///
/// Works in either direction. Non-finite input maps to the neutral 0.5.
pub fn ramp_score(value: f32, natural: f32, synthetic: f32) -> f32 {
    if !value.is_finite() {
        return 0.5;
    }
    let span = synthetic - natural;
    if span == 0.0 || !span.is_finite() {
        return 0.5;
    }
    finite_or((value - natural) / span, 0.5).clamp(0.0, 1.0)
}

pub fn mean(data: &[f32]) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    data.iter().sum::<f32>() / data.len() as f32
}

/// Population variance
pub fn variance(data: &[f32]) -> f32 {
    if data.len() < 2 {
        return 0.0;
    }
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f32>() / data.len() as f32
}

pub fn std_dev(data: &[f32]) -> f32 {
    variance(data).sqrt()
}

/// std / |mean|, 0.0 when the mean vanishes
pub fn coefficient_of_variation(data: &[f32]) -> f32 {
    let m = mean(data).abs();
    if m < 1e-10 {
        return 0.0;
    }
    std_dev(data) / m
}

/// Linear-interpolated percentile, `p` in [0, 1]
pub fn percentile(data: &[f32], p: f32) -> f32 {
    if data.is_empty() {
        return 0.0;
    }
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = p.clamp(0.0, 1.0) * (sorted.len() - 1) as f32;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f32;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

/// First difference
pub fn diff(data: &[f32]) -> Vec<f32> {
    data.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Compute RMS (Root Mean Square)
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Zero-crossing rate
pub fn zero_crossing_rate(samples: &[f32]) -> f32 {
    if samples.len() < 2 {
        return 0.0;
    }

    let crossings: usize = samples.windows(2)
        .filter(|w| (w[0] >= 0.0) != (w[1] >= 0.0))
        .count();

    crossings as f32 / (samples.len() - 1) as f32
}

/// Compute spectral flatness (Wiener entropy) of a magnitude spectrum.
/// Returns 1.0 for white noise, approaches 0.0 for tonal signals
pub fn spectral_flatness(magnitudes: &[f32]) -> f32 {
    if magnitudes.is_empty() {
        return 0.0;
    }
    let n = magnitudes.len() as f32;

    // Geometric mean (via log)
    let log_sum: f32 = magnitudes.iter()
        .map(|&m| (m + 1e-10).ln())
        .sum();
    let geometric_mean = (log_sum / n).exp();

    // Arithmetic mean
    let arithmetic_mean = magnitudes.iter().sum::<f32>() / n;

    if arithmetic_mean < 1e-10 {
        return 0.0;
    }

    finite_or(geometric_mean / arithmetic_mean, 0.0).clamp(0.0, 1.0)
}

/// Frequency below which `fraction` of the power lies
pub fn spectral_rolloff(power: &[f32], bin_hz: f32, fraction: f32) -> f32 {
    let total_energy: f32 = power.iter().sum();
    if total_energy <= 0.0 {
        return 0.0;
    }
    let threshold = total_energy * fraction;

    let mut cumulative = 0.0f32;
    for (i, &p) in power.iter().enumerate() {
        cumulative += p;
        if cumulative >= threshold {
            return i as f32 * bin_hz;
        }
    }

    (power.len().saturating_sub(1)) as f32 * bin_hz
}

/// Power-weighted mean frequency
pub fn spectral_centroid(power: &[f32], bin_hz: f32) -> f32 {
    let total_energy: f32 = power.iter().sum();
    if total_energy < 1e-20 {
        return 0.0;
    }

    let weighted_sum: f32 = power.iter()
        .enumerate()
        .map(|(i, &p)| i as f32 * bin_hz * p)
        .sum();

    weighted_sum / total_energy
}

/// Share of power at or above `cutoff_hz`
pub fn high_band_ratio(power: &[f32], bin_hz: f32, cutoff_hz: f32) -> f32 {
    let total_energy: f32 = power.iter().sum();
    if total_energy <= 0.0 {
        return 0.0;
    }
    let first_bin = (cutoff_hz / bin_hz).ceil() as usize;
    let high: f32 = power.iter().skip(first_bin).sum();
    (high / total_energy).clamp(0.0, 1.0)
}

/// Wrap an angle to (-π, π]
pub fn principal_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

/// Pearson correlation of two equal-length vectors, 0.0 if either is flat
pub fn correlation(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.len() < 2 {
        return 0.0;
    }
    let (ma, mb) = (mean(a), mean(b));
    let mut cov = 0.0f32;
    let mut va = 0.0f32;
    let mut vb = 0.0f32;
    for (&x, &y) in a.iter().zip(b) {
        cov += (x - ma) * (y - mb);
        va += (x - ma) * (x - ma);
        vb += (y - mb) * (y - mb);
    }
    let denom = (va * vb).sqrt();
    if denom < 1e-12 {
        return 0.0;
    }
    finite_or(cov / denom, 0.0)
}
