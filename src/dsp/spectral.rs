//! Spectral low-pass filter.
//!
//! Transforms the signal to the frequency domain, multiplies the
//! spectrum by a raised-cosine attenuation window, and transforms back,
//! keeping the real component. Offered as a wrapper around any
//! generator rather than a timbre of its own.

use std::f64::consts::PI;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

/// Low-pass `samples` at `cutoff` Hz.
///
/// The window passes bins at or below the cutoff at unity, rolls off on
/// a raised cosine between the cutoff and twice the cutoff, and zeroes
/// everything above. The cutoff is clamped into (0, Nyquist] first, so
/// a nonsensical cutoff degrades the result but never produces
/// NaN/Inf.
pub fn low_pass(samples: &[f64], cutoff: f64, sample_rate: u32) -> Vec<f64> {
    let n = samples.len();
    if n == 0 {
        return Vec::new();
    }

    let nyquist = sample_rate as f64 / 2.0;
    let cutoff = if cutoff.is_finite() {
        cutoff.clamp(nyquist.min(1.0), nyquist)
    } else {
        nyquist
    };

    let mut planner = FftPlanner::<f64>::new();
    let fft = planner.plan_fft_forward(n);
    let ifft = planner.plan_fft_inverse(n);

    let mut spectrum: Vec<Complex<f64>> =
        samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
    fft.process(&mut spectrum);

    for (k, bin) in spectrum.iter_mut().enumerate() {
        let freq = bin_frequency(k, n, sample_rate).abs();
        *bin *= attenuation(freq, cutoff);
    }

    ifft.process(&mut spectrum);

    // Inverse transform is unnormalized; scale by 1/N and drop the
    // numerical-noise imaginary residue.
    let scale = 1.0 / n as f64;
    spectrum.iter().map(|c| c.re * scale).collect()
}

/// Frequency of bin `k` for an `n`-point transform: non-negative up to
/// the Nyquist bin, negative mirror above it.
fn bin_frequency(k: usize, n: usize, sample_rate: u32) -> f64 {
    let cycles = if k <= (n - 1) / 2 {
        k as f64
    } else {
        k as f64 - n as f64
    };
    cycles * sample_rate as f64 / n as f64
}

/// Raised-cosine gain: unity at or below the cutoff, zero at twice the
/// cutoff and beyond.
fn attenuation(freq: f64, cutoff: f64) -> f64 {
    if freq <= cutoff {
        1.0
    } else if freq >= 2.0 * cutoff {
        0.0
    } else {
        0.5 * (1.0 + (PI * (freq - cutoff) / cutoff).cos())
    }
}
