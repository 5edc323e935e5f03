//! Waveform generators: pure functions from (frequency, amplitude,
//! duration) to a finite sample sequence.
//!
//! The generators keep the reference phase convention `sin(π·f·t)`: a
//! nominal frequency is twice the physical pitch, the single-period
//! tile spans `2/f` seconds, and the organ's partial ratios are taken
//! relative to twice the fundamental. The tiled and sign-thresholded
//! variants are knowingly out of tune near the Nyquist limit; that
//! approximation is part of the contract, not a defect to correct.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use super::spectral;

/// Decibel levels of the organ's 17 integer harmonics.
const ORGAN_PARTIAL_DB: [f64; 17] = [
    -30.9, -29.1, -31.5, -31.8, -39.8, -37.1, -59.0, -29.9, -54.9, -56.0, -80.9, -77.9, -37.4,
    -106.6, -67.0, -61.5, -41.8,
];

/// Sub-harmonic partial ratios and their fixed linear weights.
const ORGAN_SUB_RATIOS: [f64; 3] = [1.0 / 8.0, 1.0 / 4.0, 1.0 / 2.0];
const ORGAN_SUB_WEIGHTS: [f64; 3] = [0.0, 0.2, 0.7];

/// Slope and center of the organ's loudness compensation curve,
/// `amplitude × (1 + slope × (center − log2(log2(f + 50))))`. Flattens
/// perceived loudness across the pitch range.
const ORGAN_LOUDNESS_SLOPE: f64 = 4.0;
const ORGAN_LOUDNESS_CENTER: f64 = 3.13976;

/// The closed set of waveform timbres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timbre {
    /// Plain sinusoid sampled across the whole duration.
    Pure,
    /// One high-fidelity period tiled to length, loop-seamless at the
    /// cost of a small pitch quantization error.
    Looped,
    /// Sign-thresholded bipolar square at one tenth amplitude.
    Square,
    /// Additive organ: weighted harmonics plus sub-harmonic partials.
    Organ,
}

/// A configured waveform generator, optionally wrapped in the spectral
/// low-pass filter.
#[derive(Debug, Clone)]
pub struct Generator {
    pub timbre: Timbre,
    /// When set, every generated buffer is low-passed at this cutoff.
    pub low_pass_cutoff: Option<f64>,
    pub sample_rate: u32,
}

impl Generator {
    pub fn new(timbre: Timbre, sample_rate: u32) -> Self {
        Generator {
            timbre,
            low_pass_cutoff: None,
            sample_rate,
        }
    }

    /// Wrap this generator in the spectral low-pass filter.
    pub fn with_low_pass(mut self, cutoff: f64) -> Self {
        self.low_pass_cutoff = Some(cutoff);
        self
    }

    /// Generate `sample_rate × duration` float samples for a note.
    ///
    /// Callers validate `frequency > 0` and finite before invoking; the
    /// generators assume it.
    pub fn generate(&self, frequency: f64, amplitude: f64, duration: f64) -> Vec<f64> {
        debug_assert!(frequency.is_finite() && frequency > 0.0);

        let samples = match self.timbre {
            Timbre::Pure => {
                let mut s = self.pure_tone(frequency, duration);
                for v in s.iter_mut() {
                    *v *= amplitude;
                }
                s
            }
            Timbre::Looped => self.looped_sine(frequency, amplitude, duration),
            Timbre::Square => self.square(frequency, amplitude, duration),
            Timbre::Organ => self.organ(frequency, amplitude, duration),
        };

        match self.low_pass_cutoff {
            Some(cutoff) => spectral::low_pass(&samples, cutoff, self.sample_rate),
            None => samples,
        }
    }

    fn num_samples(&self, duration: f64) -> usize {
        (self.sample_rate as f64 * duration) as usize
    }

    /// Unit-amplitude sinusoid, the primitive the other timbres build on.
    fn pure_tone(&self, frequency: f64, duration: f64) -> Vec<f64> {
        let sr = self.sample_rate as f64;
        (0..self.num_samples(duration))
            .map(|i| (PI * frequency * i as f64 / sr).sin())
            .collect()
    }

    /// One period sampled exactly, then tiled to the full duration and
    /// truncated. Avoids the phase drift of sampling a long sinusoid at
    /// a frequency that doesn't divide the sample rate.
    fn looped_sine(&self, frequency: f64, amplitude: f64, duration: f64) -> Vec<f64> {
        let total = self.num_samples(duration);
        let period = 2.0 / frequency;
        // Degenerate high frequencies round to zero samples per period;
        // a period is never shorter than one sample.
        let period_samples = ((self.sample_rate as f64 * period) as usize).max(1);

        let tile: Vec<f64> = (0..period_samples)
            .map(|i| {
                let t = i as f64 * period / period_samples as f64;
                amplitude * (PI * frequency * t).sin()
            })
            .collect();

        tile.iter().copied().cycle().take(total).collect()
    }

    /// Bipolar square derived from the pure tone by sign thresholding,
    /// scaled down to compensate for the harsher perceived loudness.
    fn square(&self, frequency: f64, amplitude: f64, duration: f64) -> Vec<f64> {
        self.pure_tone(frequency, duration)
            .iter()
            .map(|&s| {
                let level = if s >= 0.0 { 1.0 } else { -1.0 };
                0.1 * amplitude * level
            })
            .collect()
    }

    /// Additive organ: integer harmonics 1..17 weighted by the dB table
    /// plus fixed sub-harmonic partials, all relative to twice the
    /// fundamental, normalized by the weight sum and scaled by the
    /// loudness compensation curve. Compensation can overshoot [-1, 1]
    /// at the extremes of the pitch range; quantization clamps.
    fn organ(&self, frequency: f64, amplitude: f64, duration: f64) -> Vec<f64> {
        let sr = self.sample_rate as f64;
        let n = self.num_samples(duration);
        let mut acc = vec![0.0_f64; n];
        let mut weight_sum = 0.0;

        let harmonics = (0..ORGAN_PARTIAL_DB.len()).map(|i| {
            let ratio = (i + 1) as f64;
            let weight = (10.0_f64).powf(ORGAN_PARTIAL_DB[i] / 20.0);
            (ratio, weight)
        });
        let partials = ORGAN_SUB_RATIOS
            .iter()
            .copied()
            .zip(ORGAN_SUB_WEIGHTS.iter().copied())
            .chain(harmonics);

        for (ratio, weight) in partials {
            weight_sum += weight;
            if weight == 0.0 {
                continue;
            }
            let partial_freq = 2.0 * ratio * frequency;
            for (i, sample) in acc.iter_mut().enumerate() {
                *sample += weight * (PI * partial_freq * i as f64 / sr).sin();
            }
        }

        let adjusted = amplitude
            * (1.0 + ORGAN_LOUDNESS_SLOPE * (ORGAN_LOUDNESS_CENTER - (frequency + 50.0).log2().log2()));
        let scale = adjusted / weight_sum;
        for sample in acc.iter_mut() {
            *sample *= scale;
        }
        acc
    }
}

/// Quantize float samples in [-1, 1] to signed 16-bit PCM.
///
/// Multiplies by the maximum positive 16-bit value and rounds. Samples
/// outside the nominal range (generator overshoot) clamp to the i16
/// limits, a documented lossy step.
pub fn quantize_i16(samples: &[f64]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s * 32767.0).round().clamp(-32768.0, 32767.0) as i16)
        .collect()
}
