//! Engine configuration surface.
//!
//! Plain values loaded externally (typically from JSON) and consumed by
//! [`crate::dsp::engine::ToneEngine`] at construction. Every field has a
//! serde default so a partial config file works.

use serde::{Deserialize, Serialize};

use crate::dsp::generator::Timbre;
use crate::error::ConfigError;

/// Full configuration for one engine instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tuning name: `"<N>TET"`, `"Pythagorean"` or `"Extended"`.
    /// Unrecognized names resolve to 12TET with a warning.
    #[serde(default = "default_tuning")]
    pub tuning: String,
    /// Frequency of the reference pitch A in Hz.
    #[serde(default = "default_reference_pitch")]
    pub reference_pitch: f64,
    /// Output volume scalar in [0, 1].
    #[serde(default = "default_volume")]
    pub volume: f64,
    /// Waveform generator selection.
    #[serde(default = "default_timbre")]
    pub timbre: Timbre,
    /// Optional spectral low-pass cutoff in Hz, applied as a wrapper
    /// around the selected generator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_pass_cutoff: Option<f64>,
    /// Memoize generated waveforms per quantized frequency. Worth the
    /// memory for the costlier generators.
    #[serde(default = "default_cache")]
    pub cache: bool,
    /// Length of each looping buffer in seconds. Longer buffers reduce
    /// occasional loop-seam pops at the cost of memory and synth time.
    #[serde(default = "default_buffer_duration")]
    pub buffer_duration: f64,
    /// Maximum simultaneously sounding notes. Enforced by the sink
    /// (voice stealing or silent drop), not by the engine.
    #[serde(default = "default_max_voices")]
    pub max_voices: usize,
    /// Output sample rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

fn default_tuning() -> String {
    "12TET".to_string()
}

fn default_reference_pitch() -> f64 {
    440.0
}

fn default_volume() -> f64 {
    0.4
}

fn default_timbre() -> Timbre {
    Timbre::Organ
}

fn default_cache() -> bool {
    true
}

fn default_buffer_duration() -> f64 {
    20.0
}

fn default_max_voices() -> usize {
    10
}

fn default_sample_rate() -> u32 {
    44100
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            tuning: default_tuning(),
            reference_pitch: default_reference_pitch(),
            volume: default_volume(),
            timbre: default_timbre(),
            low_pass_cutoff: None,
            cache: default_cache(),
            buffer_duration: default_buffer_duration(),
            max_voices: default_max_voices(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl EngineConfig {
    /// Parse a config from a JSON string. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Reject values the synthesis path cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_pitch.is_finite() || self.reference_pitch <= 0.0 {
            return Err(ConfigError::InvalidReferencePitch {
                hz: self.reference_pitch,
            });
        }
        if !self.volume.is_finite() || !(0.0..=1.0).contains(&self.volume) {
            return Err(ConfigError::InvalidVolume {
                volume: self.volume,
            });
        }
        if !self.buffer_duration.is_finite() || self.buffer_duration <= 0.0 {
            return Err(ConfigError::InvalidBufferDuration {
                seconds: self.buffer_duration,
            });
        }
        if self.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        if self.max_voices == 0 {
            return Err(ConfigError::NoVoices);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_design() {
        let c = EngineConfig::default();
        assert_eq!(c.tuning, "12TET");
        assert_eq!(c.reference_pitch, 440.0);
        assert_eq!(c.volume, 0.4);
        assert_eq!(c.timbre, Timbre::Organ);
        assert!(c.low_pass_cutoff.is_none());
        assert!(c.cache);
        assert_eq!(c.buffer_duration, 20.0);
        assert_eq!(c.max_voices, 10);
        assert_eq!(c.sample_rate, 44100);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let c = EngineConfig::from_json(r#"{ "tuning": "19TET", "volume": 0.8 }"#)
            .expect("parse failed");
        assert_eq!(c.tuning, "19TET");
        assert_eq!(c.volume, 0.8);
        assert_eq!(c.sample_rate, 44100);
        assert_eq!(c.timbre, Timbre::Organ);
    }

    #[test]
    fn timbre_names_are_lowercase() {
        let c = EngineConfig::from_json(r#"{ "timbre": "square" }"#).expect("parse failed");
        assert_eq!(c.timbre, Timbre::Square);
        let c = EngineConfig::from_json(r#"{ "timbre": "looped" }"#).expect("parse failed");
        assert_eq!(c.timbre, Timbre::Looped);
    }

    #[test]
    fn json_round_trip() {
        let c = EngineConfig {
            tuning: "Pythagorean".to_string(),
            low_pass_cutoff: Some(2000.0),
            ..Default::default()
        };
        let json = c.to_json().expect("serialize failed");
        let back = EngineConfig::from_json(&json).expect("parse failed");
        assert_eq!(back.tuning, "Pythagorean");
        assert_eq!(back.low_pass_cutoff, Some(2000.0));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut c = EngineConfig::default();
        c.reference_pitch = 0.0;
        assert!(matches!(
            c.validate(),
            Err(crate::error::ConfigError::InvalidReferencePitch { .. })
        ));

        let mut c = EngineConfig::default();
        c.volume = 1.5;
        assert!(matches!(
            c.validate(),
            Err(crate::error::ConfigError::InvalidVolume { .. })
        ));

        let mut c = EngineConfig::default();
        c.buffer_duration = -1.0;
        assert!(matches!(
            c.validate(),
            Err(crate::error::ConfigError::InvalidBufferDuration { .. })
        ));

        let mut c = EngineConfig::default();
        c.max_voices = 0;
        assert!(matches!(c.validate(), Err(crate::error::ConfigError::NoVoices)));
    }
}
