use std::fmt;

use crate::sink::SinkError;

#[derive(Debug)]
pub enum PolytoneError {
    Config(ConfigError),
    Synth(SynthError),
    Sink(SinkError),
}

/// Rejected configuration values, caught at engine construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidReferencePitch { hz: f64 },
    InvalidVolume { volume: f64 },
    InvalidBufferDuration { seconds: f64 },
    InvalidSampleRate { rate: u32 },
    NoVoices,
}

/// Numerical edge cases rejected before any generator runs, so a
/// corrupt buffer can never reach the tone cache.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthError {
    NonFiniteFrequency { hz: f64 },
    NonPositiveFrequency { hz: f64 },
}

impl fmt::Display for PolytoneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolytoneError::Config(e) => write!(f, "Config error: {e}"),
            PolytoneError::Synth(e) => write!(f, "Synthesis error: {e}"),
            PolytoneError::Sink(e) => write!(f, "Sink error: {e}"),
        }
    }
}

impl std::error::Error for PolytoneError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidReferencePitch { hz } => {
                write!(f, "Reference pitch must be a positive finite Hz value, got {hz}")
            }
            ConfigError::InvalidVolume { volume } => {
                write!(f, "Volume must be within [0, 1], got {volume}")
            }
            ConfigError::InvalidBufferDuration { seconds } => {
                write!(f, "Buffer duration must be positive, got {seconds}s")
            }
            ConfigError::InvalidSampleRate { rate } => {
                write!(f, "Sample rate must be positive, got {rate}")
            }
            ConfigError::NoVoices => write!(f, "Max voices must be at least 1"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::NonFiniteFrequency { hz } => {
                write!(f, "Frequency must be finite, got {hz}")
            }
            SynthError::NonPositiveFrequency { hz } => {
                write!(f, "Frequency must be positive, got {hz}Hz")
            }
        }
    }
}

impl std::error::Error for SynthError {}

impl From<ConfigError> for PolytoneError {
    fn from(e: ConfigError) -> Self {
        PolytoneError::Config(e)
    }
}

impl From<SynthError> for PolytoneError {
    fn from(e: SynthError) -> Self {
        PolytoneError::Synth(e)
    }
}

impl From<SinkError> for PolytoneError {
    fn from(e: SinkError) -> Self {
        PolytoneError::Sink(e)
    }
}
