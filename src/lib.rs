//! polytone: a real-time polyphonic tone generator.
//!
//! Symbolic key presses become audible looping waveforms: a tuning
//! table maps each key to a pitch under an equal-temperament or
//! just-intonation system, the waveform generators synthesize a finite
//! buffer for that pitch (pure, tiled, square, or additive organ,
//! optionally spectrally low-passed), a tone cache memoizes the result
//! per quantized frequency, and the engine tracks held modifiers and
//! the per-key note lifecycle against whatever [`sink::AudioSink`] the
//! host process plugs in.
//!
//! The core is single-threaded and event-driven: feed it
//! [`events::InputEvent`]s in arrival order and each one is handled to
//! completion. There is no fatal path inside the core; unknown keys
//! and unrecognized tunings degrade, they never crash.

pub mod config;
pub mod dsp;
pub mod error;
pub mod events;
pub mod sink;
pub mod tuning;

pub use config::EngineConfig;
pub use dsp::engine::{EngineControl, ToneEngine};
pub use error::PolytoneError;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
