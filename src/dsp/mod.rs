//! DSP core: waveform synthesis, spectral filtering, memoization, and
//! the live note-lifecycle engine.
//!
//! Everything here is deterministic: the same configuration and event
//! sequence produce bit-identical buffers, which is what lets the tone
//! cache share one buffer across every replay of a note.

pub mod cache;
pub mod engine;
pub mod generator;
pub mod spectral;
