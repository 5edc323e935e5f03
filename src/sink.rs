//! Audio sink boundary: the capability set the engine needs from an
//! output device.
//!
//! The core never talks to real audio hardware. A host process supplies
//! an implementation of [`AudioSink`] (a mixer channel pool, a ring
//! buffer feeding a callback, a test recorder) and the engine hands it
//! finished 16-bit mono buffers to loop.

use std::fmt;
use std::sync::Arc;

/// A finished, immutable waveform buffer shared between the tone cache
/// and however many sink voices are looping it.
pub type SharedBuffer = Arc<Vec<i16>>;

/// Playback failures reported by a sink.
///
/// The engine treats these as recoverable: a failed `play` leaves no
/// active-note entry behind and the event loop keeps running.
#[derive(Debug, Clone, PartialEq)]
pub enum SinkError {
    /// The output device is gone or was never opened.
    Unavailable,
    /// The sink accepted the request but could not start playback.
    Playback(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Unavailable => write!(f, "Audio sink unavailable"),
            SinkError::Playback(msg) => write!(f, "Playback failed: {msg}"),
        }
    }
}

impl std::error::Error for SinkError {}

/// Output sink capability set.
///
/// Sample format contract: signed 16-bit mono (the sink may duplicate
/// to interleaved stereo) at the engine's configured sample rate.
/// `play` begins looping the buffer indefinitely and returns an opaque
/// handle; `stop` and `fade_out` must be idempotent no-ops on a handle
/// that has already stopped.
pub trait AudioSink {
    /// Opaque playback handle for one looping voice.
    type Handle;

    /// Begin looping playback of `buffer` immediately.
    fn play(&mut self, buffer: &SharedBuffer) -> Result<Self::Handle, SinkError>;

    /// Stop a voice immediately.
    fn stop(&mut self, handle: &Self::Handle);

    /// Ramp a voice to silence over `duration_ms`, then stop it.
    fn fade_out(&mut self, handle: &Self::Handle, duration_ms: u32);
}
